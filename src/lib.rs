//! Inline request-inspection layer for a web application's request
//! lifecycle. Detects malicious interaction patterns (credential stuffing,
//! scripted probing, disallowed usernames, robot floods, spam traps) and
//! emits structured log records for an external, log-watching ban daemon.
//!
//! The host adapter translates its native lifecycle callbacks into
//! [`context::Event`]s, builds one [`context::RequestContext`] per request,
//! and feeds both through [`waf::Engine::evaluate`] and
//! [`dispatch::Dispatcher::dispatch_all`]. Soft findings only record;
//! immediate findings request a ban and terminate the request with an
//! opaque 403.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod encoder;
pub mod metrics;
pub mod override_chain;
pub mod waf;

pub use config::GateConfig;
pub use context::{Event, RequestContext, RequestState, Transport};
pub use dispatch::{BanHook, Dispatcher, LogCrateSink, LogSink, MemorySink, NoBan, Outcome};
pub use encoder::LogValue;
pub use metrics::MetricsCollector;
pub use override_chain::{OverrideChain, TerminationHandler};
pub use waf::{Channel, DieMessage, Engine, Finding, NamesBlacklist, Prefix, Severity, Slug};
