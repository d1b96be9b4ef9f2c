//! Finding consumption: one log record per finding, plus the immediate
//! termination protocol (ban signal, fixed 403) when a rule demands it.

use crate::context::{RequestContext, RequestState};
use crate::encoder::{format_note, format_record};
use crate::metrics;
use crate::waf::{Finding, Severity, Slug};
use http::{header, Response, StatusCode};
use parking_lot::Mutex;
use std::sync::Arc;

/// Append-only line sink read out-of-process by the ban daemon.
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, line: &str);
}

/// Routes records through the `log` facade, for hosts that already ship
/// their error log to the daemon.
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn emit(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Info | Severity::Notice => log::info!("{line}"),
            Severity::Warn => log::warn!("{line}"),
            Severity::Error | Severity::Crit => log::error!("{line}"),
        }
    }
}

/// Captures records in memory; test and CLI sink.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, _severity: Severity, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// External ban collaborator. Called synchronously, best-effort, only from
/// the immediate path; it must never continue processing the request.
pub trait BanHook: Send + Sync {
    fn ban(&self, addr: &str) -> Result<(), String>;
}

/// No ban backend installed.
pub struct NoBan;

impl BanHook for NoBan {
    fn ban(&self, _addr: &str) -> Result<(), String> {
        Ok(())
    }
}

/// What the host adapter must do after dispatch.
#[derive(Debug)]
pub enum Outcome {
    /// Keep processing normally.
    Continue,
    /// Send this fixed response instead of normal rendering, then stop.
    ShortCircuit(Response<()>),
    /// Discard buffered output, send this fixed response if headers are
    /// unsent, and abort everything else for this request.
    Terminate(Response<()>),
}

impl Outcome {
    pub fn is_terminate(&self) -> bool {
        matches!(self, Outcome::Terminate(_))
    }
}

/// The fixed immediate-termination response: opaque 403, uncacheable,
/// non-indexable, connection closed, zero-length body.
pub fn instant_forbidden() -> Response<()> {
    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header(header::CONNECTION, "Close")
        .header(
            header::CACHE_CONTROL,
            "max-age=0, private, no-store, no-cache, must-revalidate",
        )
        .header("X-Robots-Tag", "noindex, nofollow")
        .header(header::CONTENT_TYPE, "text/html")
        .header(header::CONTENT_LENGTH, "0")
        .body(())
        .expect("static response")
}

/// The minimal robot 404: bypasses normal 404 rendering entirely.
pub fn robot_not_found() -> Response<()> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("X-Robots-Tag", "noindex, nofollow")
        .header(header::EXPIRES, "Wed, 11 Jan 1984 05:00:00 GMT")
        .header(header::CACHE_CONTROL, "no-cache, must-revalidate, max-age=0")
        .header(header::CONTENT_LENGTH, "0")
        .body(())
        .expect("static response")
}

/// Consumes findings: emits exactly one log record each, and runs the
/// termination protocol for immediate ones.
pub struct Dispatcher {
    sink: Arc<dyn LogSink>,
    ban: Arc<dyn BanHook>,
    entry_point: String,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn LogSink>, ban: Arc<dyn BanHook>, entry_point: &str) -> Self {
        Self {
            sink,
            ban,
            entry_point: entry_point.to_string(),
        }
    }

    /// Dispatch a single finding.
    ///
    /// Immediate findings attempt exactly one ban-signal call; a failed call
    /// is recorded as a secondary low-severity entry and never surfaced to
    /// the caller. Nothing in here can fail outward.
    pub fn dispatch(
        &self,
        finding: &Finding,
        ctx: &RequestContext,
        state: &mut RequestState,
    ) -> Outcome {
        let line = format_record(finding, ctx, &self.entry_point);
        self.sink.emit(finding.severity, &line);
        metrics::record_finding(finding.slug.as_str());

        if finding.immediate {
            if self.ban.ban(&ctx.remote_addr).is_err() {
                metrics::record_ban_failure();
                let note = format_note(
                    Severity::Notice.as_str(),
                    "Ban operation failed.",
                    ctx,
                    &self.entry_point,
                );
                self.sink.emit(Severity::Notice, &note);
            }
            metrics::record_termination();
            state.terminated = true;
            return Outcome::Terminate(instant_forbidden());
        }

        if finding.slug == Slug::Robot404 {
            return Outcome::ShortCircuit(robot_not_found());
        }

        Outcome::Continue
    }

    /// Dispatch an evaluation batch in order. A terminating finding ends the
    /// batch; later findings are never logged, matching the abort semantics
    /// of the immediate path.
    pub fn dispatch_all(
        &self,
        findings: &[Finding],
        ctx: &RequestContext,
        state: &mut RequestState,
    ) -> Outcome {
        let mut short_circuit = None;

        for finding in findings {
            match self.dispatch(finding, ctx, state) {
                Outcome::Terminate(response) => return Outcome::Terminate(response),
                Outcome::ShortCircuit(response) => short_circuit = Some(response),
                Outcome::Continue => {}
            }
        }

        match short_circuit {
            Some(response) => Outcome::ShortCircuit(response),
            None => Outcome::Continue,
        }
    }
}
