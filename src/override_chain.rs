//! Decorator registry for pre-existing termination handlers.
//!
//! The host framework lets components replace its termination handler; this
//! chain wraps whatever handler was installed before us so detection always
//! runs first, exactly once per channel, and the predecessor's behavior
//! stays authoritative afterward.

use crate::context::{Event, RequestContext, RequestState};
use crate::dispatch::{Dispatcher, Outcome};
use crate::waf::{Channel, DieMessage, Engine};
use once_cell::sync::OnceCell;

/// A previously installed termination handler.
pub trait TerminationHandler: Send + Sync {
    fn handle(&self, message: &DieMessage, title: &str);
}

impl<F> TerminationHandler for F
where
    F: Fn(&DieMessage, &str) + Send + Sync,
{
    fn handle(&self, message: &DieMessage, title: &str) {
        self(message, title)
    }
}

/// One write-once predecessor slot per channel. Registered at process start
/// and never reset; no multi-level chain discovery.
#[derive(Default)]
pub struct OverrideChain {
    ajax: OnceCell<Box<dyn TerminationHandler>>,
    xmlrpc: OnceCell<Box<dyn TerminationHandler>>,
    general: OnceCell<Box<dyn TerminationHandler>>,
}

impl OverrideChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, channel: Channel) -> &OnceCell<Box<dyn TerminationHandler>> {
        match channel {
            Channel::Ajax => &self.ajax,
            Channel::Xmlrpc => &self.xmlrpc,
            Channel::General => &self.general,
        }
    }

    /// Store the predecessor for a channel. A second registration for the
    /// same channel is rejected; the first handler stays in place.
    pub fn register(
        &self,
        channel: Channel,
        prior: Box<dyn TerminationHandler>,
    ) -> Result<(), String> {
        self.slot(channel).set(prior).map_err(|_| {
            log::warn!("termination handler for {channel:?} already registered");
            format!("handler for {channel:?} already registered")
        })
    }

    /// Invoke the wrapped handler for a channel: classification and dispatch
    /// run synchronously first; only if dispatch did not terminate does the
    /// stored predecessor run with the original arguments.
    pub fn invoke(
        &self,
        channel: Channel,
        message: &DieMessage,
        title: &str,
        engine: &Engine,
        dispatcher: &Dispatcher,
        ctx: &RequestContext,
        state: &mut RequestState,
    ) -> Outcome {
        // A terminated request has no live call stack left; neither we nor
        // the predecessor may run.
        if state.terminated {
            return Outcome::Continue;
        }

        let event = Event::Termination {
            channel,
            message: message.clone(),
        };
        let findings = engine.evaluate(&event, ctx, state);
        let outcome = dispatcher.dispatch_all(&findings, ctx, state);

        if !outcome.is_terminate() {
            if let Some(prior) = self.slot(channel).get() {
                prior.handle(message, title);
            }
        }

        outcome
    }
}
