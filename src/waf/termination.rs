use super::{Engine, Finding, Severity, Slug};
use crate::encoder::LogValue;

/// Termination-handler category. One predecessor handler per channel may be
/// wrapped by the override chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Ajax,
    Xmlrpc,
    General,
}

/// Message a termination handler was invoked with. The ajax machinery uses
/// numeric sentinels where the other channels carry text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieMessage {
    Empty,
    Text(String),
    Code(i64),
}

impl DieMessage {
    pub fn is_empty(&self) -> bool {
        match self {
            DieMessage::Empty => true,
            DieMessage::Text(s) => s.is_empty(),
            DieMessage::Code(_) => false,
        }
    }

    fn to_log_value(&self) -> LogValue {
        match self {
            DieMessage::Empty => LogValue::Str(String::new()),
            DieMessage::Text(s) => LogValue::Str(s.clone()),
            DieMessage::Code(n) => LogValue::Int(*n),
        }
    }
}

/// Administrative dispatch tag prefixes that route to a responder.
static ACTION_PREFIXES: [&str; 2] = ["admin_post_", "wp_ajax_"];

/// Termination-handler invocation. The ajax channel fires only on the
/// non-positive numeric sentinel the admin machinery returns on a security
/// breach; the other channels fire on any non-empty message.
pub(crate) fn on_die(channel: Channel, message: &DieMessage) -> Vec<Finding> {
    let slug = match channel {
        Channel::Ajax => {
            return match message {
                DieMessage::Code(n) if *n <= 0 => vec![Finding::soft(
                    Slug::WpDieAjax,
                    Severity::Error,
                    LogValue::Int(*n),
                )],
                _ => Vec::new(),
            };
        }
        Channel::Xmlrpc => Slug::WpDieXmlrpc,
        Channel::General => Slug::WpDie,
    };

    if message.is_empty() {
        return Vec::new();
    }

    vec![Finding::soft(slug, Severity::Error, message.to_log_value())]
}

/// Administrative dispatch tag marked reachable, routed like an action but
/// with no registered responder and no allow-list entry.
pub(crate) fn admin_action(
    engine: &Engine,
    tag: &str,
    reachable: bool,
    registered: bool,
) -> Vec<Finding> {
    let routed = ACTION_PREFIXES.iter().any(|p| tag.starts_with(p));

    if reachable && routed && !registered && !engine.allowed_actions.contains(tag) {
        return vec![Finding::instant(Slug::AdminActionUnknown, tag.into())];
    }

    Vec::new()
}
