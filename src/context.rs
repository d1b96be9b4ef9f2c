use crate::waf::termination::{Channel, DieMessage};

/// Transport the request arrived over. XML-RPC logins are treated as
/// break-in attempts regardless of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Normal,
    XmlRpc,
}

/// Immutable snapshot of request-relevant signals, built once per inbound
/// request by the host adapter and passed into every engine call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    /// Raw request URI, query string included.
    pub uri: String,
    /// Resolved path component of the URI, percent-decoded.
    pub path: String,
    pub user_agent: String,
    pub referer: Option<String>,
    pub remote_addr: String,
    pub remote_port: u16,
    pub authenticated: bool,
    pub username: Option<String>,
    pub transport: Transport,
}

impl RequestContext {
    pub fn new(method: &str, uri: &str, remote_addr: &str, remote_port: u16) -> Self {
        Self {
            method: method.to_string(),
            uri: uri.to_string(),
            path: Self::resolve_path(uri),
            user_agent: String::new(),
            referer: None,
            remote_addr: remote_addr.to_string(),
            remote_port,
            authenticated: false,
            username: None,
            transport: Transport::Normal,
        }
    }

    /// Extract the percent-decoded path component from a raw request URI.
    pub fn resolve_path(uri: &str) -> String {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        urlencoding::decode(path)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| path.to_string())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("GET", "/", "", 0)
    }
}

/// Mutable per-request guards. Created alongside the context and discarded
/// at request end.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    /// Set when the "//"-prefixed URL rule fires; suppresses the canonical
    /// redirect rule later in the same request.
    pub redirect_seen: bool,
    /// Set by the first immediate finding; once set, no later rule in any
    /// hook of this request evaluates.
    pub terminated: bool,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lifecycle events, in hook-stage order. The host adapter translates its
/// native callbacks into this enumeration; the engine never queries the
/// host directly.
#[derive(Debug, Clone)]
pub enum Event {
    /// Entry point reached without framework initialization.
    DirectAccess,
    /// Earliest per-request hook: internal directory screening.
    RequestOpened,
    /// Request routing started: raw URI screening.
    RequestRouted,
    /// The canonical redirect resolver fired for this request.
    CanonicalRedirect { requested_url: String },
    /// The request resolved to no known resource.
    NotFoundResolved,
    /// An authentication attempt is about to be checked.
    AuthAttempt { username: String },
    AuthFailed { username: String },
    AuthSucceeded { username: String },
    /// Session ended; the username comes from the context when present.
    LoggedOut,
    PasswordReset { username: String },
    /// A termination handler was invoked with the given message.
    Termination { channel: Channel, message: DieMessage },
    /// An administrative dispatch tag was observed. `reachable` and
    /// `registered` are supplied by the adapter as plain data.
    AdminAction {
        tag: String,
        reachable: bool,
        registered: bool,
    },
    /// Honeypot form field was filled in.
    SpamHiddenField { field: String },
    /// Outbound mail domain failed the MX sanity check.
    SpamMx { domain: String },
}
