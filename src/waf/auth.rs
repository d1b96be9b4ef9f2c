use super::{Engine, Finding, Severity, Slug};
use crate::context::{RequestContext, Transport};
use std::collections::HashSet;

/// Stock catalog of usernames that only attackers try. Any login attempt
/// with one of these is an instant trigger, before any credential check.
static DEFAULT_NAMES: [&str; 33] = [
    "access",
    "admin",
    "administrator",
    "backup",
    "blog",
    "business",
    "contact",
    "data",
    "demo",
    "doctor",
    "guest",
    "info",
    "information",
    "internet",
    "login",
    "master",
    "number",
    "office",
    "pass",
    "password",
    "postmaster",
    "public",
    "root",
    "sales",
    "server",
    "service",
    "support",
    "test",
    "tester",
    "user",
    "user2",
    "username",
    "webmaster",
];

/// Immutable, case-insensitive set of forbidden usernames. Built once at
/// startup; safe for concurrent reads.
pub struct NamesBlacklist {
    names: HashSet<String>,
}

impl NamesBlacklist {
    /// Stock catalog plus any configured extras.
    pub fn new(extra: &[String]) -> Self {
        let mut names: HashSet<String> =
            DEFAULT_NAMES.iter().map(|n| n.to_string()).collect();
        names.extend(extra.iter().map(|n| n.to_lowercase()));
        Self { names }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.names.contains(&username.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NamesBlacklist {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Rules for an authentication attempt, in precedence order: blacklisted
/// name first (independent of transport and of login-disabled mode), then
/// login-disabled, then the XML-RPC transport ban.
pub(crate) fn login_attempt(
    engine: &Engine,
    ctx: &RequestContext,
    username: &str,
) -> Vec<Finding> {
    if engine.blacklist.contains(username) {
        return vec![Finding::instant(Slug::BannedUsername, username.into())];
    }

    if engine.login_disabled {
        return vec![Finding::soft(
            Slug::LoginDisabled,
            Severity::Error,
            username.into(),
        )];
    }

    if ctx.transport == Transport::XmlRpc {
        return vec![Finding::instant(Slug::XmlrpcLogin, username.into())];
    }

    Vec::new()
}

pub(crate) fn login_failed(username: &str) -> Vec<Finding> {
    vec![Finding::soft(
        Slug::AuthFailed,
        Severity::Error,
        username.into(),
    )]
}

pub(crate) fn login_succeeded(username: &str) -> Vec<Finding> {
    vec![Finding::auth(
        Slug::Authenticated,
        Severity::Info,
        username.into(),
    )]
}

pub(crate) fn logout(ctx: &RequestContext) -> Vec<Finding> {
    let username = ctx.username.clone().unwrap_or_default();
    vec![Finding::auth(
        Slug::LoggedOut,
        Severity::Info,
        username.into(),
    )]
}

/// Password-reset request. An empty identifier logs twice: the generic
/// `lost_pass_empty` entry first, then the auth-prefixed `lost_pass` entry.
pub(crate) fn lost_password(username: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if username.is_empty() {
        findings.push(Finding::soft(
            Slug::LostPassEmpty,
            Severity::Warn,
            username.into(),
        ));
    }
    findings.push(Finding::auth(Slug::LostPass, Severity::Warn, username.into()));
    findings
}
