pub mod auth;
pub mod not_found;
pub mod robots;
pub mod termination;

pub use auth::NamesBlacklist;
pub use robots::is_robot;
pub use termination::{Channel, DieMessage};

use crate::config::GateConfig;
use crate::context::{Event, RequestContext, RequestState};
use crate::encoder::LogValue;
use regex::Regex;
use std::collections::HashSet;

/// Severity of a finding, in the ban daemon's level vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Notice,
    Warn,
    Error,
    Crit,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Crit => "crit",
        }
    }
}

/// Log-line prefix category. The daemon's filters match on these literals;
/// do not reword them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Generic,
    Instant,
    Auth,
}

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::Generic => "Malicious traffic detected: ",
            Prefix::Instant => "Break-in attempt detected: ",
            Prefix::Auth => "WordPress auth: ",
        }
    }
}

/// Stable wire identifiers consumed by the ban daemon. Meanings must not
/// change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slug {
    DirectAccess,
    NotFoundHead,
    Robot404,
    NotFound,
    UrlHack,
    Redirect,
    BannedUsername,
    XmlrpcLogin,
    AuthFailed,
    Authenticated,
    LoggedOut,
    LostPassEmpty,
    LostPass,
    LoginDisabled,
    Robot403,
    WpDieAjax,
    WpDieXmlrpc,
    WpDie,
    AdminActionUnknown,
    SpamHiddenField,
    SpamMx,
}

impl Slug {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slug::DirectAccess => "direct_access",
            Slug::NotFoundHead => "404_head",
            Slug::Robot404 => "robot_404",
            Slug::NotFound => "404",
            Slug::UrlHack => "url_hack",
            Slug::Redirect => "redirect",
            Slug::BannedUsername => "banned_username",
            Slug::XmlrpcLogin => "xmlrpc_login",
            Slug::AuthFailed => "auth_failed",
            Slug::Authenticated => "authenticated",
            Slug::LoggedOut => "logged_out",
            Slug::LostPassEmpty => "lost_pass_empty",
            Slug::LostPass => "lost_pass",
            Slug::LoginDisabled => "login_disabled",
            Slug::Robot403 => "robot_403",
            Slug::WpDieAjax => "wpdie_ajax",
            Slug::WpDieXmlrpc => "wpdie_xmlrpc",
            Slug::WpDie => "wpdie",
            Slug::AdminActionUnknown => "admin_action_unknown",
            Slug::SpamHiddenField => "wpcf7_spam_hiddenfield",
            Slug::SpamMx => "wpcf7_spam_mx",
        }
    }
}

/// A detected condition. Immediate findings terminate the request after
/// logging and a ban-signal attempt; soft findings only record.
#[derive(Debug, Clone)]
pub struct Finding {
    pub slug: Slug,
    pub severity: Severity,
    pub immediate: bool,
    pub message: LogValue,
    pub prefix: Prefix,
}

impl Finding {
    /// An instant trigger: always crit, always terminates.
    pub fn instant(slug: Slug, message: LogValue) -> Self {
        Self {
            slug,
            severity: Severity::Crit,
            immediate: true,
            message,
            prefix: Prefix::Instant,
        }
    }

    /// A soft log entry with the generic traffic prefix.
    pub fn soft(slug: Slug, severity: Severity, message: LogValue) -> Self {
        Self {
            slug,
            severity,
            immediate: false,
            message,
            prefix: Prefix::Generic,
        }
    }

    /// A soft log entry with the authentication prefix.
    pub fn auth(slug: Slug, severity: Severity, message: LogValue) -> Self {
        Self {
            slug,
            severity,
            immediate: false,
            message,
            prefix: Prefix::Auth,
        }
    }
}

/// Pure rule evaluation: (event, context, state) -> findings.
///
/// Holds only the read-only rule tables built from configuration; the only
/// mutation is through the passed-in [`RequestState`].
pub struct Engine {
    pub(crate) blacklist: NamesBlacklist,
    pub(crate) login_disabled: bool,
    pub(crate) internal_dirs: Regex,
    pub(crate) uploads_fragment: String,
    pub(crate) cache_fragment: String,
    pub(crate) script_suffix: String,
    pub(crate) allowed_actions: HashSet<String>,
}

impl Engine {
    pub fn new(config: &GateConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let dirs = config
            .internal_dirs
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let internal_dirs = Regex::new(&format!(r"(?i)/(?:{})/", dirs))?;

        Ok(Self {
            blacklist: NamesBlacklist::new(&config.extra_banned_names),
            login_disabled: config.login_disabled,
            internal_dirs,
            uploads_fragment: config.uploads_dir.clone(),
            cache_fragment: config.cache_dir.clone(),
            script_suffix: config.script_suffix.to_lowercase(),
            allowed_actions: config.allowed_actions.iter().cloned().collect(),
        })
    }

    /// Evaluate the rules applicable to one lifecycle event.
    ///
    /// Returns nothing once a previous immediate finding terminated the
    /// request: the remaining hooks of that request are dead.
    pub fn evaluate(
        &self,
        event: &Event,
        ctx: &RequestContext,
        state: &mut RequestState,
    ) -> Vec<Finding> {
        if state.terminated {
            return Vec::new();
        }

        match event {
            Event::DirectAccess => {
                vec![Finding::instant(Slug::DirectAccess, ctx.uri.clone().into())]
            }
            Event::RequestOpened => robots::screen_internal_path(self, ctx),
            Event::RequestRouted => not_found::url_hack(ctx, state),
            Event::CanonicalRedirect { requested_url } => {
                not_found::canonical_redirect(state, requested_url)
            }
            Event::NotFoundResolved => not_found::resolve_not_found(ctx),
            Event::AuthAttempt { username } => auth::login_attempt(self, ctx, username),
            Event::AuthFailed { username } => auth::login_failed(username),
            Event::AuthSucceeded { username } => auth::login_succeeded(username),
            Event::LoggedOut => auth::logout(ctx),
            Event::PasswordReset { username } => auth::lost_password(username),
            Event::Termination { channel, message } => termination::on_die(*channel, message),
            Event::AdminAction {
                tag,
                reachable,
                registered,
            } => termination::admin_action(self, tag, *reachable, *registered),
            Event::SpamHiddenField { field } => {
                vec![Finding::instant(Slug::SpamHiddenField, field.clone().into())]
            }
            Event::SpamMx { domain } => vec![Finding::soft(
                Slug::SpamMx,
                Severity::Warn,
                domain.clone().into(),
            )],
        }
    }
}
