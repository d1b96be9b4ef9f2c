use super::{is_robot, Finding, Severity, Slug};
use crate::context::{RequestContext, RequestState};

/// Open-redirect probing: a raw URI starting with `//`. Marks the request
/// so the canonical redirect rule does not log the same condition twice.
pub(crate) fn url_hack(ctx: &RequestContext, state: &mut RequestState) -> Vec<Finding> {
    if !ctx.uri.starts_with("//") {
        return Vec::new();
    }

    state.redirect_seen = true;
    vec![Finding::soft(
        Slug::UrlHack,
        Severity::Error,
        ctx.uri.clone().into(),
    )]
}

/// The canonical redirect resolver fired. Logged only when an earlier rule
/// in this request has not already claimed the redirect.
pub(crate) fn canonical_redirect(state: &RequestState, requested_url: &str) -> Vec<Finding> {
    if state.redirect_seen {
        return Vec::new();
    }

    vec![Finding::soft(
        Slug::Redirect,
        Severity::Notice,
        requested_url.into(),
    )]
}

/// The request resolved to no known resource. HEAD probing is an instant
/// trigger; robots get a minimal 404 without the normal 404 page; humans
/// fall through to normal rendering.
pub(crate) fn resolve_not_found(ctx: &RequestContext) -> Vec<Finding> {
    if ctx.method.to_ascii_lowercase().contains("head") {
        return vec![Finding::instant(Slug::NotFoundHead, ctx.uri.clone().into())];
    }

    if is_robot(&ctx.user_agent) && !ctx.authenticated {
        return vec![Finding::soft(
            Slug::Robot404,
            Severity::Info,
            ctx.uri.clone().into(),
        )];
    }

    vec![Finding::soft(
        Slug::NotFound,
        Severity::Info,
        ctx.uri.clone().into(),
    )]
}
