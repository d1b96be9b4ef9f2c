use super::{Engine, Finding, Slug};
use crate::context::RequestContext;

/// Browser signatures that are *not* robots. Everything else, including an
/// empty or missing User-Agent, is treated as a robot. Intentionally a
/// conservative allow-list; false positives bias toward "robot".
static BROWSER_PREFIXES: [&str; 4] = [
    "Mozilla/5.0",
    "Mozilla/4.0 (compatible; MSIE 8.0;",
    "Mozilla/4.0 (compatible; MSIE 7.0;",
    "Opera/9.80",
];

/// Test a User-Agent string for robots.
pub fn is_robot(user_agent: &str) -> bool {
    !BROWSER_PREFIXES
        .iter()
        .any(|prefix| user_agent.starts_with(prefix))
}

/// Robot requests into internal/administrative directories.
///
/// Missing media files and stale cache items are excepted, unless the path
/// carries a script suffix (`*.pHp*` tricks included).
pub(crate) fn screen_internal_path(engine: &Engine, ctx: &RequestContext) -> Vec<Finding> {
    if !is_robot(&ctx.user_agent) || ctx.authenticated {
        return Vec::new();
    }

    if !engine.internal_dirs.is_match(&ctx.path) {
        return Vec::new();
    }

    let media_exception = ctx.path.contains(&engine.uploads_fragment)
        || ctx.path.contains(&engine.cache_fragment);
    let script_override = ctx.path.to_lowercase().contains(&engine.script_suffix);

    if !media_exception || script_override {
        return vec![Finding::instant(Slug::Robot403, ctx.path.clone().into())];
    }

    Vec::new()
}
