//! Injection-resistant log encoding.
//!
//! Every message that reaches the log line goes through [`escape`]: a
//! self-describing, length-prefixed serialization so an attacker-controlled
//! value can never fake a record boundary or a second log entry. The ban
//! daemon's filters match on the literal prefixes and slugs, so the record
//! layout here is a wire contract.

use crate::context::RequestContext;
use crate::waf::Finding;

/// Maximum encoded length, counted in Unicode code points (not bytes) so
/// truncation never splits a multi-byte sequence.
const MAX_ENCODED_CHARS: usize = 500;

/// Typed message payload carried by a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogValue {
    None,
    Str(String),
    Int(i64),
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::Str(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::Str(s)
    }
}

impl From<i64> for LogValue {
    fn from(n: i64) -> Self {
        LogValue::Int(n)
    }
}

/// Serialize a value into its self-describing textual form. The length
/// prefix counts code points of the payload.
fn serialize(value: &LogValue) -> String {
    match value {
        LogValue::None => "N;".to_string(),
        LogValue::Str(s) => format!("s:{}:\"{}\";", s.chars().count(), s),
        LogValue::Int(n) => format!("i:{};", n),
    }
}

/// Encode a value for inclusion in one log line.
///
/// Deterministic and total: serialize, truncate to 500 code points, turn
/// line breaks into `|`, replace remaining control code points with U+00BF,
/// then wrap as ` (<content>)`.
pub fn escape(value: &LogValue) -> String {
    let serialized = serialize(value);
    let mut content = String::with_capacity(serialized.len().min(MAX_ENCODED_CHARS));
    for c in serialized.chars().take(MAX_ENCODED_CHARS) {
        match c {
            '\n' | '\r' => content.push('|'),
            c if c.is_control() => content.push('\u{00BF}'),
            c => content.push(c),
        }
    }
    format!(" ({})", content)
}

/// Assemble the full log record for a finding:
/// `[<level>] [client <ip>:<port>] <prefix><slug><encoded>[, referer:<encoded>] <<entry>`.
///
/// The referer segment is omitted entirely when the context carries none.
pub fn format_record(finding: &Finding, ctx: &RequestContext, entry_point: &str) -> String {
    let referer = match &ctx.referer {
        Some(r) => format!(", referer:{}", escape(&LogValue::Str(r.clone()))),
        None => String::new(),
    };

    format!(
        "[{}] [client {}:{}] {}{}{}{} <{}",
        finding.severity.as_str(),
        ctx.remote_addr,
        ctx.remote_port,
        finding.prefix.as_str(),
        finding.slug.as_str(),
        escape(&finding.message),
        referer,
        entry_point
    )
}

/// Assemble a secondary diagnostic record that is not a finding, e.g. a
/// failed ban-signal call.
pub fn format_note(level: &str, note: &str, ctx: &RequestContext, entry_point: &str) -> String {
    format!(
        "[{}] [client {}:{}] {} <{}",
        level, ctx.remote_addr, ctx.remote_port, note, entry_point
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waf::{Finding, Severity, Slug};

    #[test]
    fn test_escape_plain_string() {
        assert_eq!(escape(&"admin".into()), " (s:5:\"admin\";)");
    }

    #[test]
    fn test_escape_int() {
        assert_eq!(escape(&LogValue::Int(-1)), " (i:-1;)");
    }

    #[test]
    fn test_escape_none() {
        assert_eq!(escape(&LogValue::None), " (N;)");
    }

    #[test]
    fn test_escape_length_counts_code_points() {
        // Two code points, four UTF-8 bytes.
        assert_eq!(escape(&"éé".into()), " (s:2:\"éé\";)");
    }

    #[test]
    fn test_escape_never_emits_line_breaks() {
        let encoded = escape(&"a\nb\r\nc".into());
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
        assert!(encoded.contains("a|b||c"));
    }

    #[test]
    fn test_escape_replaces_control_chars() {
        let encoded = escape(&"a\x00b\x1bc".into());
        assert_eq!(encoded, " (s:5:\"a\u{00BF}b\u{00BF}c\";)");
    }

    #[test]
    fn test_escape_truncates_at_500_code_points() {
        let long = "x".repeat(600);
        let encoded = escape(&LogValue::Str(long));
        // " (" + 500 + ")"
        assert_eq!(encoded.chars().count(), 503);
    }

    #[test]
    fn test_escape_truncation_multibyte_safe() {
        let long = "é".repeat(600);
        let encoded = escape(&LogValue::Str(long));
        assert_eq!(encoded.chars().count(), 503);
        assert!(encoded.ends_with(')'));
    }

    #[test]
    fn test_escape_deterministic() {
        let v: LogValue = "probe".into();
        assert_eq!(escape(&v), escape(&v));
    }

    fn ctx() -> RequestContext {
        let mut ctx = RequestContext::new("GET", "/x", "192.0.2.7", 54321);
        ctx.referer = Some("http://evil.example/".to_string());
        ctx
    }

    #[test]
    fn test_format_record_with_referer() {
        let finding = Finding::soft(Slug::NotFound, Severity::Info, "/x".into());
        let line = format_record(&finding, &ctx(), "index.php");
        assert_eq!(
            line,
            "[info] [client 192.0.2.7:54321] Malicious traffic detected: 404 \
             (s:2:\"/x\";), referer: (s:20:\"http://evil.example/\";) <index.php"
        );
    }

    #[test]
    fn test_format_record_omits_absent_referer() {
        let mut ctx = ctx();
        ctx.referer = None;
        let finding = Finding::instant(Slug::Robot403, "/wp-admin/".into());
        let line = format_record(&finding, &ctx, "index.php");
        assert!(!line.contains("referer"));
        assert!(line.starts_with("[crit] [client 192.0.2.7:54321] Break-in attempt detected: robot_403"));
        assert!(line.ends_with(" <index.php"));
    }

    #[test]
    fn test_format_note_layout() {
        let line = format_note("error", "Ban operation failed.", &ctx(), "index.php");
        assert_eq!(
            line,
            "[error] [client 192.0.2.7:54321] Ban operation failed. <index.php"
        );
    }
}
