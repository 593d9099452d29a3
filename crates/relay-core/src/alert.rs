//! Inbound alert parsing — turns a raw webhook body into logical alerts.
//!
//! A payload is either JSON (one alert object, or an array of them) or free
//! text. Free-text payloads may carry several alerts separated by blank
//! lines; each alert's human-readable message is taken from a `summary:` /
//! `描述:` line, and an optional `channel:` / `渠道:` line selects the
//! outbound channels explicitly.

use serde::Deserialize;

/// One logical alert extracted from an inbound payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedAlert {
    /// Human-readable message to relay.
    pub message: String,
    /// Explicit channel selection, overriding the default policy.
    pub channels: Option<Vec<String>>,
    /// Per-alert target address, overriding the configured default.
    pub target: Option<String>,
}

/// Placeholder message when a free-text alert has no summary line.
const FALLBACK_SUMMARY: &str = "No summary provided";

const SUMMARY_PREFIXES: &[&str] = &["summary:", "描述:"];
const CHANNEL_PREFIXES: &[&str] = &["channel:", "渠道:"];

/// JSON shape of a structured alert.
#[derive(Debug, Deserialize)]
struct JsonAlert {
    message: String,
    #[serde(default)]
    channels: Option<Vec<String>>,
    #[serde(default)]
    target: Option<String>,
}

impl From<JsonAlert> for ParsedAlert {
    fn from(a: JsonAlert) -> Self {
        ParsedAlert {
            message: a.message,
            // An explicitly empty list is the same as no directive.
            channels: a.channels.filter(|c| !c.is_empty()),
            target: a.target.filter(|t| !t.is_empty()),
        }
    }
}

/// Parse a raw webhook body into zero or more logical alerts.
///
/// JSON is tried first (object, then array); anything else is treated as
/// free text split on blank lines.
pub fn parse_payload(raw: &str) -> Vec<ParsedAlert> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('{') {
        if let Ok(alert) = serde_json::from_str::<JsonAlert>(trimmed) {
            return vec![alert.into()];
        }
    }
    if trimmed.starts_with('[') {
        if let Ok(alerts) = serde_json::from_str::<Vec<JsonAlert>>(trimmed) {
            return alerts.into_iter().map(Into::into).collect();
        }
    }

    trimmed
        .split("\n\n")
        .filter(|chunk| !chunk.trim().is_empty())
        .map(parse_text_alert)
        .collect()
}

/// Parse one free-text alert chunk.
fn parse_text_alert(chunk: &str) -> ParsedAlert {
    ParsedAlert {
        message: extract_summary(chunk)
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
        channels: channel_directive(chunk),
        target: None,
    }
}

/// Extract the explicit channel directive from a free-text alert, if any.
///
/// A directive is a line such as `channel: a,b`; values are trimmed and
/// empty tokens dropped. Returns `None` when no directive line is present
/// or the directive carries no usable names.
pub fn channel_directive(text: &str) -> Option<Vec<String>> {
    for line in text.lines() {
        let line = line.trim();
        for prefix in CHANNEL_PREFIXES {
            if let Some(rest) = line.strip_prefix(prefix) {
                let names = split_list(rest);
                if names.is_empty() {
                    return None;
                }
                return Some(names);
            }
        }
    }
    None
}

/// Extract the summary line from a free-text alert chunk.
fn extract_summary(chunk: &str) -> Option<String> {
    for line in chunk.lines() {
        let line = line.trim();
        for prefix in SUMMARY_PREFIXES {
            if let Some(rest) = line.strip_prefix(prefix) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_directive_basic() {
        let text = "summary: disk full\nchannel: a,b";
        assert_eq!(
            channel_directive(text),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_channel_directive_trims_and_drops_empty_tokens() {
        let text = "channel:  ops , , pager ,";
        assert_eq!(
            channel_directive(text),
            Some(vec!["ops".to_string(), "pager".to_string()])
        );
    }

    #[test]
    fn test_channel_directive_cjk_prefix() {
        let text = "描述: 磁盘已满\n渠道: feishu1,sms1";
        assert_eq!(
            channel_directive(text),
            Some(vec!["feishu1".to_string(), "sms1".to_string()])
        );
    }

    #[test]
    fn test_channel_directive_absent() {
        assert_eq!(channel_directive("summary: all good"), None);
    }

    #[test]
    fn test_channel_directive_empty_value() {
        assert_eq!(channel_directive("channel:  "), None);
    }

    #[test]
    fn test_parse_single_text_alert() {
        let alerts = parse_payload("summary: db down\nseverity: critical");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "db down");
        assert_eq!(alerts[0].channels, None);
        assert_eq!(alerts[0].target, None);
    }

    #[test]
    fn test_parse_multiple_text_alerts() {
        let raw = "summary: first\n\nsummary: second\nchannel: ops\n\n\n";
        let alerts = parse_payload(raw);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "first");
        assert_eq!(alerts[1].message, "second");
        assert_eq!(alerts[1].channels, Some(vec!["ops".to_string()]));
    }

    #[test]
    fn test_parse_text_without_summary_uses_fallback() {
        let alerts = parse_payload("something happened");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "No summary provided");
    }

    #[test]
    fn test_parse_json_object() {
        let raw = r#"{"message": "db down", "channels": ["a", "b"], "target": "15200000000"}"#;
        let alerts = parse_payload(raw);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "db down");
        assert_eq!(
            alerts[0].channels,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(alerts[0].target.as_deref(), Some("15200000000"));
    }

    #[test]
    fn test_parse_json_array() {
        let raw = r#"[{"message": "one"}, {"message": "two", "channels": ["ops"]}]"#;
        let alerts = parse_payload(raw);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "one");
        assert_eq!(alerts[0].channels, None);
        assert_eq!(alerts[1].channels, Some(vec!["ops".to_string()]));
    }

    #[test]
    fn test_parse_json_empty_channels_is_no_directive() {
        let raw = r#"{"message": "hello", "channels": []}"#;
        let alerts = parse_payload(raw);
        assert_eq!(alerts[0].channels, None);
    }

    #[test]
    fn test_parse_invalid_json_falls_back_to_text() {
        let raw = "{not json at all";
        let alerts = parse_payload(raw);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "No summary provided");
    }

    #[test]
    fn test_parse_empty_payload() {
        assert!(parse_payload("").is_empty());
        assert!(parse_payload("  \n\n  ").is_empty());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ,").is_empty());
    }
}
