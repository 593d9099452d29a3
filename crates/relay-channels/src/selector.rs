//! Channel selection policy — which names a dispatch targets.
//!
//! Precedence: an explicit directive from the alert wins verbatim; otherwise
//! the configured default channels; otherwise the mode-dependent fallback
//! (the primary channel in pick mode, every registered channel in broadcast
//! mode).

use crate::manager::SendMode;

/// Resolve the channel names a dispatch should target.
pub fn select(
    explicit: Option<&[String]>,
    default_channels: &[String],
    mode: SendMode,
    primary: Option<&str>,
    all_channels: &[String],
) -> Vec<String> {
    if let Some(directive) = explicit {
        let cleaned: Vec<String> = directive
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if !cleaned.is_empty() {
            return cleaned;
        }
    }

    if !default_channels.is_empty() {
        return default_channels.to_vec();
    }

    match mode {
        SendMode::Pick => primary.map(|p| vec![p.to_string()]).unwrap_or_default(),
        SendMode::Broadcast => all_channels.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explicit_directive_wins() {
        let explicit = names(&["a", "b"]);
        let defaults = names(&["ops"]);
        let all = names(&["a", "b", "c"]);

        for mode in [SendMode::Pick, SendMode::Broadcast] {
            let selected = select(Some(&explicit), &defaults, mode, Some("c"), &all);
            assert_eq!(selected, names(&["a", "b"]));
        }
    }

    #[test]
    fn test_explicit_directive_trimmed() {
        let explicit = names(&[" a ", "", "b"]);
        let selected = select(Some(&explicit), &[], SendMode::Pick, None, &[]);
        assert_eq!(selected, names(&["a", "b"]));
    }

    #[test]
    fn test_blank_directive_falls_through() {
        let explicit = names(&["", "  "]);
        let defaults = names(&["ops"]);
        let selected = select(Some(&explicit), &defaults, SendMode::Pick, None, &[]);
        assert_eq!(selected, names(&["ops"]));
    }

    #[test]
    fn test_default_channels_beat_mode_policy() {
        let defaults = names(&["ops", "pager"]);
        let all = names(&["a", "b"]);
        let selected = select(None, &defaults, SendMode::Broadcast, Some("a"), &all);
        assert_eq!(selected, names(&["ops", "pager"]));
    }

    #[test]
    fn test_pick_falls_back_to_primary() {
        let all = names(&["a", "b"]);
        let selected = select(None, &[], SendMode::Pick, Some("a"), &all);
        assert_eq!(selected, names(&["a"]));
    }

    #[test]
    fn test_pick_without_primary_selects_nothing() {
        let selected = select(None, &[], SendMode::Pick, None, &[]);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_broadcast_falls_back_to_all_channels() {
        let all = names(&["a", "b", "c"]);
        let selected = select(None, &[], SendMode::Broadcast, Some("a"), &all);
        assert_eq!(selected, all);
    }
}
