//! Sliding window over the client-supplied conversation history.

use wf_domain::tool::Message;
use wf_domain::turn::HistoryEntry;

/// The trailing `max` entries of `history`, oldest first, mapped to prompt
/// messages (`isUser` → user role, everything else → assistant role).
pub fn window(history: &[HistoryEntry], max: usize) -> Vec<Message> {
    let start = history.len().saturating_sub(max);
    history[start..]
        .iter()
        .map(|entry| {
            if entry.is_user {
                Message::user(entry.content.as_str())
            } else {
                Message::assistant(entry.content.as_str())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_domain::tool::Role;

    fn log(len: usize) -> Vec<HistoryEntry> {
        (0..len)
            .map(|i| HistoryEntry {
                content: format!("m{i}"),
                is_user: i % 2 == 0,
            })
            .collect()
    }

    #[test]
    fn empty_history_yields_empty_window() {
        assert!(window(&[], 20).is_empty());
    }

    #[test]
    fn keeps_trailing_entries_in_order() {
        let w = window(&log(25), 20);
        assert_eq!(w.len(), 20);
        assert_eq!(w[0].content.text(), Some("m5"));
        assert_eq!(w[19].content.text(), Some("m24"));
    }

    #[test]
    fn length_is_min_of_log_and_limit() {
        for len in 0..30 {
            for max in 0..25 {
                let entries = log(len);
                let w = window(&entries, max);
                let expected = len.min(max);
                assert_eq!(w.len(), expected, "len={len} max={max}");
                for (msg, entry) in w.iter().zip(&entries[len - expected..]) {
                    assert_eq!(msg.content.text(), Some(entry.content.as_str()));
                }
            }
        }
    }

    #[test]
    fn maps_roles_from_is_user() {
        let w = window(&[HistoryEntry::user("hi"), HistoryEntry::assistant("hello")], 20);
        assert_eq!(w[0].role, Role::User);
        assert_eq!(w[1].role, Role::Assistant);
    }
}
