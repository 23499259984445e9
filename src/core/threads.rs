//! Thread reconstruction.
//!
//! Exports store thread replies as ordinary messages in chronological order.
//! The parent of a thread lists its replies as `{user, ts}` pointers; this
//! module moves every matched reply directly under its parent.

use std::collections::HashMap;

use crate::message::Message;

/// Re-orders `messages` so each thread follows its parent.
///
/// `messages` must already be in chronological order. For every parent, each
/// `replies` pointer claims the earliest message with that `(user, ts)` that
/// no other pointer has claimed yet. A parent's replies are emitted right
/// after it in their original order, and are marked with
/// [`Message::into_thread_reply`]. Pointers that match nothing are dropped.
/// Messages that are not replies keep their relative order.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use slackview::Message;
/// use slackview::core::build_threads;
/// use slackview::formatter::SlackFormatter;
/// use slackview::metadata::{ConversationIndex, ConversationKind};
/// use slackview::user::UserDirectory;
///
/// let formatter = SlackFormatter::new(
///     Arc::new(UserDirectory::new(Vec::new())),
///     Arc::new(ConversationIndex::empty(ConversationKind::Channel)),
/// );
/// let raw = [
///     r#"{"ts": "100.0", "user": "Y", "text": "hello"}"#,
///     r#"{"ts": "105.0", "user": "X", "text": "first", "reply_count": 1,
///         "replies": [{"user": "X", "ts": "110.0"}]}"#,
///     r#"{"ts": "110.0", "user": "X", "text": "reply"}"#,
/// ];
/// let messages = raw
///     .iter()
///     .map(|r| Message::new(&formatter, serde_json::from_str(r).unwrap(), "C1", "acme"))
///     .collect();
///
/// let threaded = build_threads(messages, true);
/// let ts: Vec<_> = threaded.iter().filter_map(Message::ts).collect();
/// assert_eq!(ts, ["100.0", "105.0", "110.0"]);
/// assert!(threaded[2].msg().starts_with("<b>Thread Reply:</b>"));
/// ```
pub fn build_threads(messages: Vec<Message>, thread_note: bool) -> Vec<Message> {
    let len = messages.len();

    let mut index: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (pos, message) in messages.iter().enumerate() {
        let raw = message.raw();
        if let (Some(user), Some(ts)) = (raw.user.as_deref(), raw.ts.as_deref()) {
            index.entry((user, ts)).or_default().push(pos);
        }
    }

    let mut parent_of: Vec<Option<usize>> = vec![None; len];
    let mut replies_of: Vec<Vec<usize>> = vec![Vec::new(); len];

    for (pos, message) in messages.iter().enumerate() {
        let raw = message.raw();
        if !raw.has_thread() {
            continue;
        }
        for pointer in &raw.replies {
            let Some(candidates) = index.get(&(pointer.user.as_str(), pointer.ts.as_str())) else {
                continue;
            };
            let claimed = candidates
                .iter()
                .copied()
                .find(|&c| parent_of[c].is_none() && !is_ancestor(&parent_of, c, pos));
            if let Some(reply) = claimed {
                parent_of[reply] = Some(pos);
                replies_of[pos].push(reply);
            }
        }
        replies_of[pos].sort_unstable();
    }

    let mut slots: Vec<Option<Message>> = messages.into_iter().map(Some).collect();
    let mut threaded = Vec::with_capacity(len);
    let mut stack = Vec::new();

    for root in (0..len).filter(|&pos| parent_of[pos].is_none()) {
        stack.push(root);
        while let Some(pos) = stack.pop() {
            let Some(message) = slots[pos].take() else {
                continue;
            };
            threaded.push(if parent_of[pos].is_some() {
                message.into_thread_reply(thread_note)
            } else {
                message
            });
            stack.extend(replies_of[pos].iter().rev());
        }
    }

    threaded
}

/// Returns `true` if `candidate` is `pos` itself or one of its thread ancestors.
fn is_ancestor(parent_of: &[Option<usize>], candidate: usize, mut pos: usize) -> bool {
    loop {
        if pos == candidate {
            return true;
        }
        match parent_of[pos] {
            Some(parent) => pos = parent,
            None => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::SlackFormatter;
    use crate::metadata::{ConversationIndex, ConversationKind};
    use crate::user::UserDirectory;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn build(values: Vec<Value>) -> Vec<Message> {
        let formatter = SlackFormatter::new(
            Arc::new(UserDirectory::new(Vec::new())),
            Arc::new(ConversationIndex::empty(ConversationKind::Channel)),
        );
        values
            .into_iter()
            .map(|v| Message::new(&formatter, serde_json::from_value(v).unwrap(), "C1", "acme"))
            .collect()
    }

    fn order(messages: &[Message]) -> Vec<&str> {
        messages.iter().filter_map(Message::ts).collect()
    }

    #[test]
    fn test_reply_moves_under_parent() {
        let messages = build(vec![
            json!({"ts": "105.0", "user": "X", "text": "parent", "reply_count": 1,
                   "replies": [{"user": "X", "ts": "120.0"}]}),
            json!({"ts": "110.0", "user": "Y", "text": "unrelated"}),
            json!({"ts": "120.0", "user": "X", "text": "reply"}),
        ]);
        let threaded = build_threads(messages, true);
        assert_eq!(order(&threaded), ["105.0", "120.0", "110.0"]);
        assert!(threaded[1].is_thread_reply());
        assert!(!threaded[2].is_thread_reply());
        assert_eq!(threaded[1].msg(), "<b>Thread Reply:</b> reply");
    }

    #[test]
    fn test_replies_sorted_regardless_of_pointer_order() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 2,
                   "replies": [{"user": "Z", "ts": "3.0"}, {"user": "Y", "ts": "2.0"}]}),
            json!({"ts": "2.0", "user": "Y", "text": "a"}),
            json!({"ts": "3.0", "user": "Z", "text": "b"}),
        ]);
        assert_eq!(order(&build_threads(messages, true)), ["1.0", "2.0", "3.0"]);
    }

    #[test]
    fn test_unmatched_pointer_dropped() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 1,
                   "replies": [{"user": "X", "ts": "999.0"}]}),
            json!({"ts": "2.0", "user": "Y", "text": "b"}),
        ]);
        let threaded = build_threads(messages, true);
        assert_eq!(order(&threaded), ["1.0", "2.0"]);
        assert!(threaded.iter().all(|m| !m.is_thread_reply()));
    }

    #[test]
    fn test_duplicate_pointers_claim_distinct_matches() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 2,
                   "replies": [{"user": "Y", "ts": "2.0"}, {"user": "Y", "ts": "2.0"}]}),
            json!({"ts": "2.0", "user": "Y", "text": "first copy"}),
            json!({"ts": "2.0", "user": "Y", "text": "second copy"}),
            json!({"ts": "3.0", "user": "Y", "text": "after"}),
        ]);
        let threaded = build_threads(messages, true);
        assert_eq!(threaded.len(), 4);
        assert!(threaded[1].msg().ends_with("first copy"));
        assert!(threaded[2].msg().ends_with("second copy"));
        assert!(!threaded[3].is_thread_reply());
    }

    #[test]
    fn test_second_parent_cannot_steal_reply() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 1, "replies": [{"user": "Y", "ts": "3.0"}]}),
            json!({"ts": "2.0", "user": "X", "reply_count": 1, "replies": [{"user": "Y", "ts": "3.0"}]}),
            json!({"ts": "3.0", "user": "Y", "text": "reply"}),
        ]);
        assert_eq!(order(&build_threads(messages, true)), ["1.0", "3.0", "2.0"]);
    }

    #[test]
    fn test_self_reference_and_cycles_keep_every_message() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 1, "replies": [
                {"user": "X", "ts": "1.0"}, {"user": "Y", "ts": "2.0"}]}),
            json!({"ts": "2.0", "user": "Y", "reply_count": 1, "replies": [{"user": "X", "ts": "1.0"}]}),
        ]);
        let threaded = build_threads(messages, true);
        assert_eq!(order(&threaded), ["1.0", "2.0"]);
        assert!(!threaded[0].is_thread_reply());
        assert!(threaded[1].is_thread_reply());
    }

    #[test]
    fn test_thread_note_disabled() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 1, "replies": [{"user": "X", "ts": "2.0"}]}),
            json!({"ts": "2.0", "user": "X", "text": "reply"}),
        ]);
        let threaded = build_threads(messages, false);
        assert_eq!(threaded[1].msg(), "reply");
        assert!(threaded[1].is_thread_reply());
    }

    #[test]
    fn test_rebuilding_does_not_double_tag() {
        let messages = build(vec![
            json!({"ts": "1.0", "user": "X", "reply_count": 1, "replies": [{"user": "X", "ts": "2.0"}]}),
            json!({"ts": "2.0", "user": "X", "text": "reply"}),
        ]);
        let once = build_threads(messages, true);
        let twice = build_threads(once.clone(), true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_threads(Vec::new(), true).is_empty());
    }
}
