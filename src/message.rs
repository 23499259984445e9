//! Rendered message records.
//!
//! [`Message`] is the read-only view the viewer shows for one raw day-file
//! record. Every derived field (author name, local time, HTML body,
//! attachments, reactions, permalink) is computed once in [`Message::new`];
//! afterwards the record is never mutated. Thread reconstruction marks
//! replies by producing a new record through [`Message::into_thread_reply`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use slackview::Message;
//! use slackview::formatter::SlackFormatter;
//! use slackview::metadata::{ConversationIndex, ConversationKind};
//! use slackview::raw::RawMessage;
//! use slackview::user::{User, UserDirectory};
//!
//! let users = Arc::new(UserDirectory::new(vec![User::new("U1", "alice")]));
//! let channels = Arc::new(ConversationIndex::empty(ConversationKind::Channel));
//! let formatter = SlackFormatter::new(users, channels);
//!
//! let raw: RawMessage = serde_json::from_str(
//!     r#"{"ts": "1456427378.000002", "user": "U1", "text": "*hi*"}"#,
//! )?;
//! let msg = Message::new(&formatter, raw, "C1", "acme");
//!
//! assert_eq!(msg.username(), Some("alice"));
//! assert_eq!(msg.msg(), "<strong>hi</strong>");
//! assert_eq!(
//!     msg.permalink(),
//!     Some("https://acme.slack.com/archives/C1/p1456427378000002")
//! );
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::error;

use crate::attachment::{Attachment, AttachmentKind};
use crate::formatter::{Formatter, blocks, emoji};
use crate::raw::RawMessage;
use crate::user::{SLACKBOT_ID, SLACKBOT_NAME};

/// Body shown for messages with neither blocks nor text.
pub const EMPTY_MESSAGE_TEXT: &str = "[ MESSAGE TEXT EMPTY ]";

/// Marker put in front of the body of a thread reply.
pub const THREAD_REPLY_NOTE: &str = "<b>Thread Reply:</b> ";

/// Size of the author icon shown next to a message.
pub const USER_ICON_SIZE: u32 = 72;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An emoji reaction with its users resolved to display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reaction {
    /// Users that could be resolved; unknown ids are skipped.
    pub usernames: Vec<String>,
    /// Unicode emoji, or `:name:` for custom emoji.
    pub name: String,
}

/// One rendered message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(skip)]
    raw: RawMessage,

    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,

    msg: String,

    attachments: Vec<Attachment>,

    files: Vec<Attachment>,

    reactions: Vec<Reaction>,

    img: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    permalink: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    subtype: Option<String>,

    is_thread_reply: bool,
}

impl Message {
    /// Builds the record for `raw`, found in conversation `conversation_id`
    /// of workspace `workspace`.
    pub fn new<F>(formatter: &F, raw: RawMessage, conversation_id: &str, workspace: &str) -> Self
    where
        F: Formatter + ?Sized,
    {
        let author = formatter.find_author(&raw);

        let user_id = raw.user.clone().or_else(|| raw.bot_id.clone());
        if user_id.is_none() {
            error!(ts = ?raw.ts, "no user id on message");
        }

        let username = author
            .as_ref()
            .and_then(|u| u.display_name().map(str::to_string))
            .or_else(|| fallback_username(&raw));

        let img = author
            .as_ref()
            .and_then(|u| u.image_url(Some(USER_ICON_SIZE)))
            .unwrap_or_default()
            .to_string();

        let source = Some(&raw.blocks)
            .filter(|b| !b.is_empty())
            .map(|b| blocks::render_blocks(b, formatter, workspace))
            .filter(|rendered| !rendered.trim().is_empty())
            .or_else(|| raw.text.clone())
            .unwrap_or_default();
        let msg = if source.trim().is_empty() {
            formatter.render(EMPTY_MESSAGE_TEXT, true)
        } else {
            formatter.render(&source, true)
        };

        let attachments = raw
            .attachments
            .iter()
            .map(|entry| Attachment::new(AttachmentKind::Attachment, entry.clone(), formatter))
            .collect();

        let files = match &raw.file {
            Some(file) => vec![Attachment::new(AttachmentKind::File, file.clone(), formatter)],
            None => raw
                .files
                .iter()
                .map(|entry| Attachment::new(AttachmentKind::File, entry.clone(), formatter))
                .collect(),
        };

        let reactions = raw
            .reactions
            .iter()
            .map(|reaction| Reaction {
                usernames: reaction
                    .users
                    .iter()
                    .filter_map(|id| formatter.resolve_user(id))
                    .filter_map(|u| u.display_name().map(str::to_string))
                    .collect(),
                name: emoji::shortcode_to_unicode(&reaction.name),
            })
            .collect();

        Self {
            user_id,
            username,
            time: raw.ts.as_deref().and_then(local_time),
            msg,
            attachments,
            files,
            reactions,
            img,
            permalink: permalink(&raw, conversation_id, workspace),
            subtype: raw.subtype.clone(),
            is_thread_reply: false,
            raw,
        }
    }

    // =========================================================================
    // Thread marking
    // =========================================================================

    /// Returns this record marked as a reply shown under its thread parent.
    ///
    /// With `note` set, the body gets a "Thread Reply:" prefix. Marking an
    /// already-marked record changes nothing.
    #[must_use]
    pub fn into_thread_reply(mut self, note: bool) -> Self {
        if note && !self.msg.starts_with(THREAD_REPLY_NOTE) {
            self.msg.insert_str(0, THREAD_REPLY_NOTE);
        }
        self.is_thread_reply = true;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The record this view was built from.
    pub fn raw(&self) -> &RawMessage {
        &self.raw
    }

    /// `user`, else `bot_id` of the raw record.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Local time `YYYY-MM-DD HH:MM:SS`, floored to the second.
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// Anchor id of the message; the same as [`time`](Self::time).
    pub fn id(&self) -> Option<&str> {
        self.time()
    }

    /// Raw timestamp string.
    pub fn ts(&self) -> Option<&str> {
        self.raw.ts.as_deref()
    }

    /// Rendered HTML body.
    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn files(&self) -> &[Attachment] {
        &self.files
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Author icon URL, empty when the author has none.
    pub fn img(&self) -> &str {
        &self.img
    }

    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Returns `true` once the record has been placed under a thread parent.
    pub fn is_thread_reply(&self) -> bool {
        self.is_thread_reply
    }

    /// Numeric timestamp used for ordering.
    pub fn sort_key(&self) -> f64 {
        self.raw.sort_key()
    }
}

fn fallback_username(raw: &RawMessage) -> Option<String> {
    if let Some(username) = &raw.username {
        return Some(username.clone());
    }
    if let Some(user) = raw.user.as_deref() {
        return Some(if user == SLACKBOT_ID {
            SLACKBOT_NAME.to_string()
        } else {
            user.to_string()
        });
    }
    raw.bot_id.clone()
}

/// Formats the whole-second part of a `seconds.micros` timestamp in local time.
fn local_time(ts: &str) -> Option<String> {
    let seconds = ts.split('.').next()?.parse::<i64>().ok()?;
    let utc = DateTime::from_timestamp(seconds, 0)?;
    Some(utc.with_timezone(&Local).format(TIME_FORMAT).to_string())
}

fn permalink(raw: &RawMessage, conversation_id: &str, workspace: &str) -> Option<String> {
    let ts = raw.ts.as_deref()?;
    let mut link = format!(
        "https://{workspace}.slack.com/archives/{conversation_id}/p{}",
        ts.replace('.', "")
    );
    if raw.is_thread_reply() {
        if let Some(thread_ts) = raw.thread_ts.as_deref() {
            link.push_str(&format!("?thread_ts={thread_ts}&cid={conversation_id}"));
        }
    }
    Some(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::SlackFormatter;
    use crate::metadata::{ConversationIndex, ConversationKind};
    use crate::user::{Profile, User, UserDirectory};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn formatter() -> SlackFormatter {
        let mut extra = HashMap::new();
        extra.insert("image_72".to_string(), json!("http://img/alice-72"));
        let alice = User::new("U1", "alice").with_profile(Profile {
            real_name: Some("Alice".into()),
            extra,
            ..Profile::default()
        });
        let users = Arc::new(UserDirectory::new(vec![alice, User::new("U2", "bob")]));
        let channels = Arc::new(ConversationIndex::empty(ConversationKind::Channel));
        SlackFormatter::new(users, channels)
    }

    fn message(value: Value) -> Message {
        Message::new(&formatter(), serde_json::from_value(value).unwrap(), "C1", "acme")
    }

    #[test]
    fn test_resolved_author() {
        let msg = message(json!({"ts": "100.000001", "user": "U1", "text": "hi"}));
        assert_eq!(msg.user_id(), Some("U1"));
        assert_eq!(msg.username(), Some("Alice"));
        assert_eq!(msg.img(), "http://img/alice-72");
        assert_eq!(msg.msg(), "hi");
        assert!(!msg.is_thread_reply());
    }

    #[test]
    fn test_username_fallbacks() {
        let named = message(json!({"ts": "1.0", "user": "U404", "username": "ghost"}));
        assert_eq!(named.username(), Some("ghost"));
        assert_eq!(named.img(), "");

        let raw_id = message(json!({"ts": "1.0", "user": "U404"}));
        assert_eq!(raw_id.username(), Some("U404"));

        let bot = message(json!({"ts": "1.0", "bot_id": "B404"}));
        assert_eq!(bot.user_id(), Some("B404"));
        assert_eq!(bot.username(), Some("B404"));

        let nobody = message(json!({"ts": "1.0", "text": "?"}));
        assert_eq!(nobody.user_id(), None);
        assert_eq!(nobody.username(), None);
    }

    #[test]
    fn test_slackbot_name() {
        let msg = message(json!({"ts": "1.0", "user": "USLACKBOT", "text": "reminder"}));
        assert_eq!(msg.username(), Some("slackbot"));
    }

    #[test]
    fn test_time_is_local_and_floored() {
        let msg = message(json!({"ts": "1456427378.999999", "user": "U1"}));
        let expected = DateTime::from_timestamp(1_456_427_378, 0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(msg.time(), Some(expected.as_str()));
        assert_eq!(msg.id(), msg.time());

        let untimed = message(json!({"user": "U1", "text": "x"}));
        assert_eq!(untimed.time(), None);
        assert_eq!(untimed.permalink(), None);
    }

    #[test]
    fn test_empty_body_placeholder() {
        let msg = message(json!({"ts": "1.0", "user": "U1", "text": "  "}));
        assert_eq!(msg.msg(), EMPTY_MESSAGE_TEXT);

        let unknown_blocks = message(json!({
            "ts": "1.0", "user": "U1", "blocks": [{"type": "mystery"}]
        }));
        assert_eq!(unknown_blocks.msg(), EMPTY_MESSAGE_TEXT);
    }

    #[test]
    fn test_empty_blocks_fall_back_to_text() {
        let msg = message(json!({
            "ts": "1.0", "user": "U1", "text": "real text",
            "blocks": [{"type": "mystery"}]
        }));
        assert_eq!(msg.msg(), "real text");
    }

    #[test]
    fn test_blocks_win_over_text() {
        let msg = message(json!({
            "ts": "1.0", "user": "U1", "text": "fallback",
            "blocks": [{"type": "rich_text", "elements": [
                {"type": "rich_text_section", "elements": [
                    {"type": "text", "text": "from "},
                    {"type": "user", "user_id": "U2"}
                ]}
            ]}]
        }));
        assert_eq!(msg.msg(), "from <b>@bob</b>");
    }

    #[test]
    fn test_attachments_and_legacy_file() {
        let msg = message(json!({
            "ts": "1.0", "user": "U1",
            "attachments": [{"text": "unfurl", "title": "Page"}],
            "file": {"name": "a.png", "mimetype": "image/png"},
            "files": [{"name": "ignored"}]
        }));
        assert_eq!(msg.attachments().len(), 1);
        assert_eq!(msg.attachments()[0].kind(), AttachmentKind::Attachment);
        assert_eq!(msg.files().len(), 1);
        assert!(msg.files()[0].is_image());

        let bare = message(json!({"ts": "1.0", "user": "U1"}));
        assert!(bare.attachments().is_empty());
        assert!(bare.files().is_empty());
    }

    #[test]
    fn test_reactions() {
        let msg = message(json!({
            "ts": "1.0", "user": "U1",
            "reactions": [
                {"name": "thumbsup", "users": ["U1", "U404", "U2"], "count": 3},
                {"name": "partyparrot", "users": ["U2"]}
            ]
        }));
        let reactions = msg.reactions();
        assert_eq!(reactions[0].name, "👍");
        assert_eq!(reactions[0].usernames, vec!["Alice", "bob"]);
        assert_eq!(reactions[1].name, ":partyparrot:");
    }

    #[test]
    fn test_thread_reply_permalink() {
        let msg = message(json!({
            "ts": "110.000200", "user": "U1", "thread_ts": "105.000100"
        }));
        assert_eq!(
            msg.permalink(),
            Some("https://acme.slack.com/archives/C1/p110000200?thread_ts=105.000100&cid=C1")
        );

        let parent = message(json!({
            "ts": "105.000100", "user": "U1", "thread_ts": "105.000100"
        }));
        assert_eq!(
            parent.permalink(),
            Some("https://acme.slack.com/archives/C1/p105000100")
        );
    }

    #[test]
    fn test_into_thread_reply_is_idempotent() {
        let msg = message(json!({"ts": "1.0", "user": "U1", "text": "reply"}));
        let once = msg.clone().into_thread_reply(true);
        let twice = once.clone().into_thread_reply(true);
        assert_eq!(once.msg(), "<b>Thread Reply:</b> reply");
        assert_eq!(once, twice);
        assert!(once.is_thread_reply());

        let silent = msg.into_thread_reply(false);
        assert_eq!(silent.msg(), "reply");
        assert!(silent.is_thread_reply());
    }

    #[test]
    fn test_serializes_derived_fields() {
        let msg = message(json!({"ts": "1.0", "user": "U1", "text": "hi", "subtype": "me_message"}));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["username"], "Alice");
        assert_eq!(json["msg"], "hi");
        assert_eq!(json["subtype"], "me_message");
        assert!(json.get("raw").is_none());
    }
}
