//! Raw day-file records.
//!
//! Slack exports store each conversation as one JSON file per day, each file
//! a list of message objects. [`RawMessage`] keeps the fields the viewer
//! understands and leaves everything else (blocks, attachments, files) as
//! loosely-typed JSON, because those structures vary between Slack versions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Deserializes a field, falling back to its default when the JSON value has
/// an unexpected type (including `null`).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, "ignoring malformed field");
        T::default()
    }))
}

/// Like [`lenient`] for lists, but drops only the malformed elements.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// `{user, ts}` pointer from a thread parent to one of its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    #[serde(default, deserialize_with = "lenient")]
    pub user: String,
    #[serde(default, deserialize_with = "lenient")]
    pub ts: String,
}

/// An emoji reaction on a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReaction {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub users: Vec<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// One message object from a day file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Timestamp string, `seconds.microseconds`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,

    /// `<URL|Name>` pair some bot messages carry.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bot_link: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Value>,

    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Map<String, Value>>,

    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Map<String, Value>>,

    /// Single-file form used by older exports.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub file: Option<Map<String, Value>>,

    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<RawReaction>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<ReplyRef>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl RawMessage {
    /// Converts one element of a day file.
    ///
    /// Elements that are not objects are logged and replaced by an empty
    /// record so the rest of the conversation still loads. A known field with
    /// the wrong JSON type falls back to its default and the rest of the
    /// record is kept.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            error!(%value, "day file entry is not an object");
            return Self::default();
        }
        match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "malformed message record");
                Self::default()
            }
        }
    }

    /// Numeric timestamp used for chronological ordering; `0.0` when absent
    /// or unparseable.
    pub fn sort_key(&self) -> f64 {
        self.ts
            .as_deref()
            .and_then(|ts| ts.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Returns `true` for bot-generated events (`bot_message`, `bot_add`, ...).
    pub fn is_bot_event(&self) -> bool {
        self.subtype
            .as_deref()
            .is_some_and(|s| s.starts_with("bot_"))
    }

    /// Returns `true` if this message is the parent of a thread.
    pub fn has_thread(&self) -> bool {
        self.reply_count.is_some() || !self.replies.is_empty()
    }

    /// Returns `true` if this message is a reply inside a thread.
    pub fn is_thread_reply(&self) -> bool {
        self.thread_ts
            .as_deref()
            .is_some_and(|thread| Some(thread) != self.ts.as_deref())
    }
}
