//! Conversation metadata: `channels.json`, `groups.json`, `dms.json`, `mpims.json`.
//!
//! Every file is a JSON list of objects keyed by `id`. Channels, groups and
//! MPIMs carry a `name` that doubles as their directory name in the archive;
//! DMs have no name and are stored under their id. DMs and MPIMs also list
//! their `members`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlackviewError};

/// The four kinds of conversation an export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// Public channel
    Channel,
    /// Private channel
    Group,
    /// One-to-one direct message
    Dm,
    /// Multi-person direct message
    Mpim,
}

impl ConversationKind {
    /// Metadata file describing conversations of this kind.
    pub fn metadata_file(&self) -> &'static str {
        match self {
            ConversationKind::Channel => "channels.json",
            ConversationKind::Group => "groups.json",
            ConversationKind::Dm => "dms.json",
            ConversationKind::Mpim => "mpims.json",
        }
    }

    /// Only `channels.json` must be present in every export.
    pub fn is_required(&self) -> bool {
        matches!(self, ConversationKind::Channel)
    }

    /// DMs are the only conversations stored under their id.
    pub fn is_keyed_by_id(&self) -> bool {
        matches!(self, ConversationKind::Dm)
    }

    /// Returns `true` for conversations whose members are listed explicitly.
    pub fn has_members(&self) -> bool {
        matches!(self, ConversationKind::Dm | ConversationKind::Mpim)
    }

    pub fn all() -> &'static [ConversationKind] {
        &[
            ConversationKind::Channel,
            ConversationKind::Group,
            ConversationKind::Dm,
            ConversationKind::Mpim,
        ]
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::Channel => write!(f, "channel"),
            ConversationKind::Group => write!(f, "group"),
            ConversationKind::Dm => write!(f, "dm"),
            ConversationKind::Mpim => write!(f, "mpim"),
        }
    }
}

/// One entry of a conversation metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl ConversationInfo {
    /// Name of the archive directory holding this conversation's day files.
    pub fn directory_name(&self, kind: ConversationKind) -> &str {
        if kind.is_keyed_by_id() {
            &self.id
        } else {
            self.name.as_deref().unwrap_or(&self.id)
        }
    }
}

/// All conversations of one kind, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationIndex {
    kind: ConversationKind,
    entries: BTreeMap<String, ConversationInfo>,
}

impl ConversationIndex {
    /// Creates an index from a list of entries.
    pub fn new(kind: ConversationKind, entries: impl IntoIterator<Item = ConversationInfo>) -> Self {
        Self {
            kind,
            entries: entries.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// An index with no entries, used when an optional file is absent.
    pub fn empty(kind: ConversationKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Parses a metadata file's contents.
    pub fn from_json(kind: ConversationKind, content: &str) -> Result<Self> {
        let entries: Vec<ConversationInfo> = serde_json::from_str(content)
            .map_err(|e| SlackviewError::parse("conversation list", e, None))?;
        Ok(Self::new(kind, entries))
    }

    /// Loads the metadata file for `kind` from an archive directory.
    ///
    /// A missing optional file yields an empty index; a missing
    /// `channels.json` is an error.
    pub fn load(root: &Path, kind: ConversationKind) -> Result<Self> {
        let path = root.join(kind.metadata_file());
        if !path.is_file() {
            if kind.is_required() {
                return Err(SlackviewError::missing_file(kind.metadata_file(), path));
            }
            debug!(file = kind.metadata_file(), "optional metadata file absent");
            return Ok(Self::empty(kind));
        }
        let content = std::fs::read_to_string(&path)?;
        let entries: Vec<ConversationInfo> = serde_json::from_str(&content)
            .map_err(|e| SlackviewError::parse("conversation list", e, Some(path.clone())))?;
        Ok(Self::new(kind, entries))
    }

    pub fn kind(&self) -> ConversationKind {
        self.kind
    }

    pub fn get(&self, id: &str) -> Option<&ConversationInfo> {
        self.entries.get(id)
    }

    /// Display name of a conversation, if it has one.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(|c| c.name.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationInfo> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
