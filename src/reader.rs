//! Loading conversations from an extracted export.
//!
//! An export directory looks like this:
//!
//! ```text
//! archive/
//! ├── users.json
//! ├── channels.json
//! ├── groups.json        (optional)
//! ├── dms.json           (optional)
//! ├── mpims.json         (optional)
//! ├── general/
//! │   ├── 2024-01-01.json
//! │   └── 2024-01-02.json
//! └── D0123ABCD/
//!     └── 2024-01-01.json
//! ```
//!
//! [`ArchiveReader`] loads the metadata once and compiles each kind of
//! conversation on demand. Every conversation goes through the same
//! pipeline:
//!
//! 1. collect the `*.json` day files directly inside its directory
//! 2. concatenate their records in file-name order and sort them by timestamp
//! 3. render each record into a [`Message`]
//! 4. move thread replies under their parents
//! 5. apply the configured filters

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::Message;
use crate::config::ViewerConfig;
use crate::core::filter::{FilterConfig, apply_filters};
use crate::core::threads::build_threads;
use crate::error::{Result, SlackviewError};
use crate::formatter::SlackFormatter;
use crate::metadata::{ConversationIndex, ConversationInfo, ConversationKind};
use crate::raw::RawMessage;
use crate::user::{User, UserDirectory};

/// Rendered conversations of one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversations {
    /// Messages per conversation, keyed by directory name
    /// (channel name, or DM id).
    pub chats: BTreeMap<String, Vec<Message>>,

    /// Conversations whose directory held no day files.
    pub empty: BTreeSet<String>,
}

impl Conversations {
    pub fn get(&self, name: &str) -> Option<&[Message]> {
        self.chats.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Total number of messages across all conversations.
    pub fn message_count(&self) -> usize {
        self.chats.values().map(Vec::len).sum()
    }
}

/// The resolved members of a DM or MPIM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub kind: ConversationKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub users: Vec<Arc<User>>,
}

impl Membership {
    /// Human-readable label for navigation.
    ///
    /// A DM is labelled by its first member, an MPIM by all of its members
    /// joined with `", "`. Falls back to the conversation name or id.
    pub fn label(&self) -> String {
        let names: Vec<&str> = self.users.iter().filter_map(|u| u.display_name()).collect();
        let label = match self.kind {
            ConversationKind::Dm => names.first().map(|n| (*n).to_string()),
            _ if names.is_empty() => None,
            _ => Some(names.join(", ")),
        };
        label
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Reads an extracted export directory.
///
/// # Example
///
/// ```rust,no_run
/// use slackview::config::ViewerConfig;
/// use slackview::reader::ArchiveReader;
///
/// # fn main() -> slackview::Result<()> {
/// let reader = ArchiveReader::new("export/", ViewerConfig::new().with_workspace("acme"))?;
/// let channels = reader.compile_channels()?;
/// for (name, messages) in &channels.chats {
///     println!("#{name}: {} messages", messages.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArchiveReader {
    root: PathBuf,
    config: ViewerConfig,
    filter: FilterConfig,
    users: Arc<UserDirectory>,
    channels: Arc<ConversationIndex>,
}

impl ArchiveReader {
    /// Opens an archive, loading `users.json` and `channels.json`.
    ///
    /// # Errors
    ///
    /// Fails if either file is missing or unparseable, or if the
    /// configuration's `since` date is invalid.
    pub fn new(root: impl Into<PathBuf>, config: ViewerConfig) -> Result<Self> {
        let root = root.into();
        let filter = config.filter_config()?;
        let users = UserDirectory::from_file(&root.join("users.json"))?;
        let channels = ConversationIndex::load(&root, ConversationKind::Channel)?;
        info!(
            root = %root.display(),
            users = users.len(),
            channels = channels.len(),
            "opened archive"
        );

        Ok(Self {
            root,
            config,
            filter,
            users: Arc::new(users),
            channels: Arc::new(channels),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    pub fn channels(&self) -> &ConversationIndex {
        &self.channels
    }

    // =========================================================================
    // Conversations
    // =========================================================================

    /// Compiles public channels, honoring the selection and hide lists.
    pub fn compile_channels(&self) -> Result<Conversations> {
        let selected: Vec<&ConversationInfo> = self
            .channels
            .iter()
            .filter(|c| {
                let name = c.directory_name(ConversationKind::Channel);
                self.config.is_selected(name) && !self.config.is_hidden(name)
            })
            .collect();
        let formatter = SlackFormatter::new(Arc::clone(&self.users), Arc::clone(&self.channels));
        self.create_messages(ConversationKind::Channel, &selected, &formatter)
    }

    /// Compiles private channels from `groups.json`.
    pub fn compile_groups(&self) -> Result<Conversations> {
        self.compile_kind(ConversationKind::Group)
    }

    /// Compiles direct messages from `dms.json`.
    ///
    /// DMs without day files are recorded in [`Conversations::empty`].
    pub fn compile_dm_messages(&self) -> Result<Conversations> {
        self.compile_kind(ConversationKind::Dm)
    }

    /// Compiles multi-person direct messages from `mpims.json`.
    pub fn compile_mpim_messages(&self) -> Result<Conversations> {
        self.compile_kind(ConversationKind::Mpim)
    }

    fn compile_kind(&self, kind: ConversationKind) -> Result<Conversations> {
        let index = Arc::new(ConversationIndex::load(&self.root, kind)?);
        let infos: Vec<&ConversationInfo> = index.iter().collect();
        let formatter = SlackFormatter::new(Arc::clone(&self.users), Arc::clone(&self.channels))
            .with_conversations(Arc::clone(&index));
        self.create_messages(kind, &infos, &formatter)
    }

    fn create_messages(
        &self,
        kind: ConversationKind,
        infos: &[&ConversationInfo],
        formatter: &SlackFormatter,
    ) -> Result<Conversations> {
        let mut conversations = Conversations::default();

        for info in infos {
            let name = info.directory_name(kind);
            let Some(raw) = load_day_files(&self.root.join(name))? else {
                debug!(%kind, name, "no day files");
                if kind.has_members() {
                    conversations.empty.insert(name.to_string());
                }
                continue;
            };

            let messages: Vec<Message> = raw
                .into_iter()
                .map(|r| Message::new(formatter, r, &info.id, &self.config.workspace))
                .collect();
            let messages = build_threads(messages, self.config.thread_note);
            let messages = apply_filters(messages, &self.filter);

            debug!(%kind, name, count = messages.len(), "compiled conversation");
            conversations.chats.insert(name.to_string(), messages);
        }

        info!(
            %kind,
            conversations = conversations.len(),
            messages = conversations.message_count(),
            empty = conversations.empty.len(),
            "compiled"
        );
        Ok(conversations)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Resolves the members of every non-empty DM.
    ///
    /// `dms` is the result of [`compile_dm_messages`](Self::compile_dm_messages);
    /// DMs it found empty are skipped. Members missing from `users.json` are
    /// replaced by deleted-user placeholders.
    pub fn compile_dm_users(&self, dms: &Conversations) -> Result<Vec<Membership>> {
        self.memberships(ConversationKind::Dm, dms)
    }

    /// Resolves the members of every non-empty MPIM.
    pub fn compile_mpim_users(&self, mpims: &Conversations) -> Result<Vec<Membership>> {
        self.memberships(ConversationKind::Mpim, mpims)
    }

    fn memberships(&self, kind: ConversationKind, compiled: &Conversations) -> Result<Vec<Membership>> {
        let index = ConversationIndex::load(&self.root, kind)?;
        Ok(index
            .iter()
            .filter(|info| !compiled.empty.contains(info.directory_name(kind)))
            .map(|info| Membership {
                kind,
                id: info.id.clone(),
                name: info.name.clone(),
                users: info.members.iter().map(|m| self.users.member(m)).collect(),
            })
            .collect())
    }

    /// Returns the hidden channel names that match no channel, warning about
    /// each of them.
    pub fn warn_unmatched_hidden_channels(&self) -> Vec<String> {
        let unmatched: Vec<String> = self
            .config
            .hide_channels
            .iter()
            .filter(|hidden| {
                !self
                    .channels
                    .iter()
                    .any(|c| c.directory_name(ConversationKind::Channel) == hidden.as_str())
            })
            .cloned()
            .collect();
        for name in &unmatched {
            warn!(channel = %name, "hidden channel not found in archive");
        }
        unmatched
    }
}

/// Loads every record of a conversation directory in chronological order.
///
/// Returns `None` when the directory is missing or holds no day files.
fn load_day_files(dir: &Path) -> Result<Option<Vec<RawMessage>>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut day_files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    if day_files.is_empty() {
        return Ok(None);
    }
    day_files.sort();

    let mut messages = Vec::new();
    for path in &day_files {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| SlackviewError::parse("day file", e, Some(path.clone())))?;
        let Value::Array(entries) = value else {
            return Err(SlackviewError::invalid_format(
                "day file",
                format!("{} is not a list of messages", path.display()),
            ));
        };
        messages.extend(entries.into_iter().map(RawMessage::from_value));
    }

    // Stable, so records sharing a timestamp keep their file order.
    messages.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    Ok(Some(messages))
}
