//! Whole-archive export.
//!
//! [`ArchiveView`] gathers every compiled conversation of an archive into one
//! serializable document: the structured counterpart of a single printable
//! export page. [`to_json`] and [`write_json`] (feature `json-output`) turn it
//! into pretty-printed JSON.

use std::collections::HashMap;

use serde::Serialize;

use crate::Message;
use crate::error::Result;
use crate::reader::{ArchiveReader, Conversations, Membership};

/// One conversation of the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    /// Directory name: channel name, or DM id
    pub name: String,

    /// Member-based label for DMs and MPIMs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub messages: Vec<Message>,
}

/// Every compiled conversation of an archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveView {
    pub channels: Vec<ConversationView>,
    pub groups: Vec<ConversationView>,
    pub dms: Vec<ConversationView>,
    pub mpims: Vec<ConversationView>,
}

impl ArchiveView {
    /// Compiles the archive. DMs and MPIMs are included only when the
    /// reader's configuration enables them.
    pub fn from_reader(reader: &ArchiveReader) -> Result<Self> {
        reader.warn_unmatched_hidden_channels();

        let mut view = Self {
            channels: plain(reader.compile_channels()?),
            groups: plain(reader.compile_groups()?),
            ..Self::default()
        };

        if reader.config().show_dms {
            let dms = reader.compile_dm_messages()?;
            let dm_users = reader.compile_dm_users(&dms)?;
            view.dms = labelled(dms, &dm_users);

            let mpims = reader.compile_mpim_messages()?;
            let mpim_users = reader.compile_mpim_users(&mpims)?;
            view.mpims = labelled(mpims, &mpim_users);
        }

        Ok(view)
    }

    /// Number of conversations across all kinds.
    pub fn conversation_count(&self) -> usize {
        self.channels.len() + self.groups.len() + self.dms.len() + self.mpims.len()
    }

    /// Number of messages across all conversations.
    pub fn message_count(&self) -> usize {
        [&self.channels, &self.groups, &self.dms, &self.mpims]
            .into_iter()
            .flatten()
            .map(|c| c.messages.len())
            .sum()
    }
}

fn plain(conversations: Conversations) -> Vec<ConversationView> {
    conversations
        .chats
        .into_iter()
        .map(|(name, messages)| ConversationView {
            name,
            label: None,
            messages,
        })
        .collect()
}

fn labelled(conversations: Conversations, members: &[Membership]) -> Vec<ConversationView> {
    let labels: HashMap<&str, String> = members
        .iter()
        .flat_map(|m| {
            let label = m.label();
            let mut keys = vec![(m.id.as_str(), label.clone())];
            if let Some(name) = m.name.as_deref() {
                keys.push((name, label));
            }
            keys
        })
        .collect();

    conversations
        .chats
        .into_iter()
        .map(|(name, messages)| ConversationView {
            label: labels.get(name.as_str()).cloned(),
            name,
            messages,
        })
        .collect()
}

/// Converts the view to pretty-printed JSON.
#[cfg(feature = "json-output")]
pub fn to_json(view: &ArchiveView) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Writes the view as pretty-printed JSON to `output_path`.
#[cfg(feature = "json-output")]
pub fn write_json(view: &ArchiveView, output_path: impl AsRef<std::path::Path>) -> Result<()> {
    use std::io::Write;

    let file = std::fs::File::create(output_path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, view)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
