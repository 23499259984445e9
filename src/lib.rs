//! # slackview
//!
//! A Rust library for turning an extracted Slack workspace export into
//! ordered, threaded, HTML-formatted conversation views.
//!
//! ## Overview
//!
//! An export holds one directory per conversation with one JSON file per
//! day. slackview loads those files, renders every message's Slack markup
//! (mentions, links, emoji, Markdown, rich-text blocks) to HTML, and moves
//! thread replies under their parent message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slackview::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = ViewerConfig::new().with_workspace("acme");
//!     let reader = ArchiveReader::new("export/", config)?;
//!
//!     let channels = reader.compile_channels()?;
//!     for message in channels.get("general").unwrap_or_default() {
//!         println!("{:?} {:?}: {}", message.time(), message.username(), message.msg());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`reader`] - [`ArchiveReader`](reader::ArchiveReader), the entry point
//! - [`message`] - [`Message`], one rendered record
//! - [`attachment`] - attachments and files of a message
//! - [`formatter`] - Slack markup to HTML
//!   - [`formatter::blocks`] - rich-text block rendering
//!   - [`formatter::emoji`] - shortcode conversion
//! - [`user`] - [`User`](user::User) and the shared [`UserDirectory`](user::UserDirectory)
//! - [`metadata`] - `channels.json`, `groups.json`, `dms.json`, `mpims.json`
//! - [`raw`] - serde types for day-file records
//! - [`core`] - thread reconstruction and filters
//! - [`output`] - whole-archive export
//! - [`config`] - [`ViewerConfig`](config::ViewerConfig)
//! - [`error`] - [`SlackviewError`], [`Result`]
//! - [`prelude`] - Convenient re-exports

pub mod attachment;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod formatter;
pub mod message;
pub mod metadata;
pub mod output;
pub mod raw;
pub mod reader;
pub mod user;

// Re-export the main types at the crate root for convenience
pub use error::{Result, SlackviewError};
pub use message::Message;

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use slackview::prelude::*;
/// ```
pub mod prelude {
    // Core message type
    pub use crate::Message;

    // Error types
    pub use crate::error::{Result, SlackviewError};

    // Loading
    pub use crate::config::ViewerConfig;
    pub use crate::reader::{ArchiveReader, Conversations, Membership};

    // Rendering
    pub use crate::attachment::{Attachment, AttachmentKind};
    pub use crate::formatter::{Formatter, ReferenceResolver, SlackFormatter, TextRenderer};
    pub use crate::user::{User, UserDirectory};

    // Threads and filtering
    pub use crate::core::filter::{FilterConfig, apply_filters};
    pub use crate::core::threads::build_threads;

    // Output
    pub use crate::output::ArchiveView;
    #[cfg(feature = "json-output")]
    pub use crate::output::{to_json, write_json};
}
