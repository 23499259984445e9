//! Display options for loading an archive.
//!
//! [`ViewerConfig`] is a plain builder with no CLI framework dependencies; the
//! binary fills it from command-line flags, library users construct it
//! directly.
//!
//! # Example
//!
//! ```rust
//! use slackview::config::ViewerConfig;
//!
//! let config = ViewerConfig::new()
//!     .with_workspace("acme")
//!     .with_hide_channels(["random"])
//!     .with_skip_channel_member_change(true);
//!
//! assert_eq!(config.workspace, "acme");
//! assert!(config.is_hidden("random"));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::filter::FilterConfig;
use crate::error::Result;

/// Workspace name used in permalinks when none is configured.
pub const DEFAULT_WORKSPACE: &str = "slack";

/// Options controlling which conversations are compiled and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Workspace subdomain used in permalinks (default: "slack")
    pub workspace: String,

    /// Prefix thread replies with "Thread Reply:" (default: true)
    pub thread_note: bool,

    /// Only keep messages on or after this date, `YYYY-MM-DD` (default: none)
    pub since: Option<String>,

    /// Drop channel join and leave notices (default: false)
    pub skip_channel_member_change: bool,

    /// Channel names never compiled (default: empty)
    pub hide_channels: Vec<String>,

    /// When set, only these channels are compiled (default: all)
    pub channels: Option<Vec<String>>,

    /// Compile direct messages and MPIMs as well (default: false)
    pub show_dms: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            workspace: DEFAULT_WORKSPACE.to_string(),
            thread_note: true,
            since: None,
            skip_channel_member_change: false,
            hide_channels: Vec::new(),
            channels: None,
            show_dms: false,
        }
    }
}

impl ViewerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace subdomain used in permalinks.
    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Enables or disables the thread reply marker.
    #[must_use]
    pub fn with_thread_note(mut self, enabled: bool) -> Self {
        self.thread_note = enabled;
        self
    }

    /// Keeps only messages on or after `date` (`YYYY-MM-DD`).
    ///
    /// The date is validated when the archive is compiled.
    #[must_use]
    pub fn with_since(mut self, date: impl Into<String>) -> Self {
        self.since = Some(date.into());
        self
    }

    /// Sets whether channel join and leave notices are dropped.
    #[must_use]
    pub fn with_skip_channel_member_change(mut self, skip: bool) -> Self {
        self.skip_channel_member_change = skip;
        self
    }

    /// Sets the channels that are never compiled.
    #[must_use]
    pub fn with_hide_channels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hide_channels = names.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts compilation to the named channels.
    #[must_use]
    pub fn with_channels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets whether DMs and MPIMs are compiled.
    #[must_use]
    pub fn with_show_dms(mut self, show: bool) -> Self {
        self.show_dms = show;
        self
    }

    /// Returns `true` if the channel is in the hide list.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hide_channels.iter().any(|h| h == name)
    }

    /// Returns `true` if the channel passes the selection list.
    pub fn is_selected(&self, name: &str) -> bool {
        self.channels
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name))
    }

    /// Builds the message filter these options describe.
    ///
    /// # Errors
    ///
    /// Returns [`SlackviewError::InvalidDate`](crate::SlackviewError::InvalidDate)
    /// if `since` is not a `YYYY-MM-DD` date.
    pub fn filter_config(&self) -> Result<FilterConfig> {
        let mut filter =
            FilterConfig::new().with_skip_member_changes(self.skip_channel_member_change);
        if let Some(since) = &self.since {
            filter = filter.with_since(since)?;
        }
        Ok(filter)
    }
}

/// Splits a comma-separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
