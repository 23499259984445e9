//! Command-line interface definition using clap.
//!
//! [`Args`] describes the `slackview` binary's flags. Every flag can also be
//! set through a `SEV_*` environment variable, so the viewer can be
//! configured from a container environment.
//!
//! ```rust
//! use clap::Parser;
//! use slackview::cli::Args;
//!
//! let args = Args::parse_from(["slackview", "export/", "--hide-channels", "random,offtopic"]);
//! let config = args.viewer_config();
//! assert!(config.is_hidden("offtopic"));
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_WORKSPACE, ViewerConfig, split_list};

/// Render a Slack workspace export as ordered, threaded conversations.
#[derive(Parser, Debug, Clone)]
#[command(name = "slackview")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    slackview export/
    slackview export/ -o acme.json --workspace acme
    slackview export/ --show-dms --since 2024-01-01
    slackview export/ --channels general,dev --skip-channel-member-change")]
pub struct Args {
    /// Path to the extracted export directory
    #[arg(env = "SEV_ARCHIVE")]
    pub archive: PathBuf,

    /// Path to the output file
    #[arg(short, long, default_value = "slack_export.json", env = "SEV_OUTPUT")]
    pub output: PathBuf,

    /// Workspace subdomain used in permalinks
    #[arg(long, default_value = DEFAULT_WORKSPACE, env = "SEV_WORKSPACE")]
    pub workspace: String,

    /// Also export direct messages and group DMs
    #[arg(long, env = "SEV_SHOW_DMS")]
    pub show_dms: bool,

    /// Do not prefix thread replies with "Thread Reply:"
    #[arg(long, env = "SEV_NO_THREAD_NOTE")]
    pub no_thread_note: bool,

    /// Only show messages since this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", env = "SEV_SINCE")]
    pub since: Option<String>,

    /// Hide channel join and leave messages
    #[arg(long, env = "SEV_SKIP_CHANNEL_MEMBER_CHANGE")]
    pub skip_channel_member_change: bool,

    /// Comma separated list of channels to hide
    #[arg(long, value_name = "NAMES", env = "SEV_HIDE_CHANNELS")]
    pub hide_channels: Option<String>,

    /// Comma separated list of channels to export (default: all)
    #[arg(long, value_name = "NAMES", env = "SEV_CHANNELS")]
    pub channels: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "SEV_DEBUG")]
    pub debug: bool,
}

impl Args {
    /// Builds the library configuration from the parsed flags.
    pub fn viewer_config(&self) -> ViewerConfig {
        let mut config = ViewerConfig::new()
            .with_workspace(self.workspace.clone())
            .with_thread_note(!self.no_thread_note)
            .with_skip_channel_member_change(self.skip_channel_member_change)
            .with_show_dms(self.show_dms);

        if let Some(since) = &self.since {
            config = config.with_since(since.clone());
        }
        if let Some(hide) = &self.hide_channels {
            config = config.with_hide_channels(split_list(hide));
        }
        if let Some(channels) = &self.channels {
            config = config.with_channels(split_list(channels));
        }
        config
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "slackview=debug"
        } else {
            "slackview=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["slackview", "export"]);
        assert_eq!(args.output, PathBuf::from("slack_export.json"));
        assert_eq!(args.workspace, "slack");

        let config = args.viewer_config();
        assert!(config.thread_note);
        assert!(!config.show_dms);
        assert!(config.channels.is_none());
        assert_eq!(args.log_filter(), "slackview=info");
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "slackview",
            "export",
            "-o",
            "out.json",
            "--workspace",
            "acme",
            "--show-dms",
            "--no-thread-note",
            "--since",
            "2024-01-01",
            "--skip-channel-member-change",
            "--channels",
            "general,dev",
            "--debug",
        ]);
        let config = args.viewer_config();
        assert_eq!(config.workspace, "acme");
        assert!(config.show_dms);
        assert!(!config.thread_note);
        assert_eq!(config.since.as_deref(), Some("2024-01-01"));
        assert!(config.skip_channel_member_change);
        assert!(config.is_selected("dev"));
        assert!(!config.is_selected("random"));
        assert_eq!(args.log_filter(), "slackview=debug");
    }

    #[test]
    fn test_archive_required() {
        assert!(Args::try_parse_from(["slackview"]).is_err());
    }
}
