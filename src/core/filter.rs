//! Filter rendered messages by date and subtype.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] for filtering a conversation's messages. Filters run
//! after thread reconstruction, so a filtered-out parent does not drag its
//! replies back to their chronological position.
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Since | [`with_since`](FilterConfig::with_since) | Messages on or after a local date |
//! | Member changes | [`with_skip_member_changes`](FilterConfig::with_skip_member_changes) | Drops join/leave notices |
//!
//! # Example
//!
//! ```
//! use slackview::core::filter::FilterConfig;
//!
//! # fn main() -> slackview::Result<()> {
//! let config = FilterConfig::new()
//!     .with_since("2024-06-01")?
//!     .with_skip_member_changes(true);
//! assert!(config.is_active());
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - `since` is interpreted as local midnight, matching the local times shown
//!   on messages
//! - Messages without timestamps are **excluded** when `since` is set
//! - Multiple filters are combined with AND logic

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::Message;
use crate::error::SlackviewError;

/// Subtypes Slack uses for channel join and leave notices.
pub const MEMBER_CHANGE_SUBTYPES: [&str; 2] = ["channel_join", "channel_leave"];

/// Configuration for filtering messages.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Include only messages on or after this instant.
    pub after: Option<DateTime<Utc>>,

    /// Drop `channel_join` / `channel_leave` notices.
    pub skip_member_changes: bool,
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    ///
    /// No filters are active by default; all messages pass through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only messages sent on or after `date` (`YYYY-MM-DD`, local time).
    ///
    /// # Errors
    ///
    /// Returns [`SlackviewError::InvalidDate`] if the format is invalid.
    pub fn with_since(mut self, date_str: &str) -> Result<Self, SlackviewError> {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| SlackviewError::invalid_date(date_str))?;
        self.after = Some(local_midnight(date));
        Ok(self)
    }

    /// Sets the start instant directly.
    #[must_use]
    pub fn with_after(mut self, dt: DateTime<Utc>) -> Self {
        self.after = Some(dt);
        self
    }

    /// Drops channel join and leave notices when `skip` is set.
    #[must_use]
    pub fn with_skip_member_changes(mut self, skip: bool) -> Self {
        self.skip_member_changes = skip;
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.skip_member_changes
    }

    /// Returns `true` if `message` passes every active filter.
    pub fn accepts(&self, message: &Message) -> bool {
        if self.skip_member_changes
            && message
                .subtype()
                .is_some_and(|s| MEMBER_CHANGE_SUBTYPES.contains(&s))
        {
            return false;
        }

        if let Some(after) = self.after {
            // No timestamp - exclude from date-filtered results
            let Some(ts) = message.ts() else {
                return false;
            };
            return message_seconds(ts).is_some_and(|secs| secs >= after.timestamp());
        }

        true
    }
}

/// Start of `date` in the local timezone.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn message_seconds(ts: &str) -> Option<i64> {
    ts.split('.').next()?.parse().ok()
}

/// Filters a conversation's messages based on the provided configuration.
///
/// Returns a new vector containing only messages that match all active
/// filters. If no filters are active, returns the original messages unchanged.
pub fn apply_filters(messages: Vec<Message>, config: &FilterConfig) -> Vec<Message> {
    if !config.is_active() {
        return messages;
    }

    messages
        .into_iter()
        .filter(|msg| config.accepts(msg))
        .collect()
}
