//! Slack markup to HTML.
//!
//! The formatter turns Slack's message markup into HTML fragments. It is
//! split into two capabilities so records depend only on what they use:
//!
//! - [`TextRenderer`] renders a piece of raw text;
//! - [`ReferenceResolver`] turns user and channel ids into names.
//!
//! [`SlackFormatter`] implements both on top of a shared
//! [`UserDirectory`] and the archive's conversation metadata.
//!
//! # Rendering pipeline
//!
//! The stages run in a fixed order, since each stage's pattern would be
//! broken by the output of a later one:
//!
//! 1. `<!channel>`, `<!here>`, `<!everyone>` become plain `@` text
//! 2. emoji shortcodes are normalized to the gemoji spelling
//! 3. `<@U…>` and `<#C…>` references become bold names
//! 4. `<http…|title>` links become anchors
//! 5. standalone `#hashtags` become bold
//! 6. emoji shortcodes become unicode
//! 7. optionally, Markdown (single `*` spans are promoted to bold first)
//! 8. blank lines in front of lists are dropped
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use slackview::formatter::{SlackFormatter, TextRenderer};
//! use slackview::metadata::{ConversationIndex, ConversationKind};
//! use slackview::user::{User, UserDirectory};
//!
//! let users = Arc::new(UserDirectory::new(vec![User::new("U1", "alice")]));
//! let channels = Arc::new(ConversationIndex::empty(ConversationKind::Channel));
//! let formatter = SlackFormatter::new(users, channels);
//!
//! let html = formatter.render("hi <@U1>", true);
//! assert_eq!(html, "hi <b>@alice</b>");
//! ```

pub mod blocks;
pub mod emoji;

use std::sync::{Arc, LazyLock};

use pulldown_cmark::{Options, Parser, html};
use regex::{Captures, Regex};
use tracing::debug;

use crate::metadata::ConversationIndex;
use crate::raw::RawMessage;
use crate::user::{User, UserDirectory};

static SPECIAL_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!(channel|here|everyone)(?:\|[^>]*)?>").expect("valid regex")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([@#])([A-Z0-9][A-Za-z0-9_]*)(?:\|([^>]*))?>").expect("valid regex")
});

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<((?:https?|mailto):[^|>\s]+)(?:\|([^>]+))?>").expect("valid regex")
});

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^| )(#[A-Za-z][\w.\-]+)( |$)").expect("valid regex")
});

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\*+)([^*\s](?:[^*\n]*[^*\s])?)(\*+)").expect("valid regex")
});

/// Renders raw Slack text to HTML.
pub trait TextRenderer {
    /// Renders `text`; Markdown is applied only when `markdown` is set.
    fn render(&self, text: &str, markdown: bool) -> String;
}

/// Resolves user and channel ids found in messages.
pub trait ReferenceResolver {
    /// Looks up a user or bot by id.
    fn resolve_user(&self, id: &str) -> Option<Arc<User>>;

    /// Looks up the display name of a channel (or other conversation) by id.
    fn resolve_channel(&self, id: &str) -> Option<String>;

    /// Resolves the author of a raw message.
    ///
    /// The default looks up `user`, then `bot_id`.
    fn find_author(&self, message: &RawMessage) -> Option<Arc<User>> {
        let id = message.user.as_deref().or(message.bot_id.as_deref())?;
        self.resolve_user(id)
    }
}

/// Everything a message record needs from its formatter.
pub trait Formatter: TextRenderer + ReferenceResolver {}

impl<T: TextRenderer + ReferenceResolver + ?Sized> Formatter for T {}

/// Formatter backed by an archive's user directory and conversation metadata.
#[derive(Debug, Clone)]
pub struct SlackFormatter {
    users: Arc<UserDirectory>,
    channels: Arc<ConversationIndex>,
    conversations: Option<Arc<ConversationIndex>>,
}

impl SlackFormatter {
    /// Creates a formatter resolving channel references against `channels`.
    pub fn new(users: Arc<UserDirectory>, channels: Arc<ConversationIndex>) -> Self {
        Self {
            users,
            channels,
            conversations: None,
        }
    }

    /// Also resolves references against the conversations being rendered
    /// (groups, DMs, MPIMs).
    #[must_use]
    pub fn with_conversations(mut self, conversations: Arc<ConversationIndex>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Runs the full pipeline over `text`.
    pub fn render_text(&self, text: &str, process_markdown: bool) -> String {
        let text = SPECIAL_MENTION.replace_all(text, "@$1");
        let text = emoji::normalize_shortcodes(&text);
        let text = REFERENCE.replace_all(&text, |caps: &Captures<'_>| self.sub_reference(caps));
        let text = LINK.replace_all(&text, |caps: &Captures<'_>| sub_hyperlink(caps));
        let text = HASHTAG.replace_all(&text, "$1<b>$2</b>$3");
        let text = emoji::emojize(&text);

        let text = if process_markdown {
            render_markdown(&promote_emphasis(&text))
        } else {
            text.into_owned()
        };

        text.replace("\n\n<ul>", "<ul>")
            .replace("\n\n<ol>", "<ol>")
            .replace("\n<li>", "<li>")
    }

    fn sub_reference(&self, caps: &Captures<'_>) -> String {
        let sigil = &caps[1];
        let id = &caps[2];
        let label = caps
            .get(3)
            .map(|m| m.as_str().trim_start_matches(sigil))
            .filter(|l| !l.is_empty());

        let name = match label {
            Some(label) => label.to_string(),
            None if sigil == "#" => self.resolve_channel(id).unwrap_or_else(|| {
                debug!(channel_id = id, "unresolved channel reference");
                id.to_string()
            }),
            None => self
                .resolve_user(id)
                .and_then(|u| u.display_name().map(str::to_string))
                .unwrap_or_else(|| {
                    debug!(user_id = id, "unresolved user mention");
                    id.to_string()
                }),
        };
        format!("<b>{sigil}{name}</b>")
    }
}

impl TextRenderer for SlackFormatter {
    fn render(&self, text: &str, markdown: bool) -> String {
        self.render_text(text, markdown)
    }
}

impl ReferenceResolver for SlackFormatter {
    fn resolve_user(&self, id: &str) -> Option<Arc<User>> {
        self.users.get(id)
    }

    fn resolve_channel(&self, id: &str) -> Option<String> {
        self.channels
            .name_of(id)
            .or_else(|| self.conversations.as_ref().and_then(|c| c.name_of(id)))
            .map(str::to_string)
    }

    fn find_author(&self, message: &RawMessage) -> Option<Arc<User>> {
        self.users.find_author(message)
    }
}

fn sub_hyperlink(caps: &Captures<'_>) -> String {
    let url = &caps[1];
    let title = caps.get(2).map_or(url, |m| m.as_str());
    format!("<a href=\"{url}\">{title}</a>")
}

/// Slack's `*bold*` is Markdown's `**bold**`; longer runs are left alone.
/// Text inside backtick code spans and fences is copied unchanged.
fn promote_emphasis(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let fence = rest[open..].len() - rest[open..].trim_start_matches('`').len();
        let body = &rest[open + fence..];
        let Some(close) = closing_fence(body, fence) else {
            break;
        };
        out.push_str(&promote_plain(&rest[..open]));
        let end = open + fence + close + fence;
        out.push_str(&rest[open..end]);
        rest = &rest[end..];
    }
    out.push_str(&promote_plain(rest));
    out
}

/// Offset of the next run of exactly `len` backticks in `body`.
fn closing_fence(body: &str, len: usize) -> Option<usize> {
    let mut offset = 0;
    while let Some(start) = body[offset..].find('`') {
        let start = offset + start;
        let run = body[start..].len() - body[start..].trim_start_matches('`').len();
        if run == len {
            return Some(start);
        }
        offset = start + run;
    }
    None
}

fn promote_plain(text: &str) -> String {
    EMPHASIS
        .replace_all(text, |caps: &Captures<'_>| {
            if caps[1].len() == 1 && caps[3].len() == 1 {
                format!("**{}**", &caps[2])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Indents runs of `>>>` lines so they render as code blocks.
fn shell_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_block = false;
    for line in text.lines() {
        if line.starts_with(">>>") || (in_block && !line.trim().is_empty()) {
            if !in_block {
                out.push('\n');
                in_block = true;
            }
            out.push_str("    ");
        } else {
            in_block = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn render_markdown(text: &str) -> String {
    let source = if text.contains(">>>") {
        shell_blocks(text)
    } else {
        text.to_string()
    };

    let parser = Parser::new_ext(&source, Options::empty());
    let mut rendered = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut rendered, parser);

    strip_paragraph(rendered.trim()).to_string()
}

/// Removes a `<p>` wrapper when it is the only top-level block.
fn strip_paragraph(html: &str) -> &str {
    html.strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
        .filter(|inner| !inner.contains("<p>"))
        .unwrap_or(html)
}
