//! Emoji shortcode handling.
//!
//! Slack spells some shortcodes differently from the common gemoji set
//! (`:woman-shrugging:` vs `:woman_shrugging:`), so shortcodes are first
//! normalized and then expanded to unicode. Unknown shortcodes, including
//! workspace custom emoji, are left as they are.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

// The first character is kept as-is so `:-1:` survives normalization.
static SLACK_SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^\s<>/:])([^\s<>/:]+):").expect("valid regex"));

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z0-9_+\-]+):").expect("valid regex"));

/// Slack aliases with no gemoji equivalent.
const ALIASES: &[(&str, &str)] = &[(":simple_smile:", ":slightly_smiling_face:")];

/// Converts Slack-flavoured shortcodes to their gemoji spelling.
pub fn normalize_shortcodes(text: &str) -> String {
    let mut out = SLACK_SHORTCODE
        .replace_all(text, |caps: &Captures<'_>| {
            format!(":{}{}:", &caps[1], caps[2].replace('-', "_"))
        })
        .into_owned();
    for (from, to) in ALIASES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

/// Replaces every known `:shortcode:` with its unicode emoji.
pub fn emojize(text: &str) -> Cow<'_, str> {
    SHORTCODE.replace_all(text, |caps: &Captures<'_>| {
        emojis::get_by_shortcode(&caps[1])
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
}

/// Renders a bare shortcode name (as found in reactions) to unicode.
///
/// Falls back to the `:name:` form when the emoji is unknown.
pub fn shortcode_to_unicode(name: &str) -> String {
    let normalized = normalize_shortcodes(&format!(":{name}:"));
    emojize(&normalized).into_owned()
}

/// Decodes the `unicode` field of a rich-text emoji element
/// (`"1f44d"`, `"1f468-200d-1f4bb"`).
pub fn from_codepoints(hex: &str) -> Option<String> {
    hex.split('-')
        .map(|cp| u32::from_str_radix(cp, 16).ok().and_then(char::from_u32))
        .collect()
}
