//! Message attachments and uploaded files.
//!
//! Entries of a message's `attachments` and `files` arrays are wrapped in
//! [`Attachment`]. Text-bearing fields (`pretext`, `text`, `footer`, and the
//! values of `fields`) are rendered through the formatter when the record
//! is built; Markdown is applied to a field only if the entry's `mrkdwn_in`
//! list names it. Everything else is returned exactly as exported.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::formatter::TextRenderer;

/// Thumbnail size used when the caller does not ask for one.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 360;

const TEXT_FIELDS: [&str; 3] = ["pretext", "text", "footer"];

/// Where the wrapped entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentKind {
    /// Entry of the `attachments` array (link unfurls, bot cards)
    Attachment,
    /// Entry of the `files` array, or the legacy `file` field
    File,
}

/// A resolved thumbnail image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    pub src: String,
    pub width: Option<Value>,
    pub height: Option<Value>,
}

/// One entry of an attachment's `fields` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub short: bool,
    /// Rendered HTML
    pub value: String,
}

/// An attachment or file with its text fields rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    kind: AttachmentKind,
    raw: Map<String, Value>,
    rendered: BTreeMap<&'static str, String>,
    fields: Vec<AttachmentField>,
}

fn markdown_fields(raw: &Map<String, Value>) -> Vec<&str> {
    raw.get("mrkdwn_in")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

impl Attachment {
    /// Wraps a raw entry, rendering its text fields with `renderer`.
    pub fn new<R>(kind: AttachmentKind, raw: Map<String, Value>, renderer: &R) -> Self
    where
        R: TextRenderer + ?Sized,
    {
        let markdown_in = markdown_fields(&raw);

        let rendered = TEXT_FIELDS
            .iter()
            .filter_map(|&key| {
                let content = raw.get(key)?.as_str().filter(|s| !s.is_empty())?;
                let markdown = markdown_in.contains(&key);
                Some((key, renderer.render(content, markdown)))
            })
            .collect();

        let fields_markdown = markdown_in.contains(&"fields");
        let fields: Vec<AttachmentField> = raw
            .get("fields")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| AttachmentField {
                        title: entry
                            .get("title")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        short: entry.get("short").and_then(Value::as_bool).unwrap_or(false),
                        value: renderer.render(
                            entry.get("value").and_then(Value::as_str).unwrap_or_default(),
                            fields_markdown,
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if !fields.is_empty() {
            debug!(count = fields.len(), markdown = fields_markdown, "rendered attachment fields");
        }

        Self {
            kind,
            raw,
            rendered,
            fields,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    /// Returns a field by name.
    ///
    /// `pretext`, `text` and `footer` come back rendered; every other key is
    /// the raw exported value.
    pub fn get(&self, key: &str) -> Option<Cow<'_, Value>> {
        if let Some(html) = self.rendered.get(key) {
            return Some(Cow::Owned(Value::String(html.clone())));
        }
        self.raw.get(key).map(Cow::Borrowed)
    }

    /// Rendered HTML of a text field, if present.
    pub fn text_field(&self, key: &str) -> Option<&str> {
        self.rendered.get(key).map(String::as_str)
    }

    /// Raw string value of any field.
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    /// The `fields` list, with values rendered.
    pub fn fields(&self) -> &[AttachmentField] {
        &self.fields
    }

    /// Returns `true` if the entry's mimetype is an image type.
    pub fn is_image(&self) -> bool {
        self.raw_str("mimetype")
            .is_some_and(|m| m.starts_with("image/"))
    }

    /// Link to the original content: `from_url`, else `url_private`.
    pub fn link(&self) -> Option<&str> {
        self.raw_str("from_url").or_else(|| self.raw_str("url_private"))
    }

    /// Picks a thumbnail of about `size` pixels.
    ///
    /// Unfurled attachments carry an explicit `image_url`, which wins.
    /// Files are tried for `thumb_{size}`, then `thumb_{filetype}`, then
    /// the lexicographically first other `thumb_*` key.
    pub fn thumbnail(&self, size: Option<u32>) -> Option<Thumbnail> {
        if let Some(src) = self.raw_str("image_url") {
            return Some(Thumbnail {
                src: src.to_string(),
                width: self.raw.get("image_width").cloned(),
                height: self.raw.get("image_height").cloned(),
            });
        }

        let title = self.raw_str("title").unwrap_or_default();
        let size = size.unwrap_or(DEFAULT_THUMBNAIL_SIZE);
        let sized = format!("thumb_{size}");
        let by_filetype = self.raw_str("filetype").map(|ft| format!("thumb_{ft}"));

        let key = if self.raw.contains_key(&sized) {
            sized
        } else if let Some(key) = by_filetype.filter(|k| self.raw.contains_key(k)) {
            key
        } else {
            let Some(fallback) = self
                .raw
                .keys()
                .filter(|k| k.starts_with("thumb_") && !k.ends_with("_w") && !k.ends_with("_h"))
                .filter(|k| self.raw.get(k.as_str()).is_some_and(Value::is_string))
                .min()
            else {
                info!(title, "no thumbnail found");
                return None;
            };
            info!(key = %fallback, title, "fell back to thumbnail key");
            fallback.clone()
        };

        match self.raw_str(&key) {
            Some(src) => Some(Thumbnail {
                src: src.to_string(),
                width: self.raw.get(&format!("{key}_w")).cloned(),
                height: self.raw.get(&format!("{key}_h")).cloned(),
            }),
            None => {
                info!(title, "no thumbnail found");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Marks what was rendered and whether Markdown was on.
    struct Marker;

    impl TextRenderer for Marker {
        fn render(&self, text: &str, markdown: bool) -> String {
            if markdown {
                format!("md({text})")
            } else {
                format!("plain({text})")
            }
        }
    }

    fn attachment(kind: AttachmentKind, value: Value) -> Attachment {
        let Value::Object(map) = value else {
            panic!("expected object")
        };
        Attachment::new(kind, map, &Marker)
    }

    #[test]
    fn test_text_fields_follow_mrkdwn_in() {
        let a = attachment(
            AttachmentKind::Attachment,
            json!({
                "pretext": "pre", "text": "body", "footer": "foot",
                "title": "Title", "mrkdwn_in": ["text"]
            }),
        );
        assert_eq!(a.text_field("text"), Some("md(body)"));
        assert_eq!(a.text_field("pretext"), Some("plain(pre)"));
        assert_eq!(a.text_field("footer"), Some("plain(foot)"));
        assert_eq!(a.get("title").unwrap().as_str(), Some("Title"));
        assert_eq!(a.get("text").unwrap().as_str(), Some("md(body)"));
        assert!(a.get("missing").is_none());
    }

    #[test]
    fn test_fields_rendering() {
        let a = attachment(
            AttachmentKind::Attachment,
            json!({
                "fields": [
                    {"title": "Priority", "value": "*high*", "short": true},
                    {"title": "Owner", "value": "bob"}
                ],
                "mrkdwn_in": ["fields"]
            }),
        );
        let fields = a.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].title, "Priority");
        assert!(fields[0].short);
        assert_eq!(fields[0].value, "md(*high*)");
        assert!(!fields[1].short);
    }

    #[test]
    fn test_thumbnail_prefers_image_url() {
        let a = attachment(
            AttachmentKind::Attachment,
            json!({"image_url": "http://i/a.png", "image_width": 10, "image_height": 20,
                   "thumb_360": "http://t/360"}),
        );
        let thumb = a.thumbnail(None).unwrap();
        assert_eq!(thumb.src, "http://i/a.png");
        assert_eq!(thumb.width, Some(json!(10)));
    }

    #[test]
    fn test_thumbnail_size_then_filetype_then_any() {
        let sized = attachment(
            AttachmentKind::File,
            json!({"thumb_360": "http://t/360", "thumb_360_w": 360, "thumb_360_h": 200,
                   "thumb_pdf": "http://t/pdf"}),
        );
        let t = sized.thumbnail(None).unwrap();
        assert_eq!(t.src, "http://t/360");
        assert_eq!(t.height, Some(json!(200)));

        let by_type = attachment(
            AttachmentKind::File,
            json!({"filetype": "pdf", "thumb_pdf": "http://t/pdf", "thumb_64": "http://t/64"}),
        );
        assert_eq!(by_type.thumbnail(Some(360)).unwrap().src, "http://t/pdf");

        let any = attachment(
            AttachmentKind::File,
            json!({"thumb_80": "http://t/80", "thumb_64": "http://t/64", "thumb_64_w": 64}),
        );
        assert_eq!(any.thumbnail(None).unwrap().src, "http://t/64");
    }

    #[test]
    fn test_no_thumbnail() {
        let a = attachment(AttachmentKind::File, json!({"title": "notes.txt"}));
        assert!(a.thumbnail(None).is_none());

        let sizes_only = attachment(
            AttachmentKind::File,
            json!({"title": "scan.pdf", "thumb_pdf_w": 100, "thumb_pdf_h": 80, "thumb_tiny": 3}),
        );
        assert!(sizes_only.thumbnail(None).is_none());
    }

    #[test]
    fn test_link_and_image_predicate() {
        let a = attachment(
            AttachmentKind::File,
            json!({"mimetype": "image/png", "url_private": "http://p", "from_url": "http://f"}),
        );
        assert!(a.is_image());
        assert_eq!(a.link(), Some("http://f"));

        let b = attachment(
            AttachmentKind::File,
            json!({"mimetype": "application/pdf", "url_private": "http://p"}),
        );
        assert!(!b.is_image());
        assert_eq!(b.link(), Some("http://p"));
    }
}
