//! Rich "block" message bodies.
//!
//! Newer exports carry a structured `blocks` array next to (or instead of)
//! the plain `text` field. The blocks are flattened here into Slack markup
//! mixed with HTML, which then goes through the normal text pipeline.
//!
//! Node kinds that are not understood are logged and contribute nothing, so
//! one odd block never hides the rest of the message.

use serde_json::Value;
use tracing::warn;

use super::ReferenceResolver;
use super::emoji;

/// Flattens a `blocks` array.
pub fn render_blocks<R>(blocks: &[Value], resolver: &R, workspace: &str) -> String
where
    R: ReferenceResolver + ?Sized,
{
    BlockRenderer {
        resolver,
        workspace,
    }
    .blocks(blocks)
}

struct BlockRenderer<'a, R: ?Sized> {
    resolver: &'a R,
    workspace: &'a str,
}

fn kind(node: &Value) -> &str {
    node.get("type").and_then(Value::as_str).unwrap_or("")
}

fn str_field<'v>(node: &'v Value, key: &str) -> Option<&'v str> {
    node.get(key).and_then(Value::as_str)
}

fn children<'v>(node: &'v Value, key: &str) -> &'v [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Text of a block text object: either a plain string or `{"text": ...}`.
fn text_of(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("text").and_then(Value::as_str))
}

fn flag(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

impl<R: ReferenceResolver + ?Sized> BlockRenderer<'_, R> {
    fn blocks(&self, blocks: &[Value]) -> String {
        let mut text = String::new();
        for block in blocks {
            let block_type = kind(block);
            match block_type {
                "image" => text.push_str(&self.block_item(block, block_type)),
                "rich_text" | "rich_text_quote" => {
                    for element in children(block, "elements") {
                        text.push_str(&self.rich_element(element));
                    }
                }
                "divider" => text.push_str("\n<hr>\n\n"),
                _ if block.get("text").is_some() || block.get("fields").is_some() => {
                    if let Some(heading) = block.get("text") {
                        text.push_str(&self.block_item(heading, block_type));
                    }
                    for field in children(block, "fields") {
                        text.push_str(&self.block_item(field, block_type));
                    }
                }
                _ if block.get("elements").is_some() => {
                    for element in children(block, "elements") {
                        text.push_str(&self.block_item(element, block_type));
                    }
                }
                _ => warn!(block_type, "unknown block type"),
            }
        }
        text
    }

    fn rich_elements(&self, node: &Value) -> String {
        children(node, "elements")
            .iter()
            .map(|e| self.rich_element(e))
            .collect()
    }

    fn rich_element(&self, element: &Value) -> String {
        match kind(element) {
            "rich_text_section" => self.rich_elements(element),
            "rich_text_quote" => {
                format!("<blockquote>\n{}</blockquote>\n", self.rich_elements(element))
            }
            "rich_text_preformatted" => format!("<pre>{}</pre>", self.rich_elements(element)),
            "rich_text_list" => self.rich_list(element),
            "text" => styled_text(element),
            "link" => {
                let url = str_field(element, "url").unwrap_or_default();
                let label = str_field(element, "text").unwrap_or(url);
                format!("<{url}|{label}>")
            }
            "user" => {
                let id = str_field(element, "user_id").unwrap_or_default();
                match self
                    .resolver
                    .resolve_user(id)
                    .and_then(|u| u.display_name().map(str::to_string))
                {
                    Some(name) => format!("<b>@{name}</b>"),
                    None => format!("<b>[ Unknown user {id} ]</b>"),
                }
            }
            "channel" => {
                let id = str_field(element, "channel_id").unwrap_or_default();
                let label = self
                    .resolver
                    .resolve_channel(id)
                    .map(|name| format!("#{name}"))
                    .unwrap_or_else(|| format!("[ Unknown channel {id} ]"));
                format!(
                    "<a href='https://{}.slack.com/archives/{id}'>{label}</a>",
                    self.workspace
                )
            }
            "broadcast" => format!("@{}", str_field(element, "range").unwrap_or("here")),
            "emoji" => {
                let name = str_field(element, "name").unwrap_or_default();
                match str_field(element, "unicode") {
                    Some(codepoints) => emojis::get_by_shortcode(name)
                        .map(|e| e.as_str().to_string())
                        .or_else(|| emoji::from_codepoints(codepoints))
                        .unwrap_or_else(|| format!(":{name}:")),
                    None => format!(":{name}:"),
                }
            }
            other => {
                warn!(element_type = other, "unsupported rich text element");
                String::new()
            }
        }
    }

    fn rich_list(&self, element: &Value) -> String {
        let tag = match str_field(element, "style") {
            Some("bullet") => "ul",
            Some("ordered") => "ol",
            style => {
                warn!(?style, "unsupported rich text list style");
                return String::new();
            }
        };
        let items: Vec<String> = children(element, "elements")
            .iter()
            .map(|item| format!("<li>{}</li>", self.rich_element(item)))
            .collect();
        format!("<{tag}>\n{}</{tag}>\n", items.join("\n"))
    }

    /// Renders one text object, field or element of a top-level block.
    fn block_item(&self, item: &Value, block_type: &str) -> String {
        match block_type {
            "image" => {
                return match str_field(item, "image_url") {
                    Some(url) => format!(
                        "<img src='{url}' alt='{}' title='{}'>\n",
                        str_field(item, "alt_text").unwrap_or_default(),
                        item.get("title").and_then(text_of).unwrap_or_default()
                    ),
                    None => {
                        warn!(block_type, "image block without image_url");
                        String::new()
                    }
                };
            }
            "context" => {
                if kind(item) == "image" {
                    return match str_field(item, "image_url") {
                        Some(url) => format!(
                            "<img src='{url}' alt='{}'>\n",
                            str_field(item, "alt_text").unwrap_or_default()
                        ),
                        None => {
                            warn!(block_type, "context image without image_url");
                            String::new()
                        }
                    };
                }
                return match str_field(item, "text") {
                    Some(text) => format!("<small>{text}</small>\n"),
                    None => {
                        warn!(block_type, "context element without text");
                        String::new()
                    }
                };
            }
            _ => {}
        }

        let Some(raw_text) = item.get("text") else {
            warn!(block_type, "block element without text");
            return String::new();
        };

        let text = match kind(item) {
            "" | "plain_text" | "mrkdwn" => text_of(raw_text).unwrap_or_default().to_string(),
            "button" => format!("Slack_Button({})", text_of(raw_text).unwrap_or_default()),
            other => {
                warn!(block_type, text_type = other, "unsupported text type");
                return String::new();
            }
        };

        match block_type {
            "header" => format!("*{text}*\n\n"),
            "section" => format!("{text}\n\n"),
            "actions" => format!("Slack_Action({text})\n"),
            other => {
                warn!(block_type = other, "unsupported block type");
                String::new()
            }
        }
    }
}

fn styled_text(element: &Value) -> String {
    let mut text = str_field(element, "text").unwrap_or_default().to_string();
    if let Some(style) = element.get("style") {
        if flag(style, "code") {
            text = format!("<code>{text}</code>");
        }
        if flag(style, "bold") {
            text = format!("<b>{text}</b>");
        }
        if flag(style, "italic") {
            text = format!("<i>{text}</i>");
        }
        if flag(style, "strike") {
            text = format!("<s>{text}</s>");
        }
    }
    text
}
