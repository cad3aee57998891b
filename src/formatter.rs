//! Answer text formatter
//!
//! Turns a raw answer string into paragraph and list blocks, then into the
//! markup the chat view injects. Only a small markdown subset is recognised:
//! `**emphasis**`, numbered lists and `-`/`*`/`•` bullet lists.

#[cfg(test)]
mod proptests;

use regex::Regex;
use std::sync::LazyLock;

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("emphasis pattern is valid"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.[\s\x{FEFF}]+(.+)$").expect("numbered pattern is valid"));

static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•][\s\x{FEFF}]+(.+)$").expect("bullet pattern is valid"));

/// One structural unit of formatted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph { text: String },
    OrderedList { items: Vec<String> },
    UnorderedList { items: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

/// List being accumulated while scanning lines
struct OpenList {
    kind: ListKind,
    items: Vec<String>,
}

impl OpenList {
    fn new(kind: ListKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    fn into_block(self) -> Block {
        match self.kind {
            ListKind::Ordered => Block::OrderedList { items: self.items },
            ListKind::Unordered => Block::UnorderedList { items: self.items },
        }
    }
}

/// Format raw answer text into markup.
///
/// Accepts `&str` or `Option<&str>`; empty and absent input yield an empty
/// string. Text content is inserted verbatim, see [`format_escaped`] for the
/// variant that escapes it first.
pub fn format<'a>(text: impl Into<Option<&'a str>>) -> String {
    match text.into() {
        Some(text) if !text.is_empty() => blocks_to_markup(&parse_blocks(&emphasize(text))),
        _ => String::new(),
    }
}

/// Like [`format`], but HTML-escapes the raw text before any markup is added.
pub fn format_escaped<'a>(text: impl Into<Option<&'a str>>) -> String {
    match text.into() {
        Some(text) if !text.is_empty() => {
            blocks_to_markup(&parse_blocks(&emphasize(&escape_html(text))))
        }
        _ => String::new(),
    }
}

/// Rewrite every `**X**` span as `<strong>X</strong>`.
pub fn emphasize(text: &str) -> String {
    EMPHASIS.replace_all(text, "<strong>${1}</strong>").into_owned()
}

/// Split text into blocks by line-level pattern matching.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenList> = None;

    for raw in text.split('\n') {
        let line = raw.trim_matches(is_blank);

        if line.is_empty() {
            if let Some(list) = open.take() {
                blocks.push(list.into_block());
            }
            continue;
        }

        // Numbered is checked first so it wins over bullets.
        let item = if let Some(caps) = NUMBERED_ITEM.captures(line) {
            Some((ListKind::Ordered, caps[2].to_string()))
        } else {
            BULLET_ITEM
                .captures(line)
                .map(|caps| (ListKind::Unordered, caps[1].to_string()))
        };

        match item {
            Some((kind, content)) => {
                let mut list = match open.take() {
                    Some(list) if list.kind == kind => list,
                    Some(other) => {
                        blocks.push(other.into_block());
                        OpenList::new(kind)
                    }
                    None => OpenList::new(kind),
                };
                list.items.push(content);
                open = Some(list);
            }
            None => {
                if let Some(list) = open.take() {
                    blocks.push(list.into_block());
                }
                blocks.push(Block::Paragraph {
                    text: line.to_string(),
                });
            }
        }
    }

    if let Some(list) = open {
        blocks.push(list.into_block());
    }

    blocks
}

/// Whitespace as browsers see it: Unicode white space plus the BOM.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// Serialize blocks in order.
pub fn blocks_to_markup(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Paragraph { text } => {
                out.push_str("<p>");
                out.push_str(text);
                out.push_str("</p>");
            }
            Block::OrderedList { items } => push_list(&mut out, "ol", items),
            Block::UnorderedList { items } => push_list(&mut out, "ul", items),
        }
    }
    out
}

fn push_list(out: &mut String, tag: &str, items: &[String]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for item in items {
        out.push_str("<li>");
        out.push_str(item);
        out.push_str("</li>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
