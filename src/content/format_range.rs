//! Text block to markdown conversion.
//!
//! Block and inline formats are turned into markers queued per character offset in a
//! [`TagMap`], then the text is walked once, emitting the markers queued for an offset
//! right before the character at that offset. The offset equal to the text length holds
//! the trailing markers.
//!
//! Ordering rules at a shared offset:
//! - opening markers are appended, so they come out in the order the ranges were given;
//! - closing markers are inserted at the front, so the range registered last closes first;
//! - the escape backslash for a markdown symbol is appended after every marker.

use std::collections::BTreeMap;

use serde::Deserialize;

// heading1 - Post headings.
// heading2 - Section subheadings.
// quirky - Displayed by Tumblr clients with a large cursive font.
// quote - Short quotations, displayed with a large serif font.
// indented - Longer quotations or photo captions.
// chat - Mimics the old chat post type, displayed with a monospace font.
// ordered-list-item - List item prefixed by a number.
// unordered-list-item - List item prefixed with a bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockFormat {
    #[default]
    None,
    Heading1,
    Heading2,
    Quirky,
    Quote,
    Indented,
    Chat,
    OrderedListItem,
    UnorderedListItem,
    #[serde(other)]
    Unknown,
}

impl BlockFormat {
    fn opening_tag(&self, strict: bool) -> &'static str {
        match self {
            BlockFormat::Heading1 => "# ",
            BlockFormat::Heading2 => "## ",
            BlockFormat::Indented => "> ",
            BlockFormat::OrderedListItem => "1. ",
            BlockFormat::UnorderedListItem => "- ",
            BlockFormat::Quirky if !strict => "{{%quirky%}}",
            BlockFormat::Quote if !strict => "{{%quote%}}",
            BlockFormat::Chat if !strict => "{{%chat%}}",
            _ => "",
        }
    }

    fn closing_tag(&self, strict: bool) -> &'static str {
        match self {
            BlockFormat::Quirky if !strict => "{{%/quirky%}}",
            BlockFormat::Quote if !strict => "{{%/quote%}}",
            BlockFormat::Chat if !strict => "{{%/chat%}}",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Bold,
    Italic,
    Strikethrough,
    Small,
    Color,
    #[serde(other)]
    Unknown,
}

/// Inline format over the half-open char range `start..end` of a text block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatRange {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: FormatKind,
    #[serde(default)]
    pub hex: Option<String>,
}

impl FormatRange {
    pub fn new(start: usize, end: usize, kind: FormatKind) -> FormatRange {
        FormatRange { start, end, kind, hex: None }
    }

    pub fn color(start: usize, end: usize, hex: &str) -> FormatRange {
        FormatRange { start, end, kind: FormatKind::Color, hex: Some(hex.to_string()) }
    }

    fn opening_tag(&self, strict: bool) -> String {
        match self.kind {
            FormatKind::Bold => "**".to_string(),
            FormatKind::Italic => "*".to_string(),
            FormatKind::Strikethrough => "~~".to_string(),
            FormatKind::Small if !strict => "{{%small%}}".to_string(),
            FormatKind::Color if !strict => {
                format!("{{{{%color \"{}\"%}}}}", self.hex.as_deref().unwrap_or_default())
            }
            _ => String::new(),
        }
    }

    fn closing_tag(&self, strict: bool) -> &'static str {
        match self.kind {
            FormatKind::Bold => "**",
            FormatKind::Italic => "*",
            FormatKind::Strikethrough => "~~",
            FormatKind::Small if !strict => "{{%/small%}}",
            FormatKind::Color if !strict => "{{%/color%}}",
            _ => "",
        }
    }
}

const MARKDOWN_ESCAPE_CHARS: &str = "\\`*_{}[]<>()#+-.!|";

pub fn needs_escape(c: char) -> bool {
    MARKDOWN_ESCAPE_CHARS.contains(c)
}

/// Markers to emit before the character at each offset.
#[derive(Debug, Default)]
pub struct TagMap {
    tags: BTreeMap<usize, Vec<String>>,
}

impl TagMap {
    pub fn append(&mut self, pos: usize, tag: impl Into<String>) {
        self.tags.entry(pos).or_default().push(tag.into());
    }

    pub fn prepend(&mut self, pos: usize, tag: impl Into<String>) {
        self.tags.entry(pos).or_default().insert(0, tag.into());
    }

    pub fn joined(&self, pos: usize) -> String {
        self.tags.get(&pos).map(|tags| tags.concat()).unwrap_or_default()
    }
}

/// Renders a text block as markdown, framed by a hard line break and a blank line.
///
/// With `strict`, formats that only exist as Hugo shortcodes (quirky, quote, chat,
/// small, color) emit nothing.
pub fn to_markdown(text: &str, block_format: BlockFormat, ranges: &[FormatRange], strict: bool) -> String {
    let len = text.chars().count();
    let mut tag_map = TagMap::default();

    if block_format != BlockFormat::None {
        tag_map.append(0, block_format.opening_tag(strict));
        tag_map.append(len, block_format.closing_tag(strict));
    }

    for range in ranges {
        tag_map.append(range.start, range.opening_tag(strict));
        tag_map.prepend(range.end, range.closing_tag(strict));
    }

    let mut output = String::with_capacity(text.len() + 8);
    output.push_str("  \n");

    for (pos, c) in text.chars().enumerate() {
        if needs_escape(c) {
            tag_map.append(pos, "\\");
        }
        output.push_str(&tag_map.joined(pos));
        output.push(c);
    }
    output.push_str(&tag_map.joined(len));
    output.push_str("\n\n");

    output
}
