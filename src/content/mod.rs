use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::content::audio_block::AudioBlock;
use crate::content::image_block::ImageBlock;
use crate::content::link_block::LinkBlock;
use crate::content::media::MediaRef;
use crate::content::text_block::TextBlock;
use crate::content::video_block::VideoBlock;

pub mod format_range;
pub mod media;
pub mod text_block;
pub mod image_block;
pub mod video_block;
pub mod audio_block;
pub mod link_block;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prepended to local media file names in the generated shortcodes
    pub media_prefix: String,
    /// Plain markdown only, no Hugo shortcodes for text formats
    pub strict: bool,
}

impl RenderOptions {
    pub fn with_prefix(media_prefix: &str) -> RenderOptions {
        RenderOptions {
            media_prefix: media_prefix.to_string(),
            strict: false,
        }
    }
}

/// Markdown for one content block plus the media it needs copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBlock {
    pub markdown: String,
    pub media: Vec<MediaRef>,
}

impl RenderedBlock {
    pub fn text_only(markdown: String) -> RenderedBlock {
        RenderedBlock { markdown, media: vec![] }
    }
}

/// A block that cannot be rendered because the upstream data is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("{block_type} block {block_id} is missing '{field}'")]
    MissingField {
        block_id: String,
        block_type: &'static str,
        field: &'static str,
    },
    #[error("{block_type} block {block_id} has no media")]
    EmptyMedia {
        block_id: String,
        block_type: &'static str,
    },
    #[error("{type_tag} block {block_id} could not be read: {reason}")]
    Unreadable {
        block_id: String,
        type_tag: String,
        reason: String,
    },
}

impl ContentError {
    pub(crate) fn missing(block_id: &str, block_type: &'static str, field: &'static str) -> ContentError {
        ContentError::MissingField {
            block_id: block_id.to_string(),
            block_type,
            field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(TextBlock),
    Image(ImageBlock),
    Video(VideoBlock),
    Audio(AudioBlock),
    Link(LinkBlock),
    /// Block type outside of the supported set. Rendered as a placeholder.
    Unknown { type_tag: String },
    /// Supported block type whose payload does not have the expected shape.
    Unreadable { type_tag: String, reason: String },
}

impl ContentBlock {
    /// Builds the block variant named by the `type` tag of a raw JSON block.
    pub fn from_value(value: Value) -> ContentBlock {
        let type_tag = value.get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let parsed = match type_tag.as_str() {
            "text" => serde_json::from_value(value).map(ContentBlock::Text),
            "image" => serde_json::from_value(value).map(ContentBlock::Image),
            "video" => serde_json::from_value(value).map(ContentBlock::Video),
            "audio" => serde_json::from_value(value).map(ContentBlock::Audio),
            "link" => serde_json::from_value(value).map(ContentBlock::Link),
            _ => return ContentBlock::Unknown { type_tag },
        };

        parsed.unwrap_or_else(|e| ContentBlock::Unreadable {
            type_tag,
            reason: e.to_string(),
        })
    }

    pub fn render(&self, block_id: &str, options: &RenderOptions) -> Result<RenderedBlock, ContentError> {
        match self {
            ContentBlock::Text(block) => block.render(block_id, options),
            ContentBlock::Image(block) => block.render(block_id, options),
            ContentBlock::Video(block) => block.render(block_id, options),
            ContentBlock::Audio(block) => block.render(block_id, options),
            ContentBlock::Link(block) => block.render(block_id),
            ContentBlock::Unknown { type_tag } => {
                Ok(RenderedBlock::text_only(format!("Content type unknown- {}\n", type_tag)))
            }
            ContentBlock::Unreadable { type_tag, reason } => Err(ContentError::Unreadable {
                block_id: block_id.to_string(),
                type_tag: type_tag.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ContentBlock::from_value(value))
    }
}
