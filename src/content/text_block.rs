use serde::Deserialize;

use crate::content::format_range::{to_markdown, BlockFormat, FormatRange};
use crate::content::{ContentError, RenderOptions, RenderedBlock};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "subtype", default)]
    pub block_format: Option<BlockFormat>,
    #[serde(default)]
    pub formatting: Option<Vec<FormatRange>>,
}

impl TextBlock {
    pub fn new(text: &str) -> TextBlock {
        TextBlock {
            text: Some(text.to_string()),
            block_format: None,
            formatting: None,
        }
    }

    pub fn render(&self, block_id: &str, options: &RenderOptions) -> Result<RenderedBlock, ContentError> {
        let Some(ref text) = self.text else {
            return Err(ContentError::missing(block_id, "text", "text"));
        };

        let block_format = self.block_format.unwrap_or_default();
        let ranges = self.formatting.as_deref().unwrap_or_default();
        Ok(RenderedBlock::text_only(to_markdown(text, block_format, ranges, options.strict)))
    }
}
