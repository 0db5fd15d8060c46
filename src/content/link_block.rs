use serde::Deserialize;

use crate::content::{ContentError, RenderedBlock};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkBlock {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LinkBlock {
    pub fn render(&self, block_id: &str) -> Result<RenderedBlock, ContentError> {
        let Some(ref url) = self.url else {
            return Err(ContentError::missing(block_id, "link", "url"));
        };

        let title = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => url.trim(),
        };

        Ok(RenderedBlock::text_only(format!("[{}]({})\n", title, url)))
    }
}
