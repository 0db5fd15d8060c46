use serde::Deserialize;

use crate::content::media::{one_or_many, MediaDescription, MediaRef};
use crate::content::{ContentError, RenderOptions, RenderedBlock};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageBlock {
    #[serde(default, deserialize_with = "one_or_many")]
    pub media: Vec<MediaDescription>,
}

impl ImageBlock {
    /// The full size image: first one flagged with original dimensions, else the widest.
    /// Resized variants for responsive pages are left to the site generator.
    pub fn representative_media(&self) -> Option<&MediaDescription> {
        if let Some(original) = self.media.iter().find(|m| m.has_original_dimensions) {
            return Some(original);
        }

        let mut widest: Option<&MediaDescription> = None;
        for media in self.media.iter() {
            match widest {
                Some(w) if w.width >= media.width => {}
                _ => widest = Some(media),
            }
        }
        widest
    }

    pub fn render(&self, block_id: &str, options: &RenderOptions) -> Result<RenderedBlock, ContentError> {
        let Some(media) = self.representative_media() else {
            return Err(ContentError::EmptyMedia {
                block_id: block_id.to_string(),
                block_type: "image",
            });
        };

        let media_ref = MediaRef::new(block_id, &media.url);
        let markdown = format!(
            "{{{{<figure src=\"{}{}\" caption=\"\" >}}}}\n",
            options.media_prefix, media_ref.local_file_name
        );

        Ok(RenderedBlock {
            markdown,
            media: vec![media_ref],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(url: &str, width: u32, height: u32, original: bool) -> MediaDescription {
        MediaDescription {
            url: url.to_string(),
            width,
            height,
            mime_type: Some("image/jpeg".to_string()),
            has_original_dimensions: original,
        }
    }

    #[test]
    fn test_original_dimensions_win_over_width() {
        let block = ImageBlock {
            media: vec![
                media("small.jpg", 100, 50, false),
                media("original.jpg", 400, 200, true),
                media("large.jpg", 800, 300, false),
            ],
        };
        assert_eq!(block.representative_media().unwrap().url, "original.jpg");
    }

    #[test]
    fn test_widest_when_no_original() {
        let block = ImageBlock {
            media: vec![
                media("small.jpg", 100, 50, false),
                media("large.jpg", 800, 300, false),
                media("medium.jpg", 400, 200, false),
                media("large-copy.jpg", 800, 300, false),
            ],
        };
        assert_eq!(block.representative_media().unwrap().url, "large.jpg");
    }

    #[test]
    fn test_render_figure() {
        let block = ImageBlock {
            media: vec![media("https://64.media.tumblr.com/a/tumblr_b_1280.jpg", 1280, 960, true)],
        };
        let rendered = block.render("42_2", &RenderOptions::with_prefix("../../media/")).unwrap();
        assert_eq!(rendered.markdown, "{{<figure src=\"../../media/42_2.jpg\" caption=\"\" >}}\n");
        assert_eq!(rendered.media, vec![MediaRef {
            source_url: "https://64.media.tumblr.com/a/tumblr_b_1280.jpg".to_string(),
            local_file_name: "42_2.jpg".to_string(),
        }]);

        let rendered = block.render("42_2", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "{{<figure src=\"42_2.jpg\" caption=\"\" >}}\n");
    }

    #[test]
    fn test_empty_media_is_an_error() {
        let block = ImageBlock { media: vec![] };
        let err = block.render("42_3", &RenderOptions::default()).unwrap_err();
        assert_eq!(err, ContentError::EmptyMedia { block_id: "42_3".to_string(), block_type: "image" });
    }
}
