use serde::Deserialize;

use crate::content::media::{object_or_first, MediaDescription, MediaRef};
use crate::content::{ContentError, RenderOptions, RenderedBlock};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub display_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoBlock {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub metadata: Option<VideoMetadata>,
    #[serde(default)]
    pub attribution: Option<Attribution>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "object_or_first")]
    pub media: Option<MediaDescription>,
}

impl VideoBlock {
    /// Attribution text usable inside a quoted shortcode parameter.
    fn title(&self) -> String {
        self.attribution.as_ref()
            .and_then(|a| a.display_text.as_deref())
            .unwrap_or_default()
            .replace('"', "")
    }

    pub fn render(&self, block_id: &str, options: &RenderOptions) -> Result<RenderedBlock, ContentError> {
        let markdown = match self.provider.as_deref() {
            Some("youtube") => {
                let Some(id) = self.metadata.as_ref().and_then(|m| m.id.as_deref()) else {
                    return Err(ContentError::missing(block_id, "video", "metadata.id"));
                };
                format!("{{{{<youtube id=\"{}\" title=\"{}\" >}}}}\n", id, self.title())
            }
            Some("vimeo") => {
                let Some(ref url) = self.url else {
                    return Err(ContentError::missing(block_id, "video", "url"));
                };
                let id = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
                format!("{{{{<vimeo id=\"{}\" title=\"{}\" >}}}}\n", id, self.title())
            }
            None => {
                // Hosted by tumblr, so the file has to be copied
                let Some(ref media) = self.media else {
                    return Err(ContentError::missing(block_id, "video", "media"));
                };
                let media_ref = MediaRef::new(block_id, &media.url);
                let markdown = format!(
                    "{{{{<video src=\"{}{}\" type=\"{}\" >}}}}\n",
                    options.media_prefix,
                    media_ref.local_file_name,
                    media.mime_type.as_deref().unwrap_or_default()
                );
                return Ok(RenderedBlock {
                    markdown,
                    media: vec![media_ref],
                });
            }
            Some(provider) => format!("Video provider unknown- {}\n", provider),
        };

        Ok(RenderedBlock::text_only(markdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> VideoBlock {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_youtube() {
        let block = parse(r#"{"type": "video", "provider": "youtube", "url": "https://www.youtube.com/watch?v=abc123",
            "metadata": {"id": "abc123"}, "attribution": {"type": "app", "display_text": "The \"best\" video"}}"#);
        let rendered = block.render("9_1", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "{{<youtube id=\"abc123\" title=\"The best video\" >}}\n");
        assert!(rendered.media.is_empty());
    }

    #[test]
    fn test_youtube_without_id() {
        let block = parse(r#"{"type": "video", "provider": "youtube"}"#);
        let err = block.render("9_1", &RenderOptions::default()).unwrap_err();
        assert_eq!(err, ContentError::missing("9_1", "video", "metadata.id"));
    }

    #[test]
    fn test_vimeo_id_from_url() {
        let block = parse(r#"{"type": "video", "provider": "vimeo", "url": "https://vimeo.com/76979871",
            "attribution": {"display_text": "Vimeo"}}"#);
        let rendered = block.render("9_2", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "{{<vimeo id=\"76979871\" title=\"Vimeo\" >}}\n");
        assert!(rendered.media.is_empty());

        let block = parse(r#"{"type": "video", "provider": "vimeo", "url": "https://vimeo.com/76979871/"}"#);
        let rendered = block.render("9_2", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "{{<vimeo id=\"76979871\" title=\"\" >}}\n");
    }

    #[test]
    fn test_native_video_is_copied() {
        let block = parse(r#"{"type": "video", "media": {"url": "https://va.media.tumblr.com/tumblr_v.mp4",
            "type": "video/mp4", "width": 640, "height": 360}}"#);
        let rendered = block.render("9_3", &RenderOptions::with_prefix("/media/")).unwrap();
        assert_eq!(rendered.markdown, "{{<video src=\"/media/9_3.mp4\" type=\"video/mp4\" >}}\n");
        assert_eq!(rendered.media, vec![MediaRef::new("9_3", "https://va.media.tumblr.com/tumblr_v.mp4")]);
    }

    #[test]
    fn test_native_video_without_media() {
        let block = parse(r#"{"type": "video"}"#);
        assert!(block.render("9_4", &RenderOptions::default()).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let block = parse(r#"{"type": "video", "provider": "dailymotion", "url": "https://dai.ly/x"}"#);
        let rendered = block.render("9_5", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "Video provider unknown- dailymotion\n");
        assert!(rendered.media.is_empty());
    }
}
