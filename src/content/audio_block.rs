use serde::Deserialize;

use crate::content::media::{object_or_first, one_or_many, MediaDescription, MediaRef, PosterImage};
use crate::content::{ContentError, RenderOptions, RenderedBlock};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudioBlock {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub poster: Vec<PosterImage>,
    #[serde(default, deserialize_with = "object_or_first")]
    pub media: Option<MediaDescription>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

impl AudioBlock {
    fn embedded(&self, block_id: &str, provider: &str) -> Result<String, ContentError> {
        let Some(ref embed_url) = self.embed_url else {
            return Err(ContentError::missing(block_id, "audio", "embed_url"));
        };
        Ok(format!(
            "{{{{<embedded_audio src=\"{}\" class=\"{}_audio_player\" >}}}}\n",
            embed_url, provider
        ))
    }

    pub fn render(&self, block_id: &str, options: &RenderOptions) -> Result<RenderedBlock, ContentError> {
        let mut rendered = match self.provider.as_deref() {
            Some(provider @ ("spotify" | "soundcloud")) => {
                RenderedBlock::text_only(self.embedded(block_id, provider)?)
            }
            None => {
                let Some(ref media) = self.media else {
                    return Err(ContentError::missing(block_id, "audio", "media"));
                };

                let mut media_refs = vec![];
                let poster = match self.poster.first() {
                    Some(poster) => {
                        let poster_ref = MediaRef::new(block_id, &poster.url);
                        let src = format!("{}{}", options.media_prefix, poster_ref.local_file_name);
                        media_refs.push(poster_ref);
                        src
                    }
                    None => String::new(),
                };

                let audio_ref = MediaRef::new(block_id, &media.url);
                let markdown = format!(
                    "{{{{<audio src=\"{}{}\" type=\"{}\" poster=\"{}\" caption=\"{} - {}\">}}}}\n",
                    options.media_prefix,
                    audio_ref.local_file_name,
                    media.mime_type.as_deref().unwrap_or_default(),
                    poster,
                    self.artist.as_deref().unwrap_or_default(),
                    self.title.as_deref().unwrap_or_default(),
                );
                media_refs.push(audio_ref);

                RenderedBlock {
                    markdown,
                    media: media_refs,
                }
            }
            Some(provider) => RenderedBlock::text_only(format!("Audio provider unknown- {}", provider)),
        };

        rendered.markdown.push('\n');
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AudioBlock {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_spotify() {
        let block = parse(r#"{"type": "audio", "provider": "spotify",
            "embed_url": "https://open.spotify.com/embed/track/xyz"}"#);
        let rendered = block.render("5_1", &RenderOptions::default()).unwrap();
        assert_eq!(
            rendered.markdown,
            "{{<embedded_audio src=\"https://open.spotify.com/embed/track/xyz\" class=\"spotify_audio_player\" >}}\n\n"
        );
        assert!(rendered.media.is_empty());
    }

    #[test]
    fn test_soundcloud() {
        let block = parse(r#"{"type": "audio", "provider": "soundcloud", "embed_url": "https://w.soundcloud.com/player/?url=x"}"#);
        let rendered = block.render("5_2", &RenderOptions::default()).unwrap();
        assert_eq!(
            rendered.markdown,
            "{{<embedded_audio src=\"https://w.soundcloud.com/player/?url=x\" class=\"soundcloud_audio_player\" >}}\n\n"
        );
    }

    #[test]
    fn test_native_audio_copies_poster_and_file() {
        let block = parse(r#"{"type": "audio", "title": "Song", "artist": "Band",
            "poster": [{"url": "https://64.media.tumblr.com/p/cover.jpg", "width": 500}],
            "media": {"url": "https://a.tumblr.com/tumblr_song.mp3", "type": "audio/mpeg"}}"#);
        let rendered = block.render("5_3", &RenderOptions::with_prefix("../media/")).unwrap();
        assert_eq!(
            rendered.markdown,
            "{{<audio src=\"../media/5_3.mp3\" type=\"audio/mpeg\" poster=\"../media/5_3.jpg\" caption=\"Band - Song\">}}\n\n"
        );
        assert_eq!(rendered.media, vec![
            MediaRef::new("5_3", "https://64.media.tumblr.com/p/cover.jpg"),
            MediaRef::new("5_3", "https://a.tumblr.com/tumblr_song.mp3"),
        ]);
    }

    #[test]
    fn test_native_audio_without_poster() {
        let block = parse(r#"{"type": "audio", "media": {"url": "https://a.tumblr.com/s.mp3", "type": "audio/mpeg"}}"#);
        let rendered = block.render("5_4", &RenderOptions::default()).unwrap();
        assert_eq!(
            rendered.markdown,
            "{{<audio src=\"5_4.mp3\" type=\"audio/mpeg\" poster=\"\" caption=\" - \">}}\n\n"
        );
        assert_eq!(rendered.media.len(), 1);
    }

    #[test]
    fn test_unknown_provider() {
        let block = parse(r#"{"type": "audio", "provider": "bandcamp", "embed_url": "https://bandcamp.com/x"}"#);
        let rendered = block.render("5_5", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.markdown, "Audio provider unknown- bandcamp\n");
        assert!(rendered.media.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let block = parse(r#"{"type": "audio", "provider": "spotify"}"#);
        assert_eq!(
            block.render("5_6", &RenderOptions::default()).unwrap_err(),
            ContentError::missing("5_6", "audio", "embed_url")
        );

        let block = parse(r#"{"type": "audio"}"#);
        assert_eq!(
            block.render("5_7", &RenderOptions::default()).unwrap_err(),
            ContentError::missing("5_7", "audio", "media")
        );
    }
}
