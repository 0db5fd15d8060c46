#![cfg(test)]

use serde_json::Value;

pub fn post_json(data: &str) -> Value {
    serde_json::from_str(data).unwrap()
}

pub const DRAFT_POST: &str = r#"{
  "id": 100,
  "slug": "",
  "state": "draft",
  "date": "2021-03-04 05:06:07 GMT",
  "tags": [],
  "summary": "",
  "original_type": "regular",
  "content": [
    {"type": "text", "text": "Hello, world!"}
  ],
  "trail": []
}"#;

pub const MEDIA_POST: &str = r#"{
  "id": 200,
  "slug": "quick-thought",
  "state": "published",
  "date": "2021-05-06 07:08:09 GMT",
  "tags": ["photo", "music"],
  "summary": "Quick thought. More text.",
  "original_type": "photo",
  "content": [
    {"type": "image", "media": [
      {"url": "https://64.media.tumblr.com/a/tumblr_p_400.jpg", "type": "image/jpeg", "width": 400, "height": 300},
      {"url": "https://64.media.tumblr.com/a/tumblr_p_1280.jpg", "type": "image/jpeg", "width": 1280, "height": 960}
    ]},
    {"type": "text", "subtype": "heading1", "text": "Quick thought",
     "formatting": [{"start": 0, "end": 5, "type": "italic"}]},
    {"type": "video", "provider": "youtube", "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
     "metadata": {"id": "dQw4w9WgXcQ"}, "attribution": {"type": "app", "display_text": "Never"}},
    {"type": "audio", "title": "Song", "artist": "Band",
     "poster": [{"url": "https://64.media.tumblr.com/c/cover.png"}],
     "media": {"url": "https://a.tumblr.com/tumblr_song.mp3", "type": "audio/mpeg"}},
    {"type": "poll", "question": "Which one?"}
  ],
  "trail": []
}"#;

pub const REBLOG_POST: &str = r#"{
  "id": 692841553021124608,
  "slug": "reblogging-a-friend",
  "state": "published",
  "date": "2022-08-14 17:02:11 GMT",
  "tags": ["friends", "art"],
  "summary": "So good!",
  "original_type": "regular",
  "content": [
    {"type": "text", "text": "So good!"}
  ],
  "trail": [
    {
      "blog": {"name": "first-artist", "url": "https://first-artist.tumblr.com/"},
      "content": [
        {"type": "image", "media": [{"url": "https://64.media.tumblr.com/b/art.png", "width": 800, "has_original_dimensions": true}]}
      ]
    },
    {
      "blog": {"name": "second-artist", "url": "https://second-artist.tumblr.com/"},
      "content": [
        {"type": "link", "title": "Portfolio", "url": "https://second-artist.example.com"}
      ]
    }
  ]
}"#;
