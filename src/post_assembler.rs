//! Turns a post into a Hugo markdown document.
//!
//! The document is made of a YAML front matter followed by the markdown of every content
//! block, the post's own blocks first and then those of the reblog trail. Blocks are
//! identified as `{post id}_{n}`, counting from 1 across own and trail blocks; the id
//! also names the local copies of the media a block refers to.

use std::fmt::Write;

use crate::content::media::MediaRef;
use crate::content::{ContentBlock, ContentError, RenderOptions};
use crate::post::{Post, PostState};
use crate::text_utils::{escape_yaml, first_text_phrase, format_date_time, is_blank};

const UNTITLED: &str = "...";

/// Ordered key/value pairs, where the first value set for a key is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Returns false, leaving the existing value alone, if the key is already set.
    pub fn insert_if_absent(&mut self, key: &str, value: String) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.entries.push((key.to_string(), value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub post_name: String,
    pub front_matter: FrontMatter,
    pub body_markdown: String,
    pub media: Vec<MediaRef>,
    /// Blocks left out of the body because their data was incomplete
    pub block_errors: Vec<ContentError>,
}

impl RenderedPost {
    pub fn to_document(&self) -> String {
        let mut buf = String::new();

        let _ = writeln!(&mut buf, "---");
        for (key, value) in self.front_matter.iter() {
            let _ = writeln!(&mut buf, "{}: {}", key, value);
        }
        let _ = writeln!(&mut buf, "---");
        let _ = writeln!(&mut buf);
        buf.push_str(&self.body_markdown);
        buf
    }
}

pub fn post_name(post: &Post) -> String {
    match post.slug.as_deref() {
        Some(slug) if !is_blank(Some(slug)) => format!("{}---{}", post.id, slug),
        _ => post.id.to_string(),
    }
}

/// Tumblr posts often have no title, but most Hugo themes expect one, so one is made up
/// from the summary or the first text block.
pub fn derive_title(post: &Post) -> String {
    let from_summary = post.summary.as_deref().and_then(first_text_phrase);

    let title = match from_summary {
        Some(title) if !is_blank(Some(title)) => Some(title),
        _ => post.content.iter()
            .find_map(|block| match block {
                ContentBlock::Text(text) => Some(text),
                _ => None,
            })
            .and_then(|text| text.text.as_deref())
            .and_then(first_text_phrase)
            .filter(|title| !title.trim().is_empty()),
    };

    match title {
        Some(title) => escape_yaml(title),
        None => UNTITLED.to_string(),
    }
}

fn quoted_list<'a>(items: impl Iterator<Item=&'a str>) -> String {
    let items: Vec<String> = items
        .map(|item| format!("\"{}\"", escape_yaml(item).replace('"', "\\\"")))
        .collect();
    format!("[{}]", items.join(","))
}

fn build_front_matter(post: &Post, title: &str) -> FrontMatter {
    let is_draft = matches!(post.state, PostState::Draft | PostState::Private);

    let mut front_matter = FrontMatter::default();
    front_matter.insert_if_absent("id", post.id.to_string());
    front_matter.insert_if_absent("date", format_date_time(&post.date));
    front_matter.insert_if_absent("categories", quoted_list([post.original_type.as_str()].into_iter()));
    front_matter.insert_if_absent("draft", is_draft.to_string());
    front_matter.insert_if_absent("title", format!("\"{}\"", title));
    front_matter.insert_if_absent("reblog", post.is_reblog().to_string());
    if !post.tags.is_empty() {
        front_matter.insert_if_absent("tags", quoted_list(post.tags.iter().map(String::as_str)));
    }
    front_matter
}

struct BodyBuilder<'a> {
    post_id: i64,
    options: &'a RenderOptions,
    count: usize,
    markdown: String,
    media: Vec<MediaRef>,
    errors: Vec<ContentError>,
}

impl BodyBuilder<'_> {
    fn add_blocks(&mut self, blocks: &[ContentBlock]) {
        for block in blocks {
            self.count += 1;
            let block_id = format!("{}_{}", self.post_id, self.count);
            match block.render(&block_id, self.options) {
                Ok(rendered) => {
                    self.markdown.push_str(&rendered.markdown);
                    self.media.extend(rendered.media);
                }
                Err(e) => self.errors.push(e),
            }
        }
    }
}

pub fn assemble(post: &Post, options: &RenderOptions) -> RenderedPost {
    let title = derive_title(post);

    let mut body = BodyBuilder {
        post_id: post.id,
        options,
        count: 0,
        markdown: String::new(),
        media: vec![],
        errors: vec![],
    };

    body.add_blocks(&post.content);

    // The attribution always names the first blog of the trail, whichever entry was
    // just rendered. It is written as its own quoted paragraph ("> " and a blank line
    // after) so it does not run into the next block.
    let reblogged_from = post.trail.first().and_then(|entry| entry.blog.as_ref());
    for entry in post.trail.iter() {
        body.add_blocks(&entry.content);
        if let Some(blog) = reblogged_from {
            let _ = write!(&mut body.markdown, "> Reblogged from [{}]({})\n\n", blog.name, blog.url);
        }
    }

    RenderedPost {
        post_name: post_name(post),
        front_matter: build_front_matter(post, &title),
        body_markdown: body.markdown,
        media: body.media,
        block_errors: body.errors,
    }
}
