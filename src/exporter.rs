//! Runs an export: reads posts from the API or a saved dump, selects them, renders each one
//! and writes the documents and media to the chosen layout.
//!
//! Failures on a single post, document or media file are logged and counted in the
//! [`RunSummary`]; only failing to obtain the posts at all aborts the run.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use serde_json::Value;
use spdlog::{debug, error, info, warn, Logger};

use crate::api::{Credentials, FetchSelection, TumblrClient};
use crate::content::RenderOptions;
use crate::media::{write_markdown_file, MediaCopier};
use crate::post::{Post, PostState};
use crate::post_assembler::assemble;
use crate::post_filter::PostFilter;

pub enum PostSource {
    Api {
        blog: String,
        credentials: Credentials,
        selection: FetchSelection,
    },
    JsonFile(PathBuf),
}

pub enum Layout {
    /// `{posts_dir}/{post_name}.md`, every media file in `media_dir`
    Flat { posts_dir: PathBuf, media_dir: PathBuf },
    /// `{output_dir}/{post_name}/index.md` with the post's media beside it
    PageBundle { output_dir: PathBuf },
    /// Media files only, no documents
    MediaOnly { media_dir: PathBuf },
}

pub struct ExportOptions {
    pub source: PostSource,
    /// Where to save the posts as read, before any filtering
    pub json_out: Option<PathBuf>,
    pub layout: Layout,
    pub filter: PostFilter,
    pub strict: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub published: usize,
    pub private: usize,
    pub draft: usize,
    pub queued: usize,
}

impl StateCounts {
    fn add(&mut self, state: PostState) {
        match state {
            PostState::Published => self.published += 1,
            PostState::Private => self.private += 1,
            PostState::Draft => self.draft += 1,
            PostState::Queued => self.queued += 1,
            PostState::Unknown => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub read_time: Duration,
    pub processing_time: Duration,
    pub posts_read: usize,
    pub malformed_posts: usize,
    pub posts_selected: usize,
    pub malformed_blocks: usize,
    pub documents_written: usize,
    pub file_errors: usize,
    pub media_files: usize,
    pub copy_errors: usize,
    pub states: StateCounts,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.file_errors + self.copy_errors + self.malformed_posts + self.malformed_blocks > 0
    }

    pub fn log(&self, logger: &Logger) {
        info!(logger: logger, "Read Time      : {:?}", self.read_time);
        info!(logger: logger, "Processing Time: {:?}", self.processing_time);
        if self.malformed_posts != 0 {
            error!(logger: logger, "Malformed Posts: {}", self.malformed_posts);
        }
        if self.malformed_blocks != 0 {
            error!(logger: logger, "Block Errors:    {}", self.malformed_blocks);
        }
        if self.file_errors != 0 {
            error!(logger: logger, "File Errors:     {}", self.file_errors);
        }
        if self.copy_errors != 0 {
            error!(logger: logger, "Copy Errors:     {}", self.copy_errors);
        }
        let readable = self.posts_read - self.malformed_posts;
        if readable != self.posts_selected {
            info!(logger: logger, "Filtered:        {} posts down to {}", readable, self.posts_selected);
        }
        info!(logger: logger, "Published Posts: {}", self.states.published);
        info!(logger: logger, "Private Posts:   {}", self.states.private);
        info!(logger: logger, "Draft Posts:     {}", self.states.draft);
        info!(logger: logger, "Queued Posts:    {}", self.states.queued);
        info!(logger: logger, "Total:           {}", self.posts_selected);
    }
}

/// Media prefix for documents in `posts_dir` referring to files in `media_dir`.
/// Hugo serves a post one level below its file, hence the leading `../`.
pub fn relative_media_path(posts_dir: &Path, media_dir: &Path) -> String {
    let absolute = |path: &Path| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let (from, to) = (absolute(posts_dir), absolute(media_dir));

    let from: Vec<Component> = from.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = to.components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let mut prefix = String::from("../");
    for _ in common..from.len() {
        prefix.push_str("../");
    }
    for component in &to[common..] {
        prefix.push_str(&component.as_os_str().to_string_lossy());
        prefix.push('/');
    }
    prefix
}

/// Posts saved by `--json-out`: an array of posts. A raw API response is accepted too.
fn posts_from_json(value: Value) -> anyhow::Result<Vec<Value>> {
    match value {
        Value::Array(posts) => Ok(posts),
        Value::Object(mut obj) => {
            let posts = match obj.remove("response") {
                Some(Value::Object(mut response)) => response.remove("posts"),
                _ => obj.remove("posts"),
            };
            match posts {
                Some(Value::Array(posts)) => Ok(posts),
                _ => bail!("Expected an array of posts"),
            }
        }
        _ => bail!("Expected an array of posts"),
    }
}

pub struct Exporter {
    logger: Arc<Logger>,
}

impl Exporter {
    pub fn new(logger: Arc<Logger>) -> Exporter {
        Exporter { logger }
    }

    pub async fn run(&self, options: &ExportOptions) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();
        let started = Instant::now();

        let raw_posts = self.read_posts(&options.source).await?;
        if let Some(ref json_out) = options.json_out {
            self.save_posts(&raw_posts, json_out).await?;
        }
        summary.posts_read = raw_posts.len();
        summary.read_time = started.elapsed();

        let started = Instant::now();
        let posts = self.decode_posts(raw_posts, &mut summary);
        let posts = options.filter.apply(posts);
        summary.posts_selected = posts.len();

        let copier = MediaCopier::new(self.logger.clone())?;
        let media_prefix = match options.layout {
            Layout::Flat { ref posts_dir, ref media_dir } => relative_media_path(posts_dir, media_dir),
            Layout::PageBundle { .. } | Layout::MediaOnly { .. } => String::new(),
        };
        let render_options = RenderOptions {
            media_prefix,
            strict: options.strict,
        };

        for post in posts.iter() {
            summary.states.add(post.state);
            debug!(logger: self.logger, "Processing {}", post);

            let rendered = assemble(post, &render_options);
            for err in rendered.block_errors.iter() {
                warn!(logger: self.logger, "Post {}: {}", post.id, err);
            }
            summary.malformed_blocks += rendered.block_errors.len();
            summary.media_files += rendered.media.len();

            let (document_path, media_dir) = match options.layout {
                Layout::Flat { ref posts_dir, ref media_dir } => {
                    (Some(posts_dir.join(format!("{}.md", rendered.post_name))), media_dir.clone())
                }
                Layout::PageBundle { ref output_dir } => {
                    let bundle = output_dir.join(&rendered.post_name);
                    (Some(bundle.join("index.md")), bundle)
                }
                Layout::MediaOnly { ref media_dir } => (None, media_dir.clone()),
            };

            if let Some(path) = document_path {
                let failed = write_markdown_file(&path, &rendered.to_document(), options.dry_run, &self.logger).await;
                summary.file_errors += failed;
                summary.documents_written += 1 - failed;
            }
            summary.copy_errors += copier.copy_files(&rendered.media, &media_dir, options.dry_run).await;
        }

        summary.processing_time = started.elapsed();
        Ok(summary)
    }

    async fn read_posts(&self, source: &PostSource) -> anyhow::Result<Vec<Value>> {
        match source {
            PostSource::JsonFile(path) => {
                info!(logger: self.logger, "Reading posts from {}", path.display());
                let content = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Error reading posts from {}", path.display()))?;
                let value: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Error parsing posts in {}", path.display()))?;
                posts_from_json(value).with_context(|| format!("Error reading posts from {}", path.display()))
            }
            PostSource::Api { blog, credentials, selection } => {
                info!(logger: self.logger, "Reading posts of {} from the Tumblr API", blog);
                let client = TumblrClient::new(credentials.clone(), self.logger.clone())?;
                Ok(client.fetch(blog, *selection).await?)
            }
        }
    }

    async fn save_posts(&self, posts: &[Value], path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(posts)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await
                .with_context(|| format!("Error creating {}", parent.display()))?;
        }
        tokio::fs::write(path, json).await
            .with_context(|| format!("Error writing posts to {}", path.display()))?;
        info!(logger: self.logger, "Saved {} posts to {}", posts.len(), path.display());
        Ok(())
    }

    fn decode_posts(&self, raw_posts: Vec<Value>, summary: &mut RunSummary) -> Vec<Post> {
        let mut posts = Vec::with_capacity(raw_posts.len());
        for value in raw_posts {
            let id = value.get("id").map(Value::to_string).unwrap_or_else(|| "?".to_string());
            match Post::from_value(value) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    error!(logger: self.logger, "Skipping post {}: {}", id, e);
                    summary.malformed_posts += 1;
                }
            }
        }
        posts
    }
}
