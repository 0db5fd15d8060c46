//! Client for the Tumblr v2 API, fetching posts in the Neue Post Format.
//!
//! Posts are returned untouched as JSON values so a run can save them verbatim and be
//! replayed later from the file instead of the API.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use spdlog::{debug, info, warn, Logger};
use thiserror::Error;
use tokio::time::sleep;

const API_BASE_URL: &str = "https://api.tumblr.com/v2/blog";
const PAGE_SIZE: usize = 20;
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unexpected response from {url}: {reason}")]
    Response { url: String, reason: String },
    #[error("Reading {0} requires an oauth_token in the configuration")]
    NotAuthorized(&'static str),
}

impl ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request { .. } => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    response: PostsPage,
}

#[derive(Deserialize)]
struct PostsPage {
    #[serde(default)]
    posts: Vec<Value>,
    #[serde(default)]
    total_posts: Option<u64>,
}

#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub oauth_token: Option<String>,
}

/// Which posts to read from the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSelection {
    pub published: bool,
    pub drafts: bool,
    pub queued: bool,
    /// Send the user token for published posts too, to get private and flagged posts
    pub authenticate: bool,
}

pub struct TumblrClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
    logger: Arc<Logger>,
}

impl TumblrClient {
    pub fn new(credentials: Credentials, logger: Arc<Logger>) -> Result<TumblrClient, ApiError> {
        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        // tests talk to a local server, which must not go through an ambient proxy
        #[cfg(test)]
        let builder = builder.no_proxy();

        let http = builder
            .build()
            .map_err(|e| ApiError::Request {
                url: API_BASE_URL.to_string(),
                reason: e.to_string(),
            })?;

        Ok(TumblrClient {
            http,
            credentials,
            base_url: API_BASE_URL.to_string(),
            logger,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> TumblrClient {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, blog: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, blog, path)
    }

    fn token(&self, what: &'static str) -> Result<&str, ApiError> {
        self.credentials.oauth_token.as_deref().ok_or(ApiError::NotAuthorized(what))
    }

    pub async fn fetch(&self, blog: &str, selection: FetchSelection) -> Result<Vec<Value>, ApiError> {
        let mut posts = vec![];
        if selection.published {
            posts.extend(self.get_posts(blog, selection.authenticate).await?);
        }
        if selection.drafts {
            posts.extend(self.get_drafts(blog).await?);
        }
        if selection.queued {
            posts.extend(self.get_queue(blog).await?);
        }
        Ok(posts)
    }

    pub async fn get_posts(&self, blog: &str, authenticate: bool) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(blog, "posts");
        let token = if authenticate { Some(self.token("posts with authentication")?) } else { None };

        let mut posts: Vec<Value> = vec![];
        loop {
            let query = vec![
                ("npf", "true".to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", posts.len().to_string()),
            ];
            let page = self.get_page(&url, &query, token).await?;
            if page.posts.is_empty() {
                break;
            }
            posts.extend(page.posts);
            info!(logger: self.logger, "Read {} posts of {}", posts.len(), page.total_posts.unwrap_or_default());

            if let Some(total) = page.total_posts {
                if posts.len() as u64 >= total {
                    break;
                }
            }
        }
        Ok(posts)
    }

    pub async fn get_drafts(&self, blog: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(blog, "posts/draft");
        let token = self.token("drafts")?;

        let mut posts: Vec<Value> = vec![];
        let mut before_id: Option<String> = None;
        loop {
            let mut query = vec![("npf", "true".to_string())];
            if let Some(ref id) = before_id {
                query.push(("before_id", id.clone()));
            }
            let page = self.get_page(&url, &query, Some(token)).await?;
            let Some(last_id) = page.posts.last().and_then(post_id) else {
                break;
            };
            before_id = Some(last_id);
            posts.extend(page.posts);
            info!(logger: self.logger, "Read {} drafts", posts.len());
        }
        Ok(posts)
    }

    pub async fn get_queue(&self, blog: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(blog, "posts/queue");
        let token = self.token("queued posts")?;

        let mut posts: Vec<Value> = vec![];
        loop {
            let query = vec![
                ("npf", "true".to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", posts.len().to_string()),
            ];
            let page = self.get_page(&url, &query, Some(token)).await?;
            if page.posts.is_empty() {
                break;
            }
            posts.extend(page.posts);
            info!(logger: self.logger, "Read {} queued posts", posts.len());
        }
        Ok(posts)
    }

    async fn get_page(&self, url: &str, query: &[(&str, String)], token: Option<&str>) -> Result<PostsPage, ApiError> {
        let mut last_err = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = RETRY_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(logger: self.logger, "{}: retry {}/{} after {}ms", url, attempt, MAX_RETRIES, backoff);
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.request_page(url, query, token).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() => {
                    warn!(logger: self.logger, "{}: attempt {} failed - {}", url, attempt + 1, e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ApiError::Request {
            url: url.to_string(),
            reason: "no attempt made".to_string(),
        }))
    }

    async fn request_page(&self, url: &str, query: &[(&str, String)], token: Option<&str>) -> Result<PostsPage, ApiError> {
        debug!(logger: self.logger, "GET {} {:?}", url, query);

        let mut request = self.http.get(url)
            .query(&[("api_key", self.credentials.consumer_key.as_str())])
            .query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ApiError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| ApiError::Response {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(envelope.response)
    }
}

/// Post id as a string, preferring `id_string` since ids do not always fit in a double.
fn post_id(post: &Value) -> Option<String> {
    if let Some(id) = post.get("id_string").and_then(Value::as_str) {
        return Some(id.to_string());
    }
    post.get("id").and_then(|id| match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    })
}
