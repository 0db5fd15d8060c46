use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::content::ContentBlock;
use crate::util::api_date::ApiDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    Published,
    Private,
    Draft,
    Queued,
    #[serde(other)]
    Unknown,
}

impl Display for PostState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            PostState::Published => "published",
            PostState::Private => "private",
            PostState::Draft => "draft",
            PostState::Queued => "queued",
            PostState::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Blog {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Post this one was reblogged from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReblogTrailEntry {
    #[serde(default)]
    pub blog: Option<Blog>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Post in the Neue Post Format, as returned by the API with `npf=true`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub slug: Option<String>,
    pub state: PostState,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub trail: Vec<ReblogTrailEntry>,
    #[serde(default)]
    pub original_type: String,
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let ApiDate(date) = ApiDate::deserialize(deserializer)?;
    Ok(date)
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, date={}, state={}, blocks={}, trail={}",
               self.id,
               self.date,
               self.state,
               self.content.len(),
               self.trail.len()
        )
    }
}

impl Post {
    pub fn from_value(value: Value) -> serde_json::Result<Post> {
        serde_json::from_value(value)
    }

    pub fn is_reblog(&self) -> bool {
        !self.trail.is_empty()
    }
}
