use serde::{Deserialize, Deserializer};

use crate::text_utils::file_type;

/// Remote file that has to be copied next to the rendered post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub source_url: String,
    pub local_file_name: String,
}

impl MediaRef {
    /// Local file is named after the block id, keeping the remote extension.
    pub fn new(block_id: &str, source_url: &str) -> MediaRef {
        let local_file_name = match file_type(source_url) {
            Some(ext) => format!("{}.{}", block_id, ext),
            None => block_id.to_string(),
        };

        MediaRef {
            source_url: source_url.to_string(),
            local_file_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaDescription {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub has_original_dimensions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PosterImage {
    pub url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

// The API is not consistent about lists: some blocks send a single object where a
// list is expected, and the other way round.

/// Accepts a list, a single object (list of one) or null.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
{
    let value = Option::<OneOrMany<T>>::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => vec![],
    })
}

/// Accepts a single object, a list (first element) or null.
pub fn object_or_first<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
{
    let value = Option::<OneOrMany<T>>::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::Many(items)) => items.into_iter().next(),
        Some(OneOrMany::One(item)) => Some(item),
        None => None,
    })
}
