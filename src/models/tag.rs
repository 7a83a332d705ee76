//! Tag model
//!
//! Tag titles are stored lowercase and are unique. Normalization happens in
//! [`Tag::normalize_title`], which every write path calls before validation.

use serde::{Deserialize, Serialize};

/// Maximum length of a tag title, in characters
pub const TAG_TITLE_MAX_LEN: usize = 20;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Lowercase title (unique)
    pub title: String,
}

impl Tag {
    /// Create a new tag. The ID is assigned by the database.
    pub fn new(title: &str) -> Self {
        Self {
            id: 0,
            title: Self::normalize_title(title),
        }
    }

    /// Trim and lowercase a title.
    pub fn normalize_title(title: &str) -> String {
        title.trim().to_lowercase()
    }

    /// Public URL of the tag's post list
    pub fn absolute_url(&self) -> String {
        format!("/tag/{}", self.title)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Tag annotated with the number of posts carrying it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub posts_count: i64,
}

impl TagWithCount {
    pub fn new(tag: Tag, posts_count: i64) -> Self {
        Self { tag, posts_count }
    }
}

/// Input for creating or renaming a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInput {
    pub title: String,
}
