//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity. Listings are ordered by `published_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub published_at: DateTime<Utc>,
}

/// Comment joined with the names shown in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentWithMeta {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
    pub post_title: String,
}

impl std::fmt::Display for CommentWithMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} under {}", self.author_username, self.post_title)
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    /// Defaults to now
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl CreateCommentInput {
    pub fn new(post_id: i64, author_id: i64, text: &str) -> Self {
        Self {
            post_id,
            author_id,
            text: text.to_string(),
            published_at: None,
        }
    }
}

/// Input for updating a comment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCommentInput {
    pub post_id: Option<i64>,
    pub author_id: Option<i64>,
    pub text: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_with_meta_display() {
        let meta = CommentWithMeta {
            comment: Comment {
                id: 1,
                post_id: 2,
                author_id: 3,
                text: "Nice".into(),
                published_at: Utc::now(),
            },
            author_username: "alice".into(),
            post_title: "Hello".into(),
        };
        assert_eq!(meta.to_string(), "alice under Hello");

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["post_id"], 2);
        assert_eq!(json["author_username"], "alice");
    }

    #[test]
    fn test_create_input_defaults_published_at() {
        let input: CreateCommentInput =
            serde_json::from_str(r#"{"post_id":1,"author_id":2,"text":"hi"}"#).unwrap();
        assert!(input.published_at.is_none());
        assert_eq!(input.text, "hi");
    }
}
