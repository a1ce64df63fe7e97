//! Post model for Quill.

use crate::db::UserSummary;

use super::comment::CommentDetails;

/// Post entity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    /// Unique post ID.
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: String,
    /// Public URL of the thumbnail.
    pub thumbnail: Option<String>,
    /// Storage key of the thumbnail.
    pub thumbnail_key: Option<String>,
    /// ID of the user who created the post.
    pub author_id: i64,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    /// Check if `user_id` wrote this post.
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// Data for creating a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub category: String,
    pub author_id: i64,
}

impl NewPost {
    pub fn new(title: impl Into<String>, category: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            author_id,
        }
    }
}

/// Partial update of a post. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnail_key: Option<String>,
}

impl PostUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the thumbnail URL and its storage key.
    pub fn thumbnail(mut self, url: impl Into<String>, key: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self.thumbnail_key = Some(key.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.thumbnail.is_none()
            && self.thumbnail_key.is_none()
    }
}

/// A post together with its author, like-set and comments.
#[derive(Debug, Clone)]
pub struct PostDetails {
    pub post: Post,
    pub author: UserSummary,
    /// IDs of users who liked the post, in the order they liked it.
    pub likes: Vec<i64>,
    /// Comments, newest first.
    pub comments: Vec<CommentDetails>,
}

impl PostDetails {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.likes.contains(&user_id)
    }
}

/// Post and like totals for one author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikesSummary {
    pub total_posts: i64,
    pub total_likes: i64,
}
