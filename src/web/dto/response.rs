//! Response DTOs for Web API.

use serde::Serialize;

use crate::blog::{CommentDetails, LikesSummary, PostDetails};
use crate::db::{User, UserSummary};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always true.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response with an empty message.
    pub fn new(data: T) -> Self {
        Self::with_message("", data)
    }

    /// Create a new API response with a message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Response carrying only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always true.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ============================================================================
// User DTOs
// ============================================================================

/// User as exposed by the API. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub bio: Option<String>,
    pub occupation: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role.as_str().to_string(),
            bio: user.bio,
            occupation: user.occupation,
            instagram: user.instagram,
            facebook: user.facebook,
            linkedin: user.linkedin,
            github: user.github,
            photo_url: user.photo_url,
            created_at: user.created_at,
        }
    }
}

/// User list response (admin).
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// Aggregate likes across the caller's posts.
#[derive(Debug, Serialize)]
pub struct LikesSummaryResponse {
    /// Number of posts authored.
    pub total_blogs: i64,
    /// Sum of likes over those posts.
    pub total_likes: i64,
}

impl From<LikesSummary> for LikesSummaryResponse {
    fn from(summary: LikesSummary) -> Self {
        Self {
            total_blogs: summary.total_posts,
            total_likes: summary.total_likes,
        }
    }
}

// ============================================================================
// Post DTOs
// ============================================================================

/// Author or commenter info embedded in posts and comments.
#[derive(Debug, Serialize)]
pub struct AuthorInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

impl From<UserSummary> for AuthorInfo {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id,
            first_name: summary.first_name,
            last_name: summary.last_name,
            photo_url: summary.photo_url,
        }
    }
}

/// Comment response.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub author: AuthorInfo,
    pub created_at: String,
}

impl From<CommentDetails> for CommentResponse {
    fn from(details: CommentDetails) -> Self {
        Self {
            id: details.comment.id,
            post_id: details.comment.post_id,
            content: details.comment.content,
            author: details.author.into(),
            created_at: details.comment.created_at,
        }
    }
}

/// Post response with author, likes and comments.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub thumbnail: Option<String>,
    pub is_published: bool,
    pub author: AuthorInfo,
    /// IDs of the users who liked the post.
    pub likes: Vec<i64>,
    pub like_count: usize,
    pub comments: Vec<CommentResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PostDetails> for PostResponse {
    fn from(details: PostDetails) -> Self {
        let like_count = details.like_count();
        let post = details.post;
        Self {
            id: post.id,
            title: post.title,
            subtitle: post.subtitle,
            description: post.description,
            category: post.category,
            thumbnail: post.thumbnail,
            is_published: post.is_published,
            author: details.author.into(),
            likes: details.likes,
            like_count,
            comments: details.comments.into_iter().map(Into::into).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Publish toggle response.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub is_published: bool,
}
