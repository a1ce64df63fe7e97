//! Blog module for Quill.
//!
//! This module provides:
//! - Posts with a publish flag and a like-set
//! - Comments attached to posts
//! - A service layer that checks ownership and manages thumbnails

mod comment;
mod comment_repository;
mod post;
mod post_repository;
mod service;

pub use comment::{Comment, CommentDetails, NewComment};
pub use comment_repository::{CommentRepository, MAX_COMMENT_LENGTH};
pub use post::{LikesSummary, NewPost, Post, PostDetails, PostUpdate};
pub use post_repository::PostRepository;
pub use service::{BlogService, PostEdit, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
