//! Comment repository for Quill.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::comment::{Comment, NewComment};
use crate::{QuillError, Result};

/// Maximum comment length (in characters).
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Repository for comment CRUD operations.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new CommentRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment on an existing post.
    ///
    /// The existence check and the insert are one statement, so a comment
    /// cannot be attached to a post deleted concurrently.
    pub async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let content = new_comment.content.trim();
        if content.is_empty() {
            return Err(QuillError::Validation(
                "comment content is required".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(QuillError::Validation(format!(
                "comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let result = sqlx::query(
            "INSERT INTO comments (post_id, user_id, content)
             SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?1)",
        )
        .bind(new_comment.post_id)
        .bind(new_comment.user_id)
        .bind(content)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QuillError::NotFound("post".to_string()));
        }

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| QuillError::NotFound("comment".to_string()))
    }

    /// Get a comment by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, user_id, content, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(comment)
    }

    /// List comments of a post, newest first.
    ///
    /// Only comments whose post still exists are returned.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.post_id, c.user_id, c.content, c.created_at
             FROM comments c
             JOIN posts p ON p.id = c.post_id
             WHERE c.post_id = ?
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;
        Ok(comments)
    }

    /// Comments for many posts at once, keyed by post ID, newest first.
    pub async fn list_for_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Comment>>> {
        let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(grouped);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT c.id, c.post_id, c.user_id, c.content, c.created_at
             FROM comments c
             JOIN posts p ON p.id = c.post_id
             WHERE c.post_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in post_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY c.created_at DESC, c.id DESC");

        let comments: Vec<Comment> = query.build_query_as().fetch_all(self.pool).await?;
        for comment in comments {
            grouped.entry(comment.post_id).or_default().push(comment);
        }
        Ok(grouped)
    }

    /// Delete a comment by ID.
    ///
    /// Returns true if a comment was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every comment of a post.
    pub async fn delete_by_post(&self, post_id: i64) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        delete_comments_of_post(&mut *conn, post_id).await
    }

    /// Delete comments whose post no longer exists.
    pub async fn purge_orphans(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM comments WHERE post_id NOT IN (SELECT id FROM posts)")
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

/// Delete every comment of a post on the given connection.
///
/// Used inside the post deletion transaction.
pub(crate) async fn delete_comments_of_post(
    conn: &mut SqliteConnection,
    post_id: i64,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
