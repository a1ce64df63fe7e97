//! Post repository for Quill.
//!
//! This module provides CRUD operations for posts and their like-sets.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::comment_repository::delete_comments_of_post;
use super::post::{NewPost, Post, PostUpdate};
use crate::{QuillError, Result};

const POST_COLUMNS: &str = "id, title, subtitle, description, category, thumbnail, thumbnail_key,
    author_id, is_published, created_at, updated_at";

/// Repository for post CRUD operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post. New posts are unpublished.
    ///
    /// Returns the created post with the assigned ID.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (title, category, author_id, is_published) VALUES (?, ?, ?, 0)",
        )
        .bind(&new_post.title)
        .bind(&new_post.category)
        .bind(new_post.author_id)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| QuillError::NotFound("post".to_string()))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }

    /// Update a post by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated post, or None if not found.
    pub async fn update(&self, id: i64, update: &PostUpdate) -> Result<Option<Post>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = query.separated(", ");

        let columns = [
            ("title", &update.title),
            ("subtitle", &update.subtitle),
            ("description", &update.description),
            ("category", &update.category),
            ("thumbnail", &update.thumbnail),
            ("thumbnail_key", &update.thumbnail_key),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value.clone());
            }
        }
        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Flip the publish flag in a single statement.
    ///
    /// Returns the new flag, or None if the post does not exist.
    pub async fn toggle_publish(&self, id: i64) -> Result<Option<bool>> {
        let published: Option<bool> = sqlx::query_scalar(
            "UPDATE posts SET is_published = NOT is_published, updated_at = datetime('now')
             WHERE id = ? RETURNING is_published",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(published)
    }

    /// Delete a post with its comments and likes in one transaction.
    ///
    /// Returns true if a post was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        delete_comments_of_post(&mut *tx, id).await?;
        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Add a user to the post's like-set. Liking twice has no effect.
    ///
    /// Returns `NotFound` if the post does not exist.
    pub async fn like(&self, post_id: i64, user_id: i64) -> Result<()> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_likes (post_id, user_id)
             SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?1)",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 && !self.exists(post_id).await? {
            return Err(QuillError::NotFound("post".to_string()));
        }
        Ok(())
    }

    async fn exists(&self, post_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?)")
            .bind(post_id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Remove a user from the post's like-set. Unliking twice has no effect.
    pub async fn unlike(&self, post_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// IDs of users who liked a post, in like order.
    pub async fn like_user_ids(&self, post_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT user_id FROM post_likes WHERE post_id = ? ORDER BY rowid")
            .bind(post_id)
            .fetch_all(self.pool)
            .await?;
        Ok(ids)
    }

    /// Like-sets for many posts at once, keyed by post ID.
    ///
    /// Posts without likes are absent from the map.
    pub async fn likes_for_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        let mut likes: HashMap<i64, Vec<i64>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(likes);
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id, user_id FROM post_likes WHERE post_id IN (");
        let mut separated = query.separated(", ");
        for id in post_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY rowid");

        let rows: Vec<(i64, i64)> = query.build_query_as().fetch_all(self.pool).await?;
        for (post_id, user_id) in rows {
            likes.entry(post_id).or_default().push(user_id);
        }
        Ok(likes)
    }

    /// List every post, newest first.
    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// List published posts, newest first.
    pub async fn list_published(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_published = 1
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// List posts by an author, newest first.
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(author_id)
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// Count an author's posts and the likes they have received.
    pub async fn aggregate_likes_for_author(&self, author_id: i64) -> Result<(i64, i64)> {
        let totals: (i64, i64) = sqlx::query_as(
            "SELECT
                 (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
                 (SELECT COUNT(*) FROM post_likes l
                  JOIN posts p ON p.id = l.post_id
                  WHERE p.author_id = ?1)",
        )
        .bind(author_id)
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// Delete likes whose post no longer exists.
    pub async fn purge_orphan_likes(&self) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM post_likes WHERE post_id NOT IN (SELECT id FROM posts)")
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice@example.com", "h", "Alice", "A"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob@example.com", "h", "Bob", "B"))
            .await
            .unwrap();
        (db, alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_create_post_unpublished() {
        let (db, alice, _) = setup().await;
        let repo = PostRepository::new(db.pool());

        let post = repo.create(&NewPost::new("Hello", "tech", alice)).await.unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.category, "tech");
        assert_eq!(post.author_id, alice);
        assert!(!post.is_published);
        assert!(post.thumbnail.is_none());
        assert!(repo.like_user_ids(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_partial() {
        let (db, alice, _) = setup().await;
        let repo = PostRepository::new(db.pool());
        let post = repo.create(&NewPost::new("Hello", "tech", alice)).await.unwrap();

        let updated = repo
            .update(post.id, &PostUpdate::new().subtitle("Sub"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.subtitle.as_deref(), Some("Sub"));
        assert_eq!(updated.title, "Hello");

        assert!(repo
            .update(999, &PostUpdate::new().title("x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_toggle_publish() {
        let (db, alice, _) = setup().await;
        let repo = PostRepository::new(db.pool());
        let post = repo.create(&NewPost::new("Hello", "tech", alice)).await.unwrap();

        assert_eq!(repo.toggle_publish(post.id).await.unwrap(), Some(true));
        assert_eq!(repo.toggle_publish(post.id).await.unwrap(), Some(false));
        assert_eq!(repo.toggle_publish(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let (db, alice, bob) = setup().await;
        let repo = PostRepository::new(db.pool());
        let post = repo.create(&NewPost::new("Hello", "tech", alice)).await.unwrap();

        repo.like(post.id, bob).await.unwrap();
        repo.like(post.id, bob).await.unwrap();
        assert_eq!(repo.like_user_ids(post.id).await.unwrap(), vec![bob]);

        repo.like(post.id, alice).await.unwrap();
        assert_eq!(repo.like_user_ids(post.id).await.unwrap(), vec![bob, alice]);

        repo.unlike(post.id, bob).await.unwrap();
        repo.unlike(post.id, bob).await.unwrap();
        assert_eq!(repo.like_user_ids(post.id).await.unwrap(), vec![alice]);
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let (db, _, bob) = setup().await;
        let repo = PostRepository::new(db.pool());

        assert!(matches!(
            repo.like(999, bob).await,
            Err(QuillError::NotFound(_))
        ));
        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_all_kept() {
        const LIKERS: usize = 16;

        let temp = tempfile::tempdir().unwrap();
        let db = Database::open(temp.path().join("quill.db")).await.unwrap();
        let users = UserRepository::new(db.pool());
        let author = users
            .create(&NewUser::new("author@example.com", "h", "Ada", "A"))
            .await
            .unwrap();
        let mut liker_ids = Vec::with_capacity(LIKERS);
        for i in 0..LIKERS {
            let user = users
                .create(&NewUser::new(format!("user{i}@example.com"), "h", "User", "U"))
                .await
                .unwrap();
            liker_ids.push(user.id);
        }
        let post = PostRepository::new(db.pool())
            .create(&NewPost::new("Popular", "tech", author.id))
            .await
            .unwrap();

        let post_id = post.id;
        let mut tasks = tokio::task::JoinSet::new();
        for &user_id in &liker_ids {
            let pool = db.pool().clone();
            tasks.spawn(async move { PostRepository::new(&pool).like(post_id, user_id).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let mut liked = PostRepository::new(db.pool())
            .like_user_ids(post_id)
            .await
            .unwrap();
        liked.sort_unstable();
        assert_eq!(liked, liker_ids);
    }

    #[tokio::test]
    async fn test_likes_for_posts() {
        let (db, alice, bob) = setup().await;
        let repo = PostRepository::new(db.pool());
        let p1 = repo.create(&NewPost::new("One", "a", alice)).await.unwrap();
        let p2 = repo.create(&NewPost::new("Two", "a", alice)).await.unwrap();
        repo.like(p1.id, bob).await.unwrap();
        repo.like(p1.id, alice).await.unwrap();

        let likes = repo.likes_for_posts(&[p1.id, p2.id]).await.unwrap();
        assert_eq!(likes.get(&p1.id), Some(&vec![bob, alice]));
        assert!(likes.get(&p2.id).is_none());
        assert!(repo.likes_for_posts(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_queries() {
        let (db, alice, bob) = setup().await;
        let repo = PostRepository::new(db.pool());
        let p1 = repo.create(&NewPost::new("One", "a", alice)).await.unwrap();
        let p2 = repo.create(&NewPost::new("Two", "a", bob)).await.unwrap();
        let p3 = repo.create(&NewPost::new("Three", "a", alice)).await.unwrap();
        repo.toggle_publish(p1.id).await.unwrap();
        repo.toggle_publish(p2.id).await.unwrap();

        let all: Vec<i64> = repo.list_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![p3.id, p2.id, p1.id]);

        let published: Vec<i64> = repo
            .list_published()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(published, vec![p2.id, p1.id]);

        let mine: Vec<i64> = repo
            .list_by_author(alice)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(mine, vec![p3.id, p1.id]);
    }

    #[tokio::test]
    async fn test_aggregate_likes_for_author() {
        let (db, alice, bob) = setup().await;
        let repo = PostRepository::new(db.pool());
        assert_eq!(repo.aggregate_likes_for_author(alice).await.unwrap(), (0, 0));

        let p1 = repo.create(&NewPost::new("One", "a", alice)).await.unwrap();
        let p2 = repo.create(&NewPost::new("Two", "a", alice)).await.unwrap();
        repo.create(&NewPost::new("Bob's", "a", bob)).await.unwrap();
        repo.like(p1.id, bob).await.unwrap();
        repo.like(p1.id, alice).await.unwrap();
        repo.like(p2.id, bob).await.unwrap();

        assert_eq!(repo.aggregate_likes_for_author(alice).await.unwrap(), (2, 3));
        assert_eq!(repo.aggregate_likes_for_author(bob).await.unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (db, alice, bob) = setup().await;
        let repo = PostRepository::new(db.pool());
        let post = repo.create(&NewPost::new("Hello", "tech", alice)).await.unwrap();
        repo.like(post.id, bob).await.unwrap();
        sqlx::query("INSERT INTO comments (post_id, user_id, content) VALUES (?, ?, 'hi')")
            .bind(post.id)
            .bind(bob)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(repo.delete(post.id).await.unwrap());
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());

        let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!((comments, likes), (0, 0));

        assert!(!repo.delete(post.id).await.unwrap());
    }
}
