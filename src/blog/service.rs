//! Blog service for Quill.
//!
//! High-level post and comment operations with ownership checks, asset
//! handling and population of authors, likes and comments.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::auth::permission::{require_any_owner, require_owner};
use crate::db::{Database, UserRepository, UserSummary};
use crate::storage::{discard, ObjectStore, Upload, THUMBNAIL_PREFIX};
use crate::{QuillError, Result};

use super::comment::{Comment, CommentDetails, NewComment};
use super::comment_repository::CommentRepository;
use super::post::{LikesSummary, NewPost, Post, PostDetails, PostUpdate};
use super::post_repository::PostRepository;

/// Maximum length for post titles (in characters).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for post descriptions (in characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 100_000;

fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(QuillError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Editable fields of a post. Empty values are ignored.
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl PostEdit {
    fn into_update(self) -> Result<PostUpdate> {
        let title = non_empty(self.title);
        if let Some(title) = &title {
            validate_title(title)?;
        }
        let description = non_empty(self.description);
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(QuillError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        Ok(PostUpdate {
            title,
            subtitle: non_empty(self.subtitle),
            description,
            category: non_empty(self.category),
            ..Default::default()
        })
    }
}

/// Service for post and comment operations.
pub struct BlogService<'a> {
    db: &'a Database,
    store: &'a dyn ObjectStore,
}

impl<'a> BlogService<'a> {
    /// Create a new BlogService over a database and an object store.
    pub fn new(db: &'a Database, store: &'a dyn ObjectStore) -> Self {
        Self { db, store }
    }

    fn posts(&self) -> PostRepository<'_> {
        PostRepository::new(self.db.pool())
    }

    fn comments(&self) -> CommentRepository<'_> {
        CommentRepository::new(self.db.pool())
    }

    async fn require_post(&self, post_id: i64) -> Result<Post> {
        self.posts()
            .get_by_id(post_id)
            .await?
            .ok_or_else(|| QuillError::NotFound("post".to_string()))
    }

    // ========== Posts ==========

    /// Create an unpublished post with an empty like-set.
    pub async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        category: &str,
    ) -> Result<PostDetails> {
        let (title, category) = (title.trim(), category.trim());
        if title.is_empty() || category.is_empty() {
            return Err(QuillError::Validation(
                "post title and category are required".to_string(),
            ));
        }
        validate_title(title)?;

        let post = self
            .posts()
            .create(&NewPost::new(title, category, author_id))
            .await?;
        info!(post_id = post.id, user_id = author_id, "post created");

        self.populate_one(post).await
    }

    /// Get a single post with its author, likes and comments.
    pub async fn get_post(&self, post_id: i64) -> Result<PostDetails> {
        let post = self.require_post(post_id).await?;
        self.populate_one(post).await
    }

    /// Update a post's fields and optionally replace its thumbnail.
    ///
    /// Only the author may update. A new thumbnail is uploaded before the
    /// row is written; the replaced object is deleted afterwards.
    pub async fn update_post(
        &self,
        post_id: i64,
        requester_id: i64,
        edit: PostEdit,
        thumbnail: Option<Upload>,
    ) -> Result<PostDetails> {
        let current = self.require_post(post_id).await?;
        require_owner(requester_id, current.author_id, "post")?;
        let mut update = edit.into_update()?;

        let uploaded = match thumbnail {
            Some(upload) => {
                let stored = upload.store(self.store, THUMBNAIL_PREFIX).await?;
                update = update.thumbnail(stored.url.clone(), stored.key.clone());
                Some(stored)
            }
            None => None,
        };

        let updated = match self.posts().update(post_id, &update).await {
            Ok(Some(post)) => post,
            other => {
                if let Some(stored) = &uploaded {
                    discard(self.store, &stored.key).await;
                }
                return Err(match other {
                    Err(e) => e,
                    _ => QuillError::NotFound("post".to_string()),
                });
            }
        };

        if uploaded.is_some() {
            if let Some(old_key) = current.thumbnail_key.as_deref() {
                discard(self.store, old_key).await;
            }
        }

        info!(post_id, user_id = requester_id, thumbnail = uploaded.is_some(), "post updated");
        self.populate_one(updated).await
    }

    /// Flip the publish flag. Only the author may publish.
    ///
    /// Returns the resulting flag.
    pub async fn toggle_publish(&self, post_id: i64, requester_id: i64) -> Result<bool> {
        let post = self.require_post(post_id).await?;
        require_owner(requester_id, post.author_id, "post")?;

        let published = self
            .posts()
            .toggle_publish(post_id)
            .await?
            .ok_or_else(|| QuillError::NotFound("post".to_string()))?;

        info!(post_id, published, "post publish state changed");
        Ok(published)
    }

    /// Delete a post with its comments and likes. Only the author may delete.
    pub async fn delete_post(&self, post_id: i64, requester_id: i64) -> Result<()> {
        let post = self.require_post(post_id).await?;
        if let Err(e) = require_owner(requester_id, post.author_id, "post") {
            warn!(post_id, user_id = requester_id, "unauthorized post deletion attempt");
            return Err(e);
        }

        if !self.posts().delete(post_id).await? {
            return Err(QuillError::NotFound("post".to_string()));
        }

        if let Some(key) = post.thumbnail_key.as_deref() {
            discard(self.store, key).await;
        }

        info!(post_id, user_id = requester_id, "post deleted");
        Ok(())
    }

    /// Add the user to the post's like-set.
    pub async fn like(&self, post_id: i64, user_id: i64) -> Result<PostDetails> {
        self.posts().like(post_id, user_id).await?;
        let post = self.require_post(post_id).await?;
        self.populate_one(post).await
    }

    /// Remove the user from the post's like-set.
    pub async fn unlike(&self, post_id: i64, user_id: i64) -> Result<PostDetails> {
        let post = self.require_post(post_id).await?;
        self.posts().unlike(post_id, user_id).await?;
        self.populate_one(post).await
    }

    /// Every post, newest first.
    pub async fn list_all(&self) -> Result<Vec<PostDetails>> {
        let posts = self.posts().list_all().await?;
        self.populate(posts).await
    }

    /// Published posts, newest first.
    pub async fn list_published(&self) -> Result<Vec<PostDetails>> {
        let posts = self.posts().list_published().await?;
        self.populate(posts).await
    }

    /// Posts by one author, newest first.
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<PostDetails>> {
        let posts = self.posts().list_by_author(author_id).await?;
        self.populate(posts).await
    }

    /// Post count and received likes for an author.
    pub async fn likes_summary(&self, author_id: i64) -> Result<LikesSummary> {
        let (total_posts, total_likes) =
            self.posts().aggregate_likes_for_author(author_id).await?;
        Ok(LikesSummary {
            total_posts,
            total_likes,
        })
    }

    // ========== Comments ==========

    /// Comment on a post.
    pub async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentDetails> {
        let comment = self
            .comments()
            .create(&NewComment::new(post_id, user_id, content))
            .await?;
        info!(comment_id = comment.id, post_id, user_id, "comment created");

        let mut details = self.attach_authors(vec![comment]).await?;
        details
            .pop()
            .ok_or_else(|| QuillError::NotFound("comment".to_string()))
    }

    /// Comments of a post, newest first.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentDetails>> {
        self.require_post(post_id).await?;
        let comments = self.comments().list_by_post(post_id).await?;
        self.attach_authors(comments).await
    }

    /// Delete a comment. Allowed for its author and the post's author.
    pub async fn delete_comment(&self, comment_id: i64, requester_id: i64) -> Result<()> {
        let comment = self
            .comments()
            .get_by_id(comment_id)
            .await?
            .ok_or_else(|| QuillError::NotFound("comment".to_string()))?;

        let mut owners = vec![comment.user_id];
        if let Some(post) = self.posts().get_by_id(comment.post_id).await? {
            owners.push(post.author_id);
        }
        require_any_owner(requester_id, &owners, "comment")?;

        if !self.comments().delete(comment_id).await? {
            return Err(QuillError::NotFound("comment".to_string()));
        }
        info!(comment_id, user_id = requester_id, "comment deleted");
        Ok(())
    }

    /// Remove comments and likes left behind by deleted posts.
    ///
    /// Returns `(comments, likes)` removed.
    pub async fn purge_orphans(&self) -> Result<(u64, u64)> {
        let comments = self.comments().purge_orphans().await?;
        let likes = self.posts().purge_orphan_likes().await?;
        if comments > 0 || likes > 0 {
            warn!(comments, likes, "purged orphaned post data");
        }
        Ok((comments, likes))
    }

    // ========== Population ==========

    async fn populate_one(&self, post: Post) -> Result<PostDetails> {
        let mut details = self.populate(vec![post]).await?;
        details
            .pop()
            .ok_or_else(|| QuillError::NotFound("post".to_string()))
    }

    async fn populate(&self, posts: Vec<Post>) -> Result<Vec<PostDetails>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut likes = self.posts().likes_for_posts(&post_ids).await?;
        let mut comments = self.comments().list_for_posts(&post_ids).await?;

        let user_ids: BTreeSet<i64> = posts
            .iter()
            .map(|p| p.author_id)
            .chain(comments.values().flatten().map(|c| c.user_id))
            .collect();
        let summaries = self.summaries(&user_ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let comments = comments
                    .remove(&post.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|comment| with_author(comment, &summaries))
                    .collect();
                PostDetails {
                    author: summary_for(post.author_id, &summaries),
                    likes: likes.remove(&post.id).unwrap_or_default(),
                    comments,
                    post,
                }
            })
            .collect())
    }

    async fn attach_authors(&self, comments: Vec<Comment>) -> Result<Vec<CommentDetails>> {
        let user_ids: BTreeSet<i64> = comments.iter().map(|c| c.user_id).collect();
        let summaries = self.summaries(&user_ids).await?;
        Ok(comments
            .into_iter()
            .map(|comment| with_author(comment, &summaries))
            .collect())
    }

    async fn summaries(&self, user_ids: &BTreeSet<i64>) -> Result<HashMap<i64, UserSummary>> {
        let ids: Vec<i64> = user_ids.iter().copied().collect();
        UserRepository::new(self.db.pool()).get_summaries(&ids).await
    }
}

fn summary_for(user_id: i64, summaries: &HashMap<i64, UserSummary>) -> UserSummary {
    summaries
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| UserSummary::unknown(user_id))
}

fn with_author(comment: Comment, summaries: &HashMap<i64, UserSummary>) -> CommentDetails {
    CommentDetails {
        author: summary_for(comment.user_id, summaries),
        comment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, User};
    use crate::storage::LocalObjectStore;
    use tempfile::TempDir;

    struct Fixture {
        db: Database,
        store: LocalObjectStore,
        _temp: TempDir,
        alice: User,
        bob: User,
    }

    impl Fixture {
        fn service(&self) -> BlogService<'_> {
            BlogService::new(&self.db, &self.store)
        }
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path(), "http://media.test").unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice@example.com", "h", "Alice", "Author"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob@example.com", "h", "Bob", "Reader"))
            .await
            .unwrap();
        Fixture {
            db,
            store,
            _temp: temp,
            alice,
            bob,
        }
    }

    fn thumbnail() -> Upload {
        Upload::new(b"jpeg bytes".to_vec(), "cover.jpg", "image/jpeg")
    }

    #[tokio::test]
    async fn test_create_post() {
        let fx = setup().await;
        let post = fx
            .service()
            .create_post(fx.alice.id, "Hello", "tech")
            .await
            .unwrap();

        assert!(!post.post.is_published);
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
        assert_eq!(post.author, fx.alice.summary());
    }

    #[tokio::test]
    async fn test_create_post_requires_title_and_category() {
        let fx = setup().await;
        let service = fx.service();
        for (title, category) in [("", "tech"), ("Hello", ""), ("  ", "  ")] {
            assert!(matches!(
                service.create_post(fx.alice.id, title, category).await,
                Err(QuillError::Validation(_))
            ));
        }
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_post_fields_and_thumbnail() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();

        let edit = PostEdit {
            subtitle: Some("Sub".to_string()),
            description: Some("<p>Body</p>".to_string()),
            ..Default::default()
        };
        let updated = service
            .update_post(post.post.id, fx.alice.id, edit, Some(thumbnail()))
            .await
            .unwrap();
        let first_key = updated.post.thumbnail_key.clone().unwrap();
        assert!(first_key.starts_with("thumbnails/"));
        assert_eq!(updated.post.subtitle.as_deref(), Some("Sub"));
        assert_eq!(updated.post.title, "Hello");

        // No file: thumbnail retained
        let edit = PostEdit {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let renamed = service
            .update_post(post.post.id, fx.alice.id, edit, None)
            .await
            .unwrap();
        assert_eq!(renamed.post.title, "Renamed");
        assert_eq!(renamed.post.thumbnail, updated.post.thumbnail);

        // New file: replaced, old object deleted
        let replaced = service
            .update_post(post.post.id, fx.alice.id, PostEdit::default(), Some(thumbnail()))
            .await
            .unwrap();
        assert_ne!(replaced.post.thumbnail, updated.post.thumbnail);
        assert!(!fx.store.exists(&first_key).await);
    }

    #[tokio::test]
    async fn test_update_post_by_other_user_denied() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();

        let edit = PostEdit {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let result = service.update_post(post.post.id, fx.bob.id, edit, None).await;
        assert!(matches!(result, Err(QuillError::Permission(_))));

        let unchanged = service.get_post(post.post.id).await.unwrap();
        assert_eq!(unchanged.post.title, "Hello");
        assert_eq!(unchanged.post.author_id, fx.alice.id);
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let fx = setup().await;
        let result = fx
            .service()
            .update_post(999, fx.alice.id, PostEdit::default(), None)
            .await;
        assert!(matches!(result, Err(QuillError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_publish_is_involution() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        let id = post.post.id;

        assert!(service.toggle_publish(id, fx.alice.id).await.unwrap());
        assert!(!service.toggle_publish(id, fx.alice.id).await.unwrap());
        assert!(!service.get_post(id).await.unwrap().post.is_published);

        assert!(matches!(
            service.toggle_publish(id, fx.bob.id).await,
            Err(QuillError::Permission(_))
        ));
        assert!(matches!(
            service.toggle_publish(999, fx.alice.id).await,
            Err(QuillError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_unlike() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        let id = post.post.id;

        let liked = service.like(id, fx.bob.id).await.unwrap();
        assert_eq!(liked.likes, vec![fx.bob.id]);
        let liked = service.like(id, fx.bob.id).await.unwrap();
        assert_eq!(liked.like_count(), 1);
        assert!(liked.is_liked_by(fx.bob.id));

        let unliked = service.unlike(id, fx.bob.id).await.unwrap();
        assert!(unliked.likes.is_empty());
        let unliked = service.unlike(id, fx.bob.id).await.unwrap();
        assert!(unliked.likes.is_empty());

        assert!(matches!(
            service.like(999, fx.bob.id).await,
            Err(QuillError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_post_by_non_author_keeps_everything() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        let id = post.post.id;
        service.add_comment(id, fx.bob.id, "Nice").await.unwrap();
        service.like(id, fx.bob.id).await.unwrap();

        assert!(matches!(
            service.delete_post(id, fx.bob.id).await,
            Err(QuillError::Permission(_))
        ));

        let kept = service.get_post(id).await.unwrap();
        assert_eq!(kept.comments.len(), 1);
        assert_eq!(kept.likes, vec![fx.bob.id]);
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        let id = post.post.id;
        let with_thumb = service
            .update_post(id, fx.alice.id, PostEdit::default(), Some(thumbnail()))
            .await
            .unwrap();
        let key = with_thumb.post.thumbnail_key.unwrap();
        service.add_comment(id, fx.bob.id, "Nice").await.unwrap();

        service.delete_post(id, fx.alice.id).await.unwrap();

        assert!(matches!(
            service.get_post(id).await,
            Err(QuillError::NotFound(_))
        ));
        assert!(CommentRepository::new(fx.db.pool())
            .list_by_post(id)
            .await
            .unwrap()
            .is_empty());
        assert!(!fx.store.exists(&key).await);
        assert!(matches!(
            service.delete_post(id, fx.alice.id).await,
            Err(QuillError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings_are_populated() {
        let fx = setup().await;
        let service = fx.service();
        let draft = service.create_post(fx.alice.id, "Draft", "a").await.unwrap();
        let public = service.create_post(fx.alice.id, "Public", "a").await.unwrap();
        let bobs = service.create_post(fx.bob.id, "Bob's", "b").await.unwrap();
        service.toggle_publish(public.post.id, fx.alice.id).await.unwrap();
        service.add_comment(public.post.id, fx.bob.id, "first").await.unwrap();
        service.add_comment(public.post.id, fx.alice.id, "second").await.unwrap();

        let published = service.list_published().await.unwrap();
        assert_eq!(published.len(), 1);
        let entry = &published[0];
        assert_eq!(entry.post.id, public.post.id);
        assert_eq!(entry.author.first_name, "Alice");
        assert_eq!(entry.comments.len(), 2);
        assert_eq!(entry.comments[0].comment.content, "second");
        assert_eq!(entry.comments[0].author.first_name, "Alice");
        assert_eq!(entry.comments[1].author.first_name, "Bob");

        let all: Vec<i64> = service
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|p| p.post.id)
            .collect();
        assert_eq!(all, vec![bobs.post.id, public.post.id, draft.post.id]);

        let mine = service.list_by_author(fx.alice.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.post.author_id == fx.alice.id));
    }

    #[tokio::test]
    async fn test_likes_summary() {
        let fx = setup().await;
        let service = fx.service();
        let p1 = service.create_post(fx.alice.id, "One", "a").await.unwrap();
        let p2 = service.create_post(fx.alice.id, "Two", "a").await.unwrap();
        service.like(p1.post.id, fx.bob.id).await.unwrap();
        service.like(p2.post.id, fx.bob.id).await.unwrap();
        service.like(p2.post.id, fx.alice.id).await.unwrap();

        let summary = service.likes_summary(fx.alice.id).await.unwrap();
        assert_eq!(
            summary,
            LikesSummary {
                total_posts: 2,
                total_likes: 3
            }
        );
        assert_eq!(
            service.likes_summary(fx.bob.id).await.unwrap(),
            LikesSummary::default()
        );
    }

    #[tokio::test]
    async fn test_comment_permissions() {
        let fx = setup().await;
        let service = fx.service();
        let users = UserRepository::new(fx.db.pool());
        let carol = users
            .create(&NewUser::new("carol@example.com", "h", "Carol", "C"))
            .await
            .unwrap();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        let id = post.post.id;

        let by_bob = service.add_comment(id, fx.bob.id, "one").await.unwrap();
        let by_bob_2 = service.add_comment(id, fx.bob.id, "two").await.unwrap();
        assert_eq!(by_bob.author, fx.bob.summary());

        // A third party may not delete
        assert!(matches!(
            service.delete_comment(by_bob.comment.id, carol.id).await,
            Err(QuillError::Permission(_))
        ));
        // The commenter may
        service.delete_comment(by_bob.comment.id, fx.bob.id).await.unwrap();
        // The post author may
        service.delete_comment(by_bob_2.comment.id, fx.alice.id).await.unwrap();

        assert!(service.list_comments(id).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_comment(by_bob.comment.id, fx.bob.id).await,
            Err(QuillError::NotFound(_))
        ));
        assert!(matches!(
            service.list_comments(999).await,
            Err(QuillError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_orphans_on_clean_database() {
        let fx = setup().await;
        let service = fx.service();
        let post = service.create_post(fx.alice.id, "Hello", "tech").await.unwrap();
        service.add_comment(post.post.id, fx.bob.id, "hi").await.unwrap();
        assert_eq!(service.purge_orphans().await.unwrap(), (0, 0));
    }
}
