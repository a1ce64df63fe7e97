//! User profile management for Quill.

use tracing::info;

use crate::auth::validation::{validate_name, MAX_NAME_LENGTH};
use crate::db::{Database, User, UserRepository, UserUpdate};
use crate::storage::{discard, ObjectStore, Upload, AVATAR_PREFIX};
use crate::{QuillError, Result};

/// Maximum length for the bio.
pub const MAX_BIO_LENGTH: usize = 1000;

/// Profile update request.
///
/// `None` and empty strings leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub occupation: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl ProfileUpdateRequest {
    /// Create a new empty update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new bio.
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    /// Set a new occupation.
    pub fn occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    fn into_update(self) -> Result<UserUpdate> {
        let first_name = non_empty(self.first_name);
        let last_name = non_empty(self.last_name);
        if let Some(name) = &first_name {
            validate_name("first name", name)?;
        }
        if let Some(name) = &last_name {
            validate_name("last name", name)?;
        }

        let bio = non_empty(self.bio);
        if bio
            .as_ref()
            .is_some_and(|b| b.chars().count() > MAX_BIO_LENGTH)
        {
            return Err(QuillError::Validation(format!(
                "bio must be at most {MAX_BIO_LENGTH} characters"
            )));
        }

        Ok(UserUpdate {
            first_name,
            last_name,
            bio,
            occupation: non_empty(self.occupation),
            instagram: non_empty(self.instagram),
            facebook: non_empty(self.facebook),
            linkedin: non_empty(self.linkedin),
            github: non_empty(self.github),
            ..Default::default()
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get a user by ID.
pub async fn get_profile(db: &Database, user_id: i64) -> Result<User> {
    UserRepository::new(db.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| QuillError::NotFound("user".to_string()))
}

/// Update a user's profile, optionally replacing the avatar.
///
/// The avatar is uploaded under `avatars/` before the row is written; the
/// previous avatar object is deleted only once the new one is recorded.
pub async fn update_profile(
    db: &Database,
    store: &dyn ObjectStore,
    user_id: i64,
    request: ProfileUpdateRequest,
    avatar: Option<Upload>,
) -> Result<User> {
    let current = get_profile(db, user_id).await?;
    let mut update = request.into_update()?;

    let uploaded = match avatar {
        Some(upload) => {
            let stored = upload.store(store, AVATAR_PREFIX).await?;
            update = update.photo(stored.url.clone(), stored.key.clone());
            Some(stored)
        }
        None => None,
    };

    let repo = UserRepository::new(db.pool());
    let updated = match repo.update(user_id, &update).await {
        Ok(Some(user)) => user,
        other => {
            if let Some(stored) = &uploaded {
                discard(store, &stored.key).await;
            }
            return Err(match other {
                Err(e) => e,
                _ => QuillError::NotFound("user".to_string()),
            });
        }
    };

    if uploaded.is_some() {
        if let Some(old_key) = current.photo_key.as_deref() {
            discard(store, old_key).await;
        }
    }

    info!(user_id, avatar = uploaded.is_some(), "profile updated");
    Ok(updated)
}

/// List all users.
pub async fn list_users(db: &Database) -> Result<Vec<User>> {
    UserRepository::new(db.pool()).list_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{register, RegistrationRequest};
    use crate::config::AdminConfig;
    use crate::storage::LocalObjectStore;
    use tempfile::TempDir;

    async fn setup() -> (Database, LocalObjectStore, TempDir, User) {
        let db = Database::open_in_memory().await.unwrap();
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path(), "http://media.test").unwrap();
        let user = register(
            &db,
            &AdminConfig::default(),
            None,
            RegistrationRequest::new("Ada", "Lovelace", "ada@example.com", "secret1"),
        )
        .await
        .unwrap();
        (db, store, temp, user)
    }

    fn png() -> Upload {
        Upload::new(b"\x89PNG avatar".to_vec(), "me.png", "image/png")
    }

    #[tokio::test]
    async fn test_update_fields_without_avatar() {
        let (db, store, _temp, user) = setup().await;

        let request = ProfileUpdateRequest::new()
            .bio("Analyst")
            .occupation("Mathematician");
        let updated = update_profile(&db, &store, user.id, request, None)
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("Analyst"));
        assert_eq!(updated.occupation.as_deref(), Some("Mathematician"));
        assert!(updated.photo_url.is_none());
        assert_eq!(updated.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_empty_fields_are_ignored() {
        let (db, store, _temp, user) = setup().await;
        update_profile(&db, &store, user.id, ProfileUpdateRequest::new().bio("x"), None)
            .await
            .unwrap();

        let request = ProfileUpdateRequest {
            bio: Some(String::new()),
            first_name: Some("  ".to_string()),
            ..Default::default()
        };
        let updated = update_profile(&db, &store, user.id, request, None)
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("x"));
        assert_eq!(updated.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_avatar_upload_and_replacement() {
        let (db, store, _temp, user) = setup().await;

        let first = update_profile(&db, &store, user.id, ProfileUpdateRequest::new(), Some(png()))
            .await
            .unwrap();
        let first_url = first.photo_url.clone().unwrap();
        let first_key = first.photo_key.clone().unwrap();
        assert!(first_key.starts_with("avatars/"));
        assert_eq!(first_url, format!("http://media.test/{first_key}"));
        assert!(store.exists(&first_key).await);

        // No file: avatar unchanged
        let same = update_profile(&db, &store, user.id, ProfileUpdateRequest::new().bio("b"), None)
            .await
            .unwrap();
        assert_eq!(same.photo_url.as_deref(), Some(first_url.as_str()));

        // New file: new URL, old object removed
        let second = update_profile(&db, &store, user.id, ProfileUpdateRequest::new(), Some(png()))
            .await
            .unwrap();
        assert_ne!(second.photo_url.as_deref(), Some(first_url.as_str()));
        assert!(!store.exists(&first_key).await);
        assert!(store.exists(second.photo_key.as_deref().unwrap()).await);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (db, store, _temp, _user) = setup().await;
        let result = update_profile(&db, &store, 999, ProfileUpdateRequest::new(), Some(png())).await;
        assert!(matches!(result, Err(QuillError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_name_validation() {
        let (db, store, _temp, user) = setup().await;
        let request = ProfileUpdateRequest {
            last_name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..Default::default()
        };
        let result = update_profile(&db, &store, user.id, request, None).await;
        assert!(matches!(result, Err(QuillError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_users() {
        let (db, _store, _temp, _user) = setup().await;
        let users = list_users(&db).await.unwrap();
        assert_eq!(users.len(), 1);
    }
}
