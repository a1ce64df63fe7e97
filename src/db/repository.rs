//! User repository for Quill.
//!
//! This module provides CRUD operations for users in the database.

use std::collections::HashMap;

use sqlx::{QueryBuilder, SqlitePool};

use super::user::{NewUser, Role, User, UserSummary, UserUpdate};
use crate::{QuillError, Result};

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, role, bio, occupation,
    instagram, facebook, linkedin, github, photo_url, photo_key, created_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns `Conflict` if the email is already registered.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password, first_name, last_name, role)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.role.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                QuillError::Conflict("email already exists".to_string())
            }
            _ => QuillError::Database(e.to_string()),
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| QuillError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        let text_columns = [
            ("first_name", &update.first_name),
            ("last_name", &update.last_name),
            ("bio", &update.bio),
            ("occupation", &update.occupation),
            ("instagram", &update.instagram),
            ("facebook", &update.facebook),
            ("linkedin", &update.linkedin),
            ("github", &update.github),
            ("photo_url", &update.photo_url),
            ("photo_key", &update.photo_key),
        ];
        for (column, value) in text_columns {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value.clone());
            }
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// List all users, oldest first.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Public summaries for a set of users, keyed by ID.
    ///
    /// Unknown IDs are absent from the map.
    pub async fn get_summaries(&self, ids: &[i64]) -> Result<HashMap<i64, UserSummary>> {
        let mut summaries = HashMap::new();
        if ids.is_empty() {
            return Ok(summaries);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, first_name, last_name, photo_url FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(i64, String, String, Option<String>)> =
            query.build_query_as().fetch_all(self.pool).await?;
        for (id, first_name, last_name, photo_url) in rows {
            summaries.insert(
                id,
                UserSummary {
                    id,
                    first_name,
                    last_name,
                    photo_url,
                },
            );
        }
        Ok(summaries)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Internal struct for mapping database rows to User.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    role: String,
    bio: Option<String>,
    occupation: Option<String>,
    instagram: Option<String>,
    facebook: Option<String>,
    linkedin: Option<String>,
    github: Option<String>,
    photo_url: Option<String>,
    photo_key: Option<String>,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role.parse().unwrap_or(Role::Member),
            bio: self.bio,
            occupation: self.occupation,
            instagram: self.instagram,
            facebook: self.facebook,
            linkedin: self.linkedin,
            github: self.github,
            photo_url: self.photo_url,
            photo_key: self.photo_key,
            created_at: self.created_at,
        }
    }
}
