//! Quill - a small blogging backend
//!
//! Users register and log in, write posts, publish them, like and comment
//! on them. Avatars and thumbnails live in an object store, and new signups
//! are announced to the administrator.

pub mod auth;
pub mod blog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notify;
pub mod storage;
pub mod web;

pub use auth::{
    hash_password, login, register, verify_password, Claims, LoginOutcome, PasswordError,
    ProfileUpdateRequest, RegistrationRequest, SessionKeys,
};
pub use blog::{BlogService, Comment, Post, PostDetails};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{QuillError, Result};
pub use notify::{LogNotifier, Notifier};
pub use storage::{LoadedObject, LocalObjectStore, ObjectStore, SharedObjectStore};
