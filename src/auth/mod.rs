//! Authentication module for Quill.
//!
//! This module provides password hashing, session tokens,
//! user registration, login and profile management.

mod login;
mod password;
pub mod permission;
mod profile;
mod registration;
mod session;
pub mod validation;

pub use login::{login, LoginOutcome, INVALID_CREDENTIALS};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MIN_PASSWORD_LENGTH,
};
pub use profile::{get_profile, list_users, update_profile, ProfileUpdateRequest, MAX_BIO_LENGTH};
pub use registration::{register, RegistrationRequest};
pub use session::{
    clear_session_cookie, session_cookie, Claims, SessionKeys, DEFAULT_SESSION_DURATION_SECS,
    SESSION_COOKIE,
};
pub use validation::ValidationError;

use crate::QuillError;

impl From<ValidationError> for QuillError {
    fn from(e: ValidationError) -> Self {
        QuillError::Validation(e.to_string())
    }
}

impl From<PasswordError> for QuillError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => QuillError::Validation(e.to_string()),
            PasswordError::VerificationFailed => QuillError::Auth(e.to_string()),
            PasswordError::HashError(_) | PasswordError::InvalidHash => {
                QuillError::Internal(e.to_string())
            }
        }
    }
}
