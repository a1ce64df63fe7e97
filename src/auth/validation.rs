//! Input validation for Quill user registration.
//!
//! This module provides validation functions for names, passwords
//! and email addresses.

use thiserror::Error;

use super::password::MIN_PASSWORD_LENGTH;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 64;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// Name is too long.
    #[error("{0} must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong(&'static str),

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

/// Require a non-blank value for the named field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Validate a first or last name.
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    require(field, name)?;
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong(field));
    }
    Ok(())
}

/// Validate a registration password.
pub fn validate_registration_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// Validate an email address.
///
/// Accepts `local@domain.tld` where the local part uses letters, digits
/// and `._%+-`, the domain uses letters, digits and `.-`, and the final
/// label is at least two ASCII letters.
///
/// # Examples
///
/// ```
/// use quill::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("user@example.c").is_err());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || !local.chars().all(is_local_char) {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if !domain.chars().all(is_domain_char) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    // The top-level label is everything after the last dot.
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if host.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate all registration fields at once.
///
/// Returns the first validation error encountered, or Ok if all fields are valid.
pub fn validate_registration(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    validate_name("first name", first_name)?;
    validate_name("last name", last_name)?;
    validate_email(email)?;
    validate_registration_password(password)?;
    Ok(())
}
