//! Ownership and role checks for Quill.

use crate::db::Role;
use crate::{QuillError, Result};

/// Require that `requester_id` owns the resource.
///
/// # Examples
///
/// ```
/// use quill::auth::permission::require_owner;
///
/// assert!(require_owner(1, 1, "post").is_ok());
/// assert!(require_owner(2, 1, "post").is_err());
/// ```
pub fn require_owner(requester_id: i64, owner_id: i64, resource: &str) -> Result<()> {
    if requester_id != owner_id {
        return Err(QuillError::Permission(format!(
            "only the author can modify this {resource}"
        )));
    }
    Ok(())
}

/// Require that `requester_id` is one of the allowed owners.
pub fn require_any_owner(requester_id: i64, owners: &[i64], resource: &str) -> Result<()> {
    if !owners.contains(&requester_id) {
        return Err(QuillError::Permission(format!(
            "you are not allowed to modify this {resource}"
        )));
    }
    Ok(())
}

/// Require the admin role.
pub fn require_admin(role: Role) -> Result<()> {
    if role != Role::Admin {
        return Err(QuillError::Permission(
            "administrator access required".to_string(),
        ));
    }
    Ok(())
}
