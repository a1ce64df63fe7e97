//! Login for Quill.

use tracing::{info, warn};

use crate::auth::session::SessionKeys;
use crate::auth::verify_password;
use crate::db::{Database, User, UserRepository};
use crate::{QuillError, Result};

/// Message returned for every credential failure.
pub const INVALID_CREDENTIALS: &str = "incorrect email or password";

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Signed session token.
    pub token: String,
}

/// Check credentials and issue a session token.
///
/// Unknown email and wrong password fail with the same error.
pub async fn login(
    db: &Database,
    keys: &SessionKeys,
    email: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(QuillError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let repo = UserRepository::new(db.pool());
    let Some(user) = repo.get_by_email(email).await? else {
        warn!(email = %email, "login failed: unknown email");
        return Err(QuillError::Auth(INVALID_CREDENTIALS.to_string()));
    };

    if verify_password(password, &user.password).is_err() {
        warn!(email = %email, user_id = user.id, "login failed: wrong password");
        return Err(QuillError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    let token = keys.issue(&user)?;
    info!(user_id = user.id, email = %user.email, "login successful");

    Ok(LoginOutcome { user, token })
}
