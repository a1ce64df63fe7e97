//! User registration for Quill.

use tracing::{info, warn};

use crate::auth::hash_password;
use crate::auth::validation::validate_registration;
use crate::config::AdminConfig;
use crate::db::{Database, NewUser, Role, User, UserRepository};
use crate::notify::{dispatch_signup, SharedNotifier, SignupNotice};
use crate::{QuillError, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Plain-text password (at least 6 characters).
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks if the email already exists
/// 3. Hashes the password
/// 4. Creates the user, as admin when the email is listed in `admin`
/// 5. Announces the signup through `notifier` in the background
pub async fn register(
    db: &Database,
    admin: &AdminConfig,
    notifier: Option<&SharedNotifier>,
    request: RegistrationRequest,
) -> Result<User> {
    let email = request.email.trim();
    if let Err(e) = validate_registration(
        &request.first_name,
        &request.last_name,
        email,
        &request.password,
    ) {
        warn!(email = %email, error = %e, "registration rejected");
        return Err(e.into());
    }

    let repo = UserRepository::new(db.pool());
    if repo.email_exists(email).await? {
        warn!(email = %email, "email already registered");
        return Err(QuillError::Conflict("email already exists".to_string()));
    }

    let password_hash = hash_password(&request.password)?;

    let role = if admin.is_admin_email(email) {
        Role::Admin
    } else {
        Role::Member
    };
    let new_user = NewUser::new(
        email,
        password_hash,
        request.first_name.trim(),
        request.last_name.trim(),
    )
    .with_role(role);

    // The unique index catches a concurrent registration of the same email.
    let user = repo.create(&new_user).await?;
    info!(user_id = user.id, email = %user.email, role = %user.role, "user registered");

    if let Some(notifier) = notifier {
        dispatch_signup(notifier.clone(), SignupNotice::for_user(&user));
    }

    Ok(user)
}
