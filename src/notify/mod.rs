//! Administrator notifications for Quill.
//!
//! New signups are announced to the site administrator through a
//! [`Notifier`]. Delivery runs in a detached task and its failures are
//! only logged; they never reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::User;
use crate::Result;

/// Subject line for signup notifications.
pub const SIGNUP_SUBJECT: &str = "New User Registered on Quill";

/// A signup announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupNotice {
    pub user_id: i64,
    pub email: String,
    pub full_name: String,
}

impl SignupNotice {
    /// Build the notice for a freshly registered user.
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name(),
        }
    }

    /// Plain-text message body.
    pub fn body(&self) -> String {
        format!(
            "A new user has just signed up on Quill.\n\nEmail: {}\nName: {}\n",
            self.email, self.full_name
        )
    }
}

/// Delivery channel for administrator notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a new signup.
    async fn notify_signup(&self, notice: &SignupNotice) -> Result<()>;
}

/// Shared handle to the configured notifier.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that writes the announcement to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_signup(&self, notice: &SignupNotice) -> Result<()> {
        info!(
            user_id = notice.user_id,
            email = %notice.email,
            name = %notice.full_name,
            subject = SIGNUP_SUBJECT,
            "new user registration"
        );
        Ok(())
    }
}

/// Send a signup notice without waiting for it.
pub fn dispatch_signup(notifier: SharedNotifier, notice: SignupNotice) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_signup(&notice).await {
            warn!(
                user_id = notice.user_id,
                error = %e,
                "failed to deliver signup notification"
            );
        }
    })
}
