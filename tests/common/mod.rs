//! Shared helpers for the Web API integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum_test::{TestRequest, TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use quill::config::AdminConfig;
use quill::notify::{Notifier, SignupNotice};
use quill::web::{create_router, AppState, RouterOptions};
use quill::{Database, LocalObjectStore, SessionKeys};

/// Secret used to sign test sessions.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Email granted the admin role in tests.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Default password used by the helpers.
pub const PASSWORD: &str = "secret123";

/// Notifier that records every signup it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<SignupNotice>>,
}

impl RecordingNotifier {
    pub fn emails(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.email.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_signup(&self, notice: &SignupNotice) -> quill::Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// A router under test with its backing resources.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub notifier: Arc<RecordingNotifier>,
    pub media: TempDir,
}

/// Create a test server with an in-memory database and a temporary media
/// directory.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(RouterOptions::default()).await
}

/// Create a test server with custom router options.
pub async fn create_test_app_with(options: RouterOptions) -> TestApp {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let media = tempfile::tempdir().expect("Failed to create media dir");
    let store = LocalObjectStore::new(media.path(), "http://localhost/media")
        .expect("Failed to create object store");
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::new(
        db.clone(),
        Arc::new(store),
        Arc::new(SessionKeys::new(TEST_SECRET)),
    )
    .with_notifier(notifier.clone())
    .with_admin(AdminConfig {
        emails: vec![ADMIN_EMAIL.to_string()],
    })
    .with_max_upload_size_mb(1);

    let router = create_router(Arc::new(state), &options);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        notifier,
        media,
    }
}

/// Register a user.
pub async fn register(server: &TestServer, first_name: &str, email: &str) -> TestResponse {
    server
        .post("/api/users")
        .json(&json!({
            "first_name": first_name,
            "last_name": "Tester",
            "email": email,
            "password": PASSWORD
        }))
        .await
}

/// Log in and return the response.
pub async fn login(server: &TestServer, email: &str, password: &str) -> TestResponse {
    server
        .post("/api/users/login")
        .json(&json!({ "email": email, "password": password }))
        .await
}

/// Extract the session token from a login response.
pub fn session_token(response: &TestResponse) -> String {
    let set_cookie = response.header(SET_COOKIE);
    let set_cookie = set_cookie.to_str().expect("Set-Cookie is not ASCII");
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("token="))
        .expect("No session token in Set-Cookie")
        .to_string()
}

/// Register a user, log in, and return the session token.
pub async fn register_and_login(server: &TestServer, first_name: &str, email: &str) -> String {
    register(server, first_name, email)
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    let response = login(server, email, PASSWORD).await;
    response.assert_status_ok();
    session_token(&response)
}

/// Attach a session cookie to a request.
pub fn with_session(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(COOKIE, format!("token={}", token))
}

/// Create a post and return its JSON.
pub async fn create_post(server: &TestServer, token: &str, title: &str) -> Value {
    let response = with_session(server.post("/api/posts"), token)
        .json(&json!({ "title": title, "category": "tech" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Wait for a detached task to make `check` true.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
