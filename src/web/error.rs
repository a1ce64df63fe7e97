//! API error handling for the Quill web API.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::QuillError;

/// Message returned for every unexpected failure.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Validation error (400) - for field-level validation errors.
    ValidationError,
    /// Unauthorized (401).
    Unauthorized,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Upstream storage failure (502).
    BadGateway,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::BadGateway => StatusCode::BAD_GATEWAY,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Error code.
    pub code: ErrorCode,
    /// Field-level validation error details, or the underlying error when
    /// error details are exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// Underlying cause of an internal error, attached to the response so the
/// debug layer can expose it.
#[derive(Debug, Clone)]
struct InternalCause(String);

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
    cause: Option<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Create a new API error with field-level details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
            cause: None,
        }
    }

    /// Error code of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a validation error without field details.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a validation error with field-level details.
    pub fn validation(details: HashMap<String, Vec<String>>) -> Self {
        Self::with_details(ErrorCode::ValidationError, "Validation failed", details)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        // Surface the first message so clients showing only `message` still
        // get something useful.
        let mut fields: Vec<&String> = details.keys().collect();
        fields.sort();
        let message = fields
            .first()
            .and_then(|f| details.get(*f))
            .and_then(|m| m.first())
            .cloned()
            .unwrap_or_else(|| "Validation failed".to_string());

        Self::with_details(ErrorCode::ValidationError, message, details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            success: false,
            message: self.message,
            code: self.code,
            details: self.details,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(cause) = self.cause {
            response.extensions_mut().insert(InternalCause(cause));
        }
        response
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        match &err {
            QuillError::Validation(msg) => ApiError::invalid(msg.clone()),
            QuillError::Auth(msg) => ApiError::unauthorized(msg.clone()),
            QuillError::Permission(msg) => ApiError::forbidden(msg.clone()),
            QuillError::NotFound(_) => ApiError::not_found(capitalize(&err.to_string())),
            QuillError::Conflict(msg) => ApiError::conflict(capitalize(msg)),
            QuillError::Storage(_) => {
                tracing::error!("Storage error: {}", err);
                let mut api = ApiError::new(ErrorCode::BadGateway, "File storage is unavailable");
                api.cause = Some(err.to_string());
                api
            }
            _ => {
                tracing::error!("Internal error: {}", err);
                let mut api = ApiError::internal(INTERNAL_MESSAGE);
                api.cause = Some(err.to_string());
                api
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Middleware exposing the underlying cause of internal errors in the
/// response body under `details.error`.
///
/// Only installed when `web.debug_errors` is enabled.
pub async fn expose_error_details(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let Some(InternalCause(cause)) = response.extensions_mut().remove::<InternalCause>() else {
        return response;
    };

    let status = response.status();
    let code = if status == StatusCode::BAD_GATEWAY {
        ErrorCode::BadGateway
    } else {
        ErrorCode::InternalError
    };
    let message = if code == ErrorCode::BadGateway {
        "File storage is unavailable"
    } else {
        INTERNAL_MESSAGE
    };
    let body = ErrorBody {
        success: false,
        message: message.to_string(),
        code,
        details: Some(HashMap::from([("error".to_string(), vec![cause])])),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::ValidationError.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ErrorCode::BadGateway.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_quill_error() {
        let cases = [
            (QuillError::Validation("x".into()), ErrorCode::ValidationError),
            (QuillError::Auth("x".into()), ErrorCode::Unauthorized),
            (QuillError::Permission("x".into()), ErrorCode::Forbidden),
            (QuillError::NotFound("post".into()), ErrorCode::NotFound),
            (QuillError::Conflict("x".into()), ErrorCode::Conflict),
            (QuillError::Storage("x".into()), ErrorCode::BadGateway),
            (QuillError::Database("x".into()), ErrorCode::InternalError),
            (QuillError::Config("x".into()), ErrorCode::InternalError),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code(), code);
        }
    }

    #[test]
    fn test_messages() {
        let err = ApiError::from(QuillError::NotFound("post".into()));
        assert_eq!(err.message(), "Post not found");

        let err = ApiError::from(QuillError::Conflict("email already exists".into()));
        assert_eq!(err.message(), "Email already exists");

        let err = ApiError::from(QuillError::Database("disk I/O error".into()));
        assert_eq!(err.message(), INTERNAL_MESSAGE);
        assert_eq!(err.cause.as_deref(), Some("database error: disk I/O error"));
    }

    #[test]
    fn test_validation_error() {
        let mut details = HashMap::new();
        details.insert("title".to_string(), vec!["Too short".to_string()]);

        let err = ApiError::validation(details);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.details.unwrap().get("title").unwrap(),
            &vec!["Too short".to_string()]
        );
    }

    async fn failing() -> std::result::Result<(), ApiError> {
        Err(QuillError::Database("disk full".into()).into())
    }

    async fn call(app: axum::Router) -> (StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_cause_hidden_by_default() {
        let app = axum::Router::new().route("/", axum::routing::get(failing));
        let (status, json) = call(app).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_MESSAGE);
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_expose_error_details_layer() {
        let app = axum::Router::new()
            .route("/", axum::routing::get(failing))
            .layer(axum::middleware::from_fn(expose_error_details));
        let (status, json) = call(app).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["details"]["error"][0], "database error: disk full");
    }

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody {
            success: false,
            message: "Post not found".to_string(),
            code: ErrorCode::NotFound,
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
