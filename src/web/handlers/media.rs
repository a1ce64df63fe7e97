//! Media handler serving stored objects.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

use super::AppState;
use crate::storage::ObjectStore;
use crate::web::error::ApiError;

/// GET /media/*key - Serve a stored object.
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let object = state.store.load(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        object.bytes,
    ))
}
