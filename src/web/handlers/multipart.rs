//! Multipart form reading shared by the upload endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::storage::Upload;
use crate::web::error::ApiError;

/// Name of the file field.
const FILE_FIELD: &str = "file";

/// A parsed multipart form: text fields plus an optional `file` upload.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    fields: HashMap<String, String>,
    pub file: Option<Upload>,
}

impl UploadForm {
    /// Text value of the first of `names` present in the form.
    pub fn text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.fields.get(*name).cloned())
    }

    /// Read every field of a multipart body.
    ///
    /// A `file` part without a name and bytes (an empty file input) is
    /// treated as absent.
    pub async fn read(mut multipart: Multipart, max_size: u64) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or("").to_string();
                let declared_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;

                if bytes.is_empty() && file_name.is_empty() {
                    continue;
                }
                if bytes.len() as u64 > max_size {
                    return Err(too_large(max_size));
                }

                let content_type = declared_type.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                form.file = Some(Upload::new(bytes.to_vec(), file_name, content_type));
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("File too large");
    }
    tracing::debug!("Failed to read multipart field: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

fn too_large(max_size: u64) -> ApiError {
    let max_mb = max_size / 1024 / 1024;
    ApiError::payload_too_large(format!("File too large (max {}MB)", max_mb))
}
