//! Admin media uploads.
//!
//! `POST /api/admin/uploads` takes a multipart body with exactly one file
//! field and answers with the public URL of the stored copy.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::UploadError;
use crate::state::AppState;

/// Store one uploaded file.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        // Plain form fields are ignored
        if field.file_name().is_none() {
            continue;
        }
        if file.is_some() {
            return Err(AppError::BadRequest(
                "Only one file may be uploaded at a time".to_string(),
            ));
        }
        let name = field.file_name().map(String::from);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        file = Some((name, bytes.to_vec()));
    }

    let (name, bytes) = file.ok_or(UploadError::MissingFile)?;
    let stored = state.uploads().store(name.as_deref(), &bytes).await?;

    Ok(Json(json!({ "success": true, "url": stored.url })))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::BadRequest("File is too large".to_string());
    }
    AppError::BadRequest(err.body_text())
}
