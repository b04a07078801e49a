use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::UploadResponse;
use crate::state::AppState;

/// `POST /upload/image` — multipart form with a single `image` field.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation_detail("Invalid upload", err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::validation_detail("Invalid upload", "file name is missing"))?;
        let content_type = field
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| "application/octet-stream".to_owned());
        let body = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation_detail("Invalid upload", err.to_string()))?;

        let response = state
            .uploads
            .upload_image(&file_name, &content_type, body.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(ApiError::validation_detail("Invalid upload", "multipart field 'image' is missing"))
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageParams {
    pub file_name: String,
}

/// `DELETE /upload/image?file_name=` — removes a previously uploaded image.
pub async fn delete_image(
    State(state): State<AppState>,
    Query(params): Query<DeleteImageParams>,
) -> Result<StatusCode, ApiError> {
    state.uploads.delete_image(&params.file_name).await?;
    Ok(StatusCode::NO_CONTENT)
}
