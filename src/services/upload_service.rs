use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::ObjectStore;

/// Images live under this prefix in the bucket.
const IMAGE_PREFIX: &str = "images";

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpg", "image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub file_name: String,
    pub size: usize,
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn upload_image(
        &self,
        original_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        if body.is_empty() {
            return Err(ApiError::validation_detail("Invalid upload", "file is empty"));
        }
        if body.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::validation_detail(
                "Invalid upload",
                "file exceeds the 10 MiB limit",
            ));
        }

        // The declared content type is what the object store serves the file
        // back with, so it is restricted as strictly as the file name: an
        // image key delivered as text/html would execute in the browser.
        let declared = normalized_content_type(content_type);
        if !ALLOWED_CONTENT_TYPES.contains(&declared.as_str()) {
            return Err(ApiError::validation_detail(
                "Invalid upload",
                "content type must be jpeg, png, gif or webp",
            ));
        }

        let ext = extension_of(original_name)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                ApiError::validation_detail(
                    "Invalid upload",
                    "only jpg, jpeg, png, gif and webp files are accepted",
                )
            })?;

        let file_name = unique_file_name(&ext);
        let key = format!("{IMAGE_PREFIX}/{file_name}");
        let size = body.len();
        let url = self.store.put(&key, body, &declared).await?;

        Ok(UploadResponse { url, file_name, size })
    }

    pub async fn delete_image(&self, file_name: &str) -> Result<(), ApiError> {
        // Reject anything that could escape the image prefix
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return Err(ApiError::validation_detail("Invalid file name", "malformed file name"));
        }
        self.store.delete(&format!("{IMAGE_PREFIX}/{file_name}")).await
    }
}

// "image/PNG; charset=binary" -> "image/png"
fn normalized_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn unique_file_name(ext: &str) -> String {
    format!("{}-{}.{}", Uuid::new_v4(), Utc::now().timestamp(), ext)
}
