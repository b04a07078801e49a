// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

/// API error with appropriate status codes and client-friendly messages.
///
/// Authorization and not-found/permission variants map directly to a client
/// status; everything else is logged server-side and surfaced as a generic
/// internal error without implementation detail.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{message}")]
    Validation { message: String, detail: Option<String> },

    // 401 Unauthorized
    #[error("Authorization header is required")]
    Unauthenticated,

    #[error("Authorization header must use Bearer token format")]
    MalformedAuthHeader,

    #[error("Token is invalid or expired")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // 403 Forbidden
    #[error("Permission denied")]
    PermissionDenied,

    // 404 Not Found
    #[error("{0} not found")]
    NotFound(&'static str),

    // 409 Conflict
    #[error("{message}")]
    Conflict { message: String, detail: Option<String> },

    // 500, programmer fault: a required service was never initialized
    #[error("Service misconfigured: {0}")]
    Configuration(String),

    // 500, unexpected store/IO failure
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into(), detail: None }
    }

    pub fn validation_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into(), detail: Some(detail.into()) }
    }

    pub fn conflict(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::Conflict { message: message.into(), detail: Some(detail.into()) }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated
            | ApiError::MalformedAuthHeader
            | ApiError::InvalidToken
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Configuration(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message. Internal variants never expose their cause here.
    pub fn message(&self) -> String {
        match self {
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Optional client-safe detail string.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Validation { detail, .. } | ApiError::Conflict { detail, .. } => {
                detail.clone()
            }
            ApiError::PermissionDenied => {
                Some("You don't have permission to perform this action".to_string())
            }
            ApiError::NotFound(what) => {
                Some(format!("The requested {} does not exist", what.to_lowercase()))
            }
            ApiError::InvalidCredentials => Some("Email or password is incorrect".to_string()),
            ApiError::Internal(_) | ApiError::Configuration(_) => {
                Some("An unexpected error occurred".to_string())
            }
            _ => None,
        }
    }

    /// Wire shape: `{ code, message, detail? }`.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "code": self.status_code().as_u16(),
            "message": self.message(),
        });
        if let Some(detail) = self.detail() {
            body["detail"] = json!(detail);
        }
        body
    }
}

// Store failures: row-not-found is decided per-resource by the services, so a
// raw sqlx error reaching this point is always an internal fault.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(err: redis::RedisError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Full detail stays server-side for unexpected faults
        match &self {
            ApiError::Internal(source) => {
                tracing::error!(error = ?source, "internal error while handling request");
            }
            ApiError::Configuration(what) => {
                tracing::error!(%what, "service misconfiguration surfaced at request time");
            }
            _ => {}
        }
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MalformedAuthHeader.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("Article").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::conflict("Email already exists", "duplicate").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_errors_never_leak_cause() {
        let err = ApiError::internal(anyhow::anyhow!("connection refused to 10.0.0.5:5432"));
        let body = err.to_json();
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body["detail"].as_str().unwrap_or("").contains("10.0.0.5"));
    }

    #[test]
    fn permission_denied_is_generic() {
        let body = ApiError::PermissionDenied.to_json();
        assert_eq!(body["code"], 403);
        assert_eq!(body["message"], "Permission denied");
    }

    #[test]
    fn wire_shape_has_code_and_message() {
        let body =
            ApiError::validation_detail("Invalid request body", "title is required").to_json();
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "Invalid request body");
        assert_eq!(body["detail"], "title is required");
    }
}
