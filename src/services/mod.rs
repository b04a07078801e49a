pub mod article_service;
pub mod auth_service;
pub mod category_service;
pub mod comment_service;
pub mod upload_service;

pub use article_service::{ArticleService, CreateArticleRequest, UpdateArticleRequest};
pub use auth_service::{
    AuthResponse, AuthService, LoginRequest, RegisterRequest, SendVerificationCodeRequest,
    VerifyCodeRequest,
};
pub use category_service::{CategoryService, CreateCategoryRequest, UpdateCategoryRequest};
pub use comment_service::{CommentService, CreateCommentRequest, UpdateCommentRequest};
pub use upload_service::{UploadResponse, UploadService};

use crate::error::ApiError;

/// Only the author may mutate an article or comment. The check runs inside
/// the mutation transaction, before any write, so a denied caller leaves the
/// resource untouched.
pub(crate) fn ensure_author(author_id: i64, caller_id: i64) -> Result<(), ApiError> {
    if author_id != caller_id {
        return Err(ApiError::PermissionDenied);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_author_is_denied_and_author_is_allowed() {
        assert!(matches!(ensure_author(7, 8), Err(ApiError::PermissionDenied)));
        assert!(ensure_author(7, 7).is_ok());
    }
}
