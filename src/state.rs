use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::services::{ArticleService, AuthService, CategoryService, CommentService, UploadService};

/// Shared handler state. Every field is cheaply cloneable; axum clones the
/// whole state per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub articles: ArticleService,
    pub comments: CommentService,
    pub categories: CategoryService,
    pub uploads: UploadService,
}
