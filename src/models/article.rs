use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::category::CategoryInfo;

/// Bare article row, used by ownership checks and mutations.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article row joined with its author, as fetched by read paths.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleRow {
    pub fn into_response(self, categories: Vec<CategoryInfo>) -> ArticleResponse {
        ArticleResponse {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            author_name: self.author_name,
            view_count: self.view_count,
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub view_count: i32,
    pub categories: Vec<CategoryInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopArticleInfo {
    pub id: i64,
    pub title: String,
    pub view_count: i32,
}
