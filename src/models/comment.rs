use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Comment row joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentRow {
    pub fn into_response(self) -> CommentResponse {
        CommentResponse {
            id: self.id,
            content: self.content,
            author_id: self.author_id,
            author_name: self.author_name,
            article_id: self.article_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}
