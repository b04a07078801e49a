use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::models::{CommentListResponse, CommentRow};
use crate::pagination::{CursorParams, LimitPolicy, Page, SortOrder};

/// Comments under an article read oldest-first (chronological thread order).
pub const COMMENT_LIMITS: LimitPolicy = LimitPolicy::new(50, 100);
const COMMENT_ORDER: SortOrder = SortOrder::Asc;

const SELECT_COMMENT: &str = "SELECT c.id, c.content, c.author_id, \
     u.username AS author_name, c.article_id, c.created_at, c.updated_at \
     FROM comments c JOIN users u ON u.id = c.author_id";

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub article_id: i64,
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.article_id <= 0 {
            return Err(ApiError::validation_detail("Invalid request body", "article_id is required"));
        }
        validate_content(&self.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

impl UpdateCommentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_content(&self.content)
    }
}

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::validation_detail("Invalid request body", "content is required"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        req: &CreateCommentRequest,
        author_id: i64,
    ) -> Result<crate::models::CommentResponse, ApiError> {
        // Commenting on a missing or deleted article is a not-found, not a
        // foreign-key explosion
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM articles WHERE id = $1 AND deleted_at IS NULL")
                .bind(req.article_id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("Article"));
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO comments (article_id, author_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(req.article_id)
        .bind(author_id)
        .bind(&req.content)
        .fetch_one(&self.pool)
        .await?;

        self.load_response(id).await
    }

    /// Cursor-paginated comments of one article. Listing a deleted article's
    /// comments yields an empty page (they were soft-deleted with it).
    pub async fn list_by_article(
        &self,
        article_id: i64,
        params: CursorParams,
    ) -> Result<CommentListResponse, ApiError> {
        let limit = COMMENT_LIMITS.clamp(params.limit);

        let rows: Vec<CommentRow> = match params.last_id {
            Some(last) if last > 0 => {
                let sql = format!(
                    "{SELECT_COMMENT} WHERE c.article_id = $1 AND c.deleted_at IS NULL \
                     AND c.id {} $2 ORDER BY c.id {} LIMIT $3",
                    COMMENT_ORDER.cursor_comparison(),
                    COMMENT_ORDER.sql_keyword()
                );
                sqlx::query_as(&sql)
                    .bind(article_id)
                    .bind(last)
                    .bind(limit + 1)
                    .fetch_all(&self.pool)
                    .await?
            }
            _ => {
                let sql = format!(
                    "{SELECT_COMMENT} WHERE c.article_id = $1 AND c.deleted_at IS NULL \
                     ORDER BY c.id {} LIMIT $2",
                    COMMENT_ORDER.sql_keyword()
                );
                sqlx::query_as(&sql)
                    .bind(article_id)
                    .bind(limit + 1)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let page = Page::assemble(rows, limit, |row| row.id);
        Ok(CommentListResponse {
            comments: page.items.into_iter().map(CommentRow::into_response).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    pub async fn update(
        &self,
        id: i64,
        req: &UpdateCommentRequest,
        user_id: i64,
    ) -> Result<crate::models::CommentResponse, ApiError> {
        let mut tx = self.pool.begin().await?;

        let author_id = load_author_for_update(&mut tx, id).await?;
        super::ensure_author(author_id, user_id)?;

        sqlx::query("UPDATE comments SET content = $1, updated_at = now() WHERE id = $2")
            .bind(&req.content)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.load_response(id).await
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let author_id = load_author_for_update(&mut tx, id).await?;
        super::ensure_author(author_id, user_id)?;

        sqlx::query("UPDATE comments SET deleted_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_response(&self, id: i64) -> Result<crate::models::CommentResponse, ApiError> {
        let sql = format!("{SELECT_COMMENT} WHERE c.id = $1 AND c.deleted_at IS NULL");
        let row: CommentRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("Comment"))?;
        Ok(row.into_response())
    }
}

async fn load_author_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<i64, ApiError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT author_id FROM comments WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    row.map(|(author_id,)| author_id).ok_or(ApiError::NotFound("Comment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_validation() {
        let ok = CreateCommentRequest { article_id: 1, content: "hi".into() };
        assert!(ok.validate().is_ok());

        let no_article = CreateCommentRequest { article_id: 0, content: "hi".into() };
        assert!(matches!(no_article.validate(), Err(ApiError::Validation { .. })));

        let empty = CreateCommentRequest { article_id: 1, content: " ".into() };
        assert!(matches!(empty.validate(), Err(ApiError::Validation { .. })));
    }
}
