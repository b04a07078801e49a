use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::models::{Article, ArticleListResponse, ArticleResponse, ArticleRow, CategoryInfo, TopArticleInfo};
use crate::pagination::{CursorParams, LimitPolicy, Page, SortOrder};

/// Articles list newest-first.
pub const ARTICLE_LIMITS: LimitPolicy = LimitPolicy::new(20, 50);
const ARTICLE_ORDER: SortOrder = SortOrder::Desc;

const SELECT_ARTICLE: &str = "SELECT a.id, a.title, a.content, a.author_id, \
     u.username AS author_name, a.view_count, a.created_at, a.updated_at \
     FROM articles a JOIN users u ON u.id = a.author_id";

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

impl CreateArticleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title_content(&self.title, &self.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: String,
    pub content: String,
    pub category_ids: Option<Vec<i64>>,
}

impl UpdateArticleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title_content(&self.title, &self.content)
    }
}

fn validate_title_content(title: &str, content: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation_detail("Invalid request body", "title is required"));
    }
    if title.chars().count() > 200 {
        return Err(ApiError::validation_detail(
            "Invalid request body",
            "title must be at most 200 characters",
        ));
    }
    if content.trim().is_empty() {
        return Err(ApiError::validation_detail("Invalid request body", "content is required"));
    }
    Ok(())
}

#[derive(Debug, FromRow)]
struct ArticleCategoryRow {
    article_id: i64,
    id: i64,
    name: String,
}

#[derive(Clone)]
pub struct ArticleService {
    pool: PgPool,
}

impl ArticleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        req: &CreateArticleRequest,
        author_id: i64,
    ) -> Result<ArticleResponse, ApiError> {
        let mut tx = self.pool.begin().await?;

        let article: Article = sqlx::query_as(
            "INSERT INTO articles (title, content, author_id) VALUES ($1, $2, $3) \
             RETURNING id, title, content, author_id, view_count, created_at, updated_at",
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        if !req.category_ids.is_empty() {
            replace_categories(&mut tx, article.id, &req.category_ids).await?;
        }
        tx.commit().await?;

        self.load_response(article.id).await
    }

    /// Fetch one article. The view-count bump is fire-and-forget: a lost
    /// update under concurrent readers is accepted, and a failed bump must
    /// not fail the read.
    pub async fn get(&self, id: i64) -> Result<ArticleResponse, ApiError> {
        let sql = format!("{SELECT_ARTICLE} WHERE a.id = $1 AND a.deleted_at IS NULL");
        let mut row: ArticleRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("Article"))?;

        let pool = self.pool.clone();
        tokio::spawn(async move {
            let result = sqlx::query("UPDATE articles SET view_count = view_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await;
            if let Err(err) = result {
                tracing::warn!(article_id = id, error = %err, "view count increment failed");
            }
        });
        row.view_count += 1;

        let categories = self
            .categories_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(row.into_response(categories))
    }

    pub async fn list(&self, params: CursorParams) -> Result<ArticleListResponse, ApiError> {
        let limit = ARTICLE_LIMITS.clamp(params.limit);

        let rows: Vec<ArticleRow> = match params.last_id {
            Some(last) if last > 0 => {
                let sql = format!(
                    "{SELECT_ARTICLE} WHERE a.deleted_at IS NULL AND a.id {} $1 \
                     ORDER BY a.id {} LIMIT $2",
                    ARTICLE_ORDER.cursor_comparison(),
                    ARTICLE_ORDER.sql_keyword()
                );
                sqlx::query_as(&sql)
                    .bind(last)
                    .bind(limit + 1)
                    .fetch_all(&self.pool)
                    .await?
            }
            _ => {
                let sql = format!(
                    "{SELECT_ARTICLE} WHERE a.deleted_at IS NULL ORDER BY a.id {} LIMIT $1",
                    ARTICLE_ORDER.sql_keyword()
                );
                sqlx::query_as(&sql).bind(limit + 1).fetch_all(&self.pool).await?
            }
        };

        let page = Page::assemble(rows, limit, |row| row.id);

        let ids: Vec<i64> = page.items.iter().map(|row| row.id).collect();
        let mut categories = self.categories_for(&ids).await?;
        let articles = page
            .items
            .into_iter()
            .map(|row| {
                let cats = categories.remove(&row.id).unwrap_or_default();
                row.into_response(cats)
            })
            .collect();

        Ok(ArticleListResponse {
            articles,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    pub async fn update(
        &self,
        id: i64,
        req: &UpdateArticleRequest,
        user_id: i64,
    ) -> Result<ArticleResponse, ApiError> {
        let mut tx = self.pool.begin().await?;

        let article = load_for_update(&mut tx, id).await?;
        super::ensure_author(article.author_id, user_id)?;

        sqlx::query("UPDATE articles SET title = $1, content = $2, updated_at = now() WHERE id = $3")
            .bind(&req.title)
            .bind(&req.content)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(category_ids) = &req.category_ids {
            replace_categories(&mut tx, id, category_ids).await?;
        }
        tx.commit().await?;

        self.load_response(id).await
    }

    /// Soft-delete an article and its comments in one transaction, so the
    /// dependents vanish together with the parent.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let article = load_for_update(&mut tx, id).await?;
        super::ensure_author(article.author_id, user_id)?;

        sqlx::query("UPDATE comments SET deleted_at = now() WHERE article_id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE articles SET deleted_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn top_by_views(&self) -> Result<Vec<TopArticleInfo>, ApiError> {
        let rows = sqlx::query_as(
            "SELECT id, title, view_count FROM articles WHERE deleted_at IS NULL \
             ORDER BY view_count DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn load_response(&self, id: i64) -> Result<ArticleResponse, ApiError> {
        let sql = format!("{SELECT_ARTICLE} WHERE a.id = $1 AND a.deleted_at IS NULL");
        let row: ArticleRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("Article"))?;

        let categories = self
            .categories_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(row.into_response(categories))
    }

    async fn categories_for(
        &self,
        article_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<CategoryInfo>>, ApiError> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<ArticleCategoryRow> = sqlx::query_as(
            "SELECT ac.article_id, c.id, c.name FROM article_categories ac \
             JOIN categories c ON c.id = ac.category_id \
             WHERE ac.article_id = ANY($1) AND c.deleted_at IS NULL \
             ORDER BY c.id",
        )
        .bind(article_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<CategoryInfo>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.article_id)
                .or_default()
                .push(CategoryInfo { id: row.id, name: row.name });
        }
        Ok(grouped)
    }
}

async fn load_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<Article, ApiError> {
    sqlx::query_as(
        "SELECT id, title, content, author_id, view_count, created_at, updated_at \
         FROM articles WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(ApiError::NotFound("Article"))
}

async fn replace_categories(
    tx: &mut Transaction<'_, Postgres>,
    article_id: i64,
    category_ids: &[i64],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM article_categories WHERE article_id = $1")
        .bind(article_id)
        .execute(&mut **tx)
        .await?;

    if !category_ids.is_empty() {
        // Unknown or deleted category ids are silently skipped
        sqlx::query(
            "INSERT INTO article_categories (article_id, category_id) \
             SELECT $1, c.id FROM categories c \
             WHERE c.id = ANY($2) AND c.deleted_at IS NULL",
        )
        .bind(article_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_validation() {
        let ok = CreateArticleRequest {
            title: "T".into(),
            content: "C".into(),
            category_ids: vec![],
        };
        assert!(ok.validate().is_ok());

        let empty_title = CreateArticleRequest {
            title: "  ".into(),
            content: "C".into(),
            category_ids: vec![],
        };
        assert!(matches!(empty_title.validate(), Err(ApiError::Validation { .. })));

        let long_title = CreateArticleRequest {
            title: "x".repeat(201),
            content: "C".into(),
            category_ids: vec![],
        };
        assert!(matches!(long_title.validate(), Err(ApiError::Validation { .. })));

        let empty_content = CreateArticleRequest {
            title: "T".into(),
            content: "".into(),
            category_ids: vec![],
        };
        assert!(matches!(empty_content.validate(), Err(ApiError::Validation { .. })));
    }
}
