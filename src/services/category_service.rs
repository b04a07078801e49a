use serde::Deserialize;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::Category;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation_detail("Invalid request body", "name is required"));
    }
    if name.chars().count() > 100 {
        return Err(ApiError::validation_detail(
            "Invalid request body",
            "name must be at most 100 characters",
        ));
    }
    Ok(())
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)
    }
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)
    }
}

#[derive(Clone)]
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: &CreateCategoryRequest) -> Result<Category, ApiError> {
        if self.name_taken(&req.name, None).await? {
            return Err(ApiError::conflict(
                "Category already exists",
                "A category with this name already exists",
            ));
        }

        let category = sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
            .bind(&req.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(category)
    }

    // Small collection; no pagination
    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        let categories =
            sqlx::query_as("SELECT id, name FROM categories WHERE deleted_at IS NULL ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> Result<Category, ApiError> {
        sqlx::query_as("SELECT id, name FROM categories WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("Category"))
    }

    pub async fn update(&self, id: i64, req: &UpdateCategoryRequest) -> Result<Category, ApiError> {
        self.get(id).await?;
        if self.name_taken(&req.name, Some(id)).await? {
            return Err(ApiError::conflict(
                "Category already exists",
                "A category with this name already exists",
            ));
        }

        let category = sqlx::query_as(
            "UPDATE categories SET name = $1, updated_at = now() WHERE id = $2 RETURNING id, name",
        )
        .bind(&req.name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    /// Remove the category and its article associations together. Junction
    /// rows are hard-deleted (they carry no audit value); the category itself
    /// is soft-deleted like every other resource.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.get(id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM article_categories WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE categories SET deleted_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, ApiError> {
        let row: Option<(i64,)> = match exclude_id {
            Some(id) => {
                sqlx::query_as(
                    "SELECT id FROM categories WHERE name = $1 AND id <> $2 AND deleted_at IS NULL",
                )
                .bind(name)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT id FROM categories WHERE name = $1 AND deleted_at IS NULL")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(CreateCategoryRequest { name: "rust".into() }.validate().is_ok());
        assert!(CreateCategoryRequest { name: "".into() }.validate().is_err());
        assert!(CreateCategoryRequest { name: "x".repeat(101) }.validate().is_err());
    }
}
