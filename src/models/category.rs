use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Category as embedded in article responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryInfo {
    pub id: i64,
    pub name: String,
}
