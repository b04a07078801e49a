use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::models::{ArticleListResponse, ArticleResponse, TopArticleInfo};
use crate::pagination::CursorParams;
use crate::services::{CreateArticleRequest, UpdateArticleRequest};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    Ok(Json(state.articles.list(params).await?))
}

pub async fn top_by_views(
    State(state): State<AppState>,
) -> Result<Json<Vec<TopArticleInfo>>, ApiError> {
    Ok(Json(state.articles.top_by_views().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    Ok(Json(state.articles.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), ApiError> {
    req.validate()?;
    let article = state.articles.create(&req, user.id).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    req.validate()?;
    Ok(Json(state.articles.update(id, &req, user.id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.articles.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
