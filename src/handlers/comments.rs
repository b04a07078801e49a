use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::models::{CommentListResponse, CommentResponse};
use crate::pagination::CursorParams;
use crate::services::{CreateCommentRequest, UpdateCommentRequest};
use crate::state::AppState;

/// `GET /articles/:id/comments` — the one place comments are listed.
pub async fn list_by_article(
    State(state): State<AppState>,
    Path(article_id): Path<i64>,
    Query(params): Query<CursorParams>,
) -> Result<Json<CommentListResponse>, ApiError> {
    Ok(Json(state.comments.list_by_article(article_id, params).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    req.validate()?;
    let comment = state.comments.create(&req, user.id).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    req.validate()?;
    Ok(Json(state.comments.update(id, &req, user.id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comments.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
