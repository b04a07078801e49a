use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth_service::validate_email;
use crate::services::{
    AuthResponse, LoginRequest, RegisterRequest, SendVerificationCodeRequest, VerifyCodeRequest,
};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    req.validate()?;
    let response = state.auth.register(&req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    req.validate()?;
    let response = state.auth.login(&req).await?;
    Ok(Json(response))
}

pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<User>, ApiError> {
    let user = state.auth.profile(user.id).await?;
    Ok(Json(user))
}

pub async fn send_verification_code(
    State(state): State<AppState>,
    Json(req): Json<SendVerificationCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_email(&req.email)?;
    state.auth.send_verification_code(&req.email).await?;
    Ok(Json(json!({ "message": "Verification code sent" })))
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;
    state.auth.verify_code(&req.email, &req.code).await?;
    Ok(Json(json!({ "message": "Email verified" })))
}
