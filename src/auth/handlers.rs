use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::auth::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::ApiResponse;
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    // Validate required fields before hitting the DB.
    payload.validate()?;

    let user_id = state
        .auth
        .register(&payload.email, &payload.full_name, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegisterResponse { user_id })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    payload.validate()?;

    let token = state.auth.login(&payload.email, &payload.password).await?;

    Ok(Json(ApiResponse::ok(LoginResponse { token })))
}
