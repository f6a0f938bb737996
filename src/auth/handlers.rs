use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoggedInUser, LoginRequest, RegisterRequest, RegisteredUser},
        services,
    },
    error::ApiError,
    response::{ApiResponse, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<RegisteredUser> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = services::register(&state, payload).await?;
    Ok(ApiResponse::created(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoggedInUser> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user = services::login(&state, payload).await?;
    Ok(ApiResponse::ok(user))
}
