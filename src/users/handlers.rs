use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{LoginRequest, RegisterRequest},
        extractors::Payload,
        repo_types::UserRecord,
        services::VerifyResult,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.users.list_all().await?;
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = state
        .users
        .create(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
            payload.email.as_deref(),
        )
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    let outcome = state
        .users
        .verify(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    match outcome {
        VerifyResult::Authenticated(user) => {
            info!(user_id = %user.id, username = %user.username, "user logged in");
            Ok(Json(user))
        }
        VerifyResult::NoSuchUser(username) => Err(ApiError::NoSuchUser(username)),
        VerifyResult::PasswordMismatch => Err(ApiError::PasswordMismatch),
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    state
        .users
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
