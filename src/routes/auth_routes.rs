use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::dto::auth_dto::{CreateUserRequest, LoginRequest, LoginResponse, MessageResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;
use crate::repositories::ParkingStore;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

/// Rutas sin autenticación
pub fn create_public_auth_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new().route("/api/auth/login", post(login::<S>))
}

/// Rutas para cualquier usuario autenticado
pub fn create_auth_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/auth/logout", post(logout::<S>))
        .route("/api/auth/me", get(me::<S>))
}

/// Gestión de usuarios, solo admin
pub fn create_user_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new().route("/api/users", post(create_user::<S>))
}

async fn login<S: ParkingStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let outcome = state
        .auth_service()
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: outcome.token.token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration,
        user: outcome.user.into(),
    }))
}

async fn logout<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<MessageResponse>> {
    // la expiración del JWT se valida contra la hora del sistema, no contra `state.clock`
    state
        .revoked_tokens
        .revoke(user.token_id, user.token_expires_at, Utc::now())
        .await;
    info!("👋 Logout de {}", user.username);

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

async fn me<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .store
        .find_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

async fn create_user<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(admin): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let user = state
        .auth_service()
        .create_user(&request.username, &request.password, request.role)
        .await?;
    info!("👤 {} dio de alta a {}", admin.username, user.username);

    Ok(Json(user.into()))
}
