//! Middleware de autenticación JWT
//!
//! Este módulo maneja la extracción y verificación del token y construye
//! el contexto del usuario autenticado para cada request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::UserRole,
    repositories::ParkingStore,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub token_id: Uuid,
    pub token_expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware<S: ParkingStore>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;
    let token = extract_token_from_header(auth_header)?;

    // Firma y expiración
    let claims = verify_token(token, &state.jwt_config())?;

    if state.revoked_tokens.is_revoked(&claims.jti).await {
        return Err(AppError::Unauthorized("Token has been revoked".to_string()));
    }

    // El usuario tiene que seguir existiendo
    let user_id = claims.user_id()?;
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    debug!("🔑 {} autenticado ({})", user.username, user.role);

    let authenticated_user = AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
        token_id: claims.jti,
        token_expires_at: claims.expires_at(),
    };

    // Inyectar usuario autenticado en las extensions
    request.extensions_mut().insert(authenticated_user);

    Ok(next.run(request).await)
}

/// Middleware para verificar permisos de admin
pub async fn admin_only_middleware(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    Ok(next.run(request).await)
}
