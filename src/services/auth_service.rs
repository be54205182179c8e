//! Servicio de autenticación
//!
//! Login con bcrypt + JWT, alta de usuarios y creación del administrador por defecto.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{NewUser, User, UserRole};
use crate::repositories::ParkingStore;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, IssuedToken, JwtConfig};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Resultado de un login correcto
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

pub struct AuthService<S> {
    store: Arc<S>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl<S: ParkingStore> AuthService<S> {
    pub fn new(store: Arc<S>, jwt: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }

    /// Autentica un usuario y emite su token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = self
            .store
            .find_user_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash).await? {
            warn!("🔒 Contraseña incorrecta para {}", user.username);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = generate_token(&user, &self.jwt)?;
        info!("✅ Login de {} ({})", user.username, user.role);
        debug!("🎫 Token {} válido hasta {}", token.token_id, token.expires_at);

        Ok(LoginOutcome { user, token })
    }

    /// Da de alta un usuario nuevo
    pub async fn create_user(&self, username: &str, password: &str, role: UserRole) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("username is required".to_string()));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?
            .ok_or_else(|| AppError::Conflict(format!("User '{}' already exists", username)))?;

        info!("👤 Usuario {} creado con rol {}", user.username, user.role);
        Ok(user)
    }

    /// Crea el administrador por defecto si no existe; devuelve si lo creó
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Ok(false);
        }

        match self.create_user(username, password, UserRole::Admin).await {
            Ok(_) => Ok(true),
            // otro proceso lo creó entre la consulta y el insert
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))
}

async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))
}
