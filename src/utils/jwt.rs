//! Utilidades JWT
//!
//! Emisión y verificación de los tokens de sesión de encargados y administradores.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::environment::EnvironmentConfig,
    models::{User, UserRole},
    utils::errors::AppError,
};

/// Claims del JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub username: String,
    pub role: UserRole,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Jwt("Invalid subject in token".to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
        }
    }
}

/// Token recién emitido
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Generar JWT token para un usuario
pub fn generate_token(user: &User, config: &JwtConfig) -> Result<IssuedToken, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.expiration as i64);

    let claims = JwtClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        jti: Uuid::new_v4(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
    let token = encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))?;

    Ok(IssuedToken {
        token,
        token_id: claims.jti,
        expires_at,
    })
}

/// Verificar y decodificar JWT token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    // sin margen: un token expirado no puede sobrevivir a su entrada en la lista de revocados
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
        .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty bearer token".to_string()));
    }

    Ok(token)
}
