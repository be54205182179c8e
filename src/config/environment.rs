//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use tracing::warn;

use super::database::DatabaseConfig;

const DEVELOPMENT_JWT_SECRET: &str = "parking-tracker-development-secret";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// `None` cuando no hay `DATABASE_URL`: se usa el almacén en memoria
    pub database: Option<DatabaseConfig>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub parking_spot_count: i32,
    pub admin_username: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "development" => {
                warn!("⚠️ JWT_SECRET no definido, usando el secreto de desarrollo");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
            _ => anyhow::bail!("JWT_SECRET must be set outside development"),
        };

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig::from_env(url)?),
            _ => None,
        };

        let config = Self {
            port: parse_var("PORT", 3000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            database,
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 8 * 3600)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or_default(),
            parking_spot_count: parse_var("PARKING_SPOT_COUNT", 50)?,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            environment,
        };

        if config.parking_spot_count < 0 {
            anyhow::bail!("PARKING_SPOT_COUNT must not be negative");
        }
        if config.is_production() && env::var("ADMIN_PASSWORD").is_err() {
            warn!("⚠️ ADMIN_PASSWORD no definido en producción, se usa la contraseña por defecto");
        }

        Ok(config)
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Leer una variable opcional, con valor por defecto si no existe
pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", key, raw)),
        _ => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
