//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la API y su conversión a respuestas HTTP.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::repositories::StoreError;
use crate::services::fee_calculator::FeeError;
use crate::services::parking_service::ParkingError;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API; `error` es el texto que se muestra al usuario
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Hash(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("⚠️ {}", self);
        }

        let (error, code, details) = match self {
            AppError::Store(_) => (
                "An error occurred while accessing the database".to_string(),
                "DB_ERROR",
                None,
            ),
            AppError::Validation(e) => (
                validation_summary(&e),
                "VALIDATION_ERROR",
                Some(json!(e)),
            ),
            AppError::BadRequest(msg) => (msg, "BAD_REQUEST", None),
            AppError::Conflict(msg) => (msg, "CONFLICT", None),
            AppError::Unauthorized(msg) => (msg, "UNAUTHORIZED", None),
            AppError::Forbidden(msg) => (msg, "FORBIDDEN", None),
            AppError::NotFound(msg) => (msg, "NOT_FOUND", None),
            AppError::Jwt(msg) => (msg, "JWT_ERROR", None),
            AppError::Hash(_) => (
                "An error occurred while processing credentials".to_string(),
                "HASH_ERROR",
                None,
            ),
            AppError::Internal(_) => (
                "An unexpected error occurred".to_string(),
                "INTERNAL_ERROR",
                None,
            ),
        };
        let body = ErrorResponse {
            error,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Primer mensaje de validación, o uno genérico
fn validation_summary(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "The provided data is invalid".to_string())
}

impl From<ParkingError> for AppError {
    fn from(err: ParkingError) -> Self {
        match err {
            ParkingError::MissingLicensePlate | ParkingError::MissingSpotNumber => {
                AppError::BadRequest(err.to_string())
            }
            // Plaza inexistente: 400 como el resto de datos de entrada inválidos
            ParkingError::SpotNotFound(_) => AppError::BadRequest(err.to_string()),
            ParkingError::SpotOccupied(_) => AppError::Conflict(err.to_string()),
            ParkingError::NoActiveSession(_) => AppError::NotFound(err.to_string()),
            ParkingError::Fee(e) => AppError::from(e),
            ParkingError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<FeeError> for AppError {
    fn from(err: FeeError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parking_errors_map_to_api_statuses() {
        let cases = [
            (ParkingError::MissingLicensePlate, StatusCode::BAD_REQUEST),
            (ParkingError::MissingSpotNumber, StatusCode::BAD_REQUEST),
            (ParkingError::SpotNotFound(99), StatusCode::BAD_REQUEST),
            (ParkingError::SpotOccupied(3), StatusCode::BAD_REQUEST),
            (
                ParkingError::NoActiveSession("AB-123".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ParkingError::Store(StoreError::Integrity("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_carries_the_readable_message() {
        let body = body_of(AppError::from(ParkingError::SpotOccupied(3))).await;
        assert_eq!(body["error"], ParkingError::SpotOccupied(3).to_string());
        assert_eq!(body["code"], "CONFLICT");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_server_errors_hide_internals() {
        let body = body_of(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(body["error"], "An unexpected error occurred");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_auth_errors_statuses() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Jwt("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
