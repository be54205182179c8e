//! Middleware del sistema
//!
//! Autenticación por token, control de rol de administrador y CORS.

pub mod auth;
pub mod cors;

pub use auth::*;
pub use cors::*;
