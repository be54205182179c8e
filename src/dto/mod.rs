//! DTOs de la API
//!
//! Cuerpos de request y response de los endpoints HTTP.

pub mod auth_dto;
pub mod parking_dto;
pub mod session_dto;

pub use auth_dto::*;
pub use parking_dto::*;
pub use session_dto::*;
