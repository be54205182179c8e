//! Utilidades del sistema
//!
//! Manejo de errores, JWT y reloj.

pub mod clock;
pub mod errors;
pub mod jwt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{AppError, AppResult};
