//! Modelos de datos
//!
//! Este módulo contiene los structs que mapean las tablas del parking.

pub mod parking_session;
pub mod parking_spot;
pub mod user;
pub mod vehicle;

pub use parking_session::*;
pub use parking_spot::*;
pub use user::*;
pub use vehicle::*;
