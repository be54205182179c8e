//! Servicios de negocio
//!
//! Lógica de sesiones de aparcamiento, tarifas, informes y autenticación.

pub mod auth_service;
pub mod fee_calculator;
pub mod parking_service;
pub mod report_service;

pub use auth_service::AuthService;
pub use parking_service::ParkingService;
pub use report_service::ReportService;
