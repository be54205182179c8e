//! Parking Tracker
//!
//! Servicio HTTP/JSON para registrar entradas y salidas de vehículos,
//! calcular tarifas y consultar ocupación e ingresos.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
