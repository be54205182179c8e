//! Modelo de ParkingSession
//!
//! Una sesión es un evento completo de aparcar y salir. Se crea en la entrada,
//! se modifica una sola vez en la salida y nunca se borra.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Máximo de filas devueltas por la búsqueda
pub const SEARCH_LIMIT: i64 = 50;

/// Fila de `parking_sessions`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ParkingSession {
    pub id: i64,
    pub vehicle_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub total_fee: Option<Decimal>,
    pub spot_number: i32,
}

impl ParkingSession {
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// Datos para abrir una sesión
#[derive(Debug, Clone)]
pub struct NewSession {
    pub vehicle_id: i64,
    pub spot_number: i32,
    pub entry_time: DateTime<Utc>,
}

/// Sesión activa localizada por matrícula, con el tipo del vehículo para tarificar
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct ActiveSession {
    pub session_id: i64,
    pub license_plate: String,
    pub vehicle_type: String,
    pub entry_time: DateTime<Utc>,
    pub spot_number: i32,
}

/// Sesión unida a su vehículo, tal como la devuelven los listados
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SessionRecord {
    pub id: i64,
    pub license_plate: String,
    pub vehicle_type: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_fee: Option<Decimal>,
    pub spot_number: i32,
}

/// Filtros exactos de la búsqueda de sesiones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSearch {
    pub license_plate: Option<String>,
    pub session_id: Option<i64>,
    pub limit: i64,
}

/// Rango inclusivo sobre la fecha (UTC) de entrada
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryDateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl EntryDateRange {
    pub fn contains(&self, entry_time: &DateTime<Utc>) -> bool {
        let date = entry_time.date_naive();
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}
