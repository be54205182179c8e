//! Modelo de Vehicle
//!
//! Mapea la tabla `vehicles`. Un vehículo se crea en su primera entrada y no se borra nunca.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo asignado cuando la entrada no indica ninguno
pub const DEFAULT_VEHICLE_TYPE: &str = "car";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: String,
    pub vehicle_type: String,
    pub created_at: DateTime<Utc>,
}

/// Categorías con tarifa propia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Bike,
    Car,
    Truck,
}

impl VehicleType {
    /// Los tipos desconocidos se tarifican como coche
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "bike" => VehicleType::Bike,
            "truck" => VehicleType::Truck,
            _ => VehicleType::Car,
        }
    }
}

/// Matrícula en mayúsculas y sin espacios exteriores; `None` si queda vacía
pub fn normalize_license_plate(raw: &str) -> Option<String> {
    let plate = raw.trim().to_uppercase();
    if plate.is_empty() {
        None
    } else {
        Some(plate)
    }
}

/// Tipo en minúsculas; vacío o ausente equivale a `car`
pub fn normalize_vehicle_type(raw: Option<&str>) -> String {
    match raw.map(|t| t.trim().to_lowercase()) {
        Some(t) if !t.is_empty() => t,
        _ => DEFAULT_VEHICLE_TYPE.to_string(),
    }
}
