use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Plaza física numerada
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ParkingSpot {
    pub spot_number: i32,
    pub is_occupied: bool,
}

/// Conteos del panel de control
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct OccupancySummary {
    pub total_spots: i64,
    pub occupied_spots: i64,
    pub free_spots: i64,
    pub active_sessions: i64,
}

impl OccupancySummary {
    pub fn new(total_spots: i64, occupied_spots: i64, active_sessions: i64) -> Self {
        Self {
            total_spots,
            occupied_spots,
            free_spots: total_spots - occupied_spots,
            active_sessions,
        }
    }
}
