use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OccupancySummary, SessionRecord, UserRole};
use crate::services::report_service::EarningsReport;

// Query de búsqueda; se reciben como texto y se validan en el servicio
#[derive(Debug, Default, Deserialize)]
pub struct SessionSearchQuery {
    pub license_plate: Option<String>,
    pub parking_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_earnings: Decimal,
    pub sessions: Vec<SessionRecord>,
}

impl From<EarningsReport> for ReportResponse {
    fn from(report: EarningsReport) -> Self {
        Self {
            total_earnings: report.total_earnings,
            sessions: report.sessions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub role: UserRole,
    #[serde(flatten)]
    pub occupancy: OccupancySummary,
}
