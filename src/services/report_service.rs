//! Consultas de informes
//!
//! Sesiones activas, búsqueda, informe de ingresos y panel de ocupación.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::models::{
    normalize_license_plate, EntryDateRange, OccupancySummary, ParkingSpot, SessionRecord,
    SessionSearch, SEARCH_LIMIT,
};
use crate::repositories::ParkingStore;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsReport {
    pub total_earnings: Decimal,
    pub sessions: Vec<SessionRecord>,
}

/// Suma de tarifas; las sesiones sin tarifa cuentan 0
pub fn total_earnings(sessions: &[SessionRecord]) -> Decimal {
    sessions.iter().filter_map(|s| s.total_fee).sum()
}

/// Fecha `YYYY-MM-DD`; vacía o ausente significa sin límite
pub fn parse_report_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be a date in YYYY-MM-DD format", field))),
    }
}

/// Filtros de búsqueda a partir de los parámetros crudos de la query.
///
/// `None` si `parking_id` no es un entero: ningún id puede coincidir.
pub fn build_search(license_plate: Option<&str>, parking_id: Option<&str>) -> Option<SessionSearch> {
    let session_id = match parking_id.map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<i64>().ok()?),
    };

    Some(SessionSearch {
        license_plate: license_plate.and_then(normalize_license_plate),
        session_id,
        limit: SEARCH_LIMIT,
    })
}

pub struct ReportService<S> {
    store: Arc<S>,
}

impl<S: ParkingStore> ReportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn active_sessions(&self) -> AppResult<Vec<SessionRecord>> {
        Ok(self.store.list_active_sessions().await?)
    }

    pub async fn search_sessions(&self, search: Option<&SessionSearch>) -> AppResult<Vec<SessionRecord>> {
        match search {
            Some(search) => Ok(self.store.search_sessions(search).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn earnings(&self, range: EntryDateRange) -> AppResult<EarningsReport> {
        let sessions = self.store.sessions_by_entry_date(&range).await?;
        Ok(EarningsReport {
            total_earnings: total_earnings(&sessions),
            sessions,
        })
    }

    pub async fn occupancy(&self) -> AppResult<OccupancySummary> {
        Ok(self.store.occupancy().await?)
    }

    pub async fn spots(&self) -> AppResult<Vec<ParkingSpot>> {
        Ok(self.store.list_spots().await?)
    }
}
