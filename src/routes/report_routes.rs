use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use tracing::info;

use crate::dto::session_dto::{ReportQuery, ReportResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::EntryDateRange;
use crate::repositories::ParkingStore;
use crate::services::report_service::parse_report_date;
use crate::state::AppState;
use crate::utils::errors::AppResult;

/// Rutas de informes; se montan detrás del middleware de admin
pub fn create_report_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new().route("/api/reports", get(earnings_report::<S>))
}

async fn earnings_report<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ReportResponse>> {
    let range = EntryDateRange {
        start: parse_report_date("start_date", query.start_date.as_deref())?,
        end: parse_report_date("end_date", query.end_date.as_deref())?,
    };

    let report = state.report_service().earnings(range).await?;
    info!(
        "📊 Informe para {}: {} sesiones, total {}",
        user.username,
        report.sessions.len(),
        report.total_earnings
    );

    Ok(Json(report.into()))
}
