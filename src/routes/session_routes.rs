use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::dto::session_dto::{DashboardResponse, SessionSearchQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ParkingSpot, SessionRecord};
use crate::repositories::ParkingStore;
use crate::services::report_service::build_search;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_session_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/sessions/active", get(active_sessions::<S>))
        .route("/api/sessions/search", get(search_sessions::<S>))
        .route("/api/spots", get(list_spots::<S>))
        .route("/api/dashboard", get(dashboard::<S>))
}

async fn active_sessions<S: ParkingStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<SessionRecord>>> {
    Ok(Json(state.report_service().active_sessions().await?))
}

async fn search_sessions<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<SessionSearchQuery>,
) -> AppResult<Json<Vec<SessionRecord>>> {
    let search = build_search(query.license_plate.as_deref(), query.parking_id.as_deref());
    Ok(Json(state.report_service().search_sessions(search.as_ref()).await?))
}

async fn list_spots<S: ParkingStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<ParkingSpot>>> {
    Ok(Json(state.report_service().spots().await?))
}

async fn dashboard<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<DashboardResponse>> {
    let occupancy = state.report_service().occupancy().await?;

    Ok(Json(DashboardResponse {
        username: user.username,
        role: user.role,
        occupancy,
    }))
}
