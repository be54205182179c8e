use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use tracing::info;
use validator::Validate;

use crate::dto::parking_dto::{EntryRequest, EntryResponse, ExitRequest, ExitResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::repositories::ParkingStore;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_vehicle_router<S: ParkingStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/vehicles", post(record_entry::<S>))
        .route("/api/vehicles/exit", post(record_exit::<S>))
}

async fn record_entry<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<EntryRequest>, JsonRejection>,
) -> AppResult<Json<EntryResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let receipt = state.parking_service().record_entry(request.into()).await?;
    info!(
        "🚗 {} registró la entrada de {} en la plaza {}",
        user.username, receipt.license_plate, receipt.spot_number
    );

    Ok(Json(receipt.into()))
}

async fn record_exit<S: ParkingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<ExitRequest>, JsonRejection>,
) -> AppResult<Json<ExitResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let receipt = state
        .parking_service()
        .record_exit(request.license_plate.as_deref())
        .await?;
    info!(
        "🏁 {} registró la salida de {} (tarifa {})",
        user.username, receipt.license_plate, receipt.total_fee
    );

    Ok(Json(receipt.into()))
}
