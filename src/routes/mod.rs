//! Routers HTTP
//!
//! `create_app` monta las rutas públicas, las protegidas por token y las
//! reservadas a administradores.

pub mod auth_routes;
pub mod report_routes;
pub mod session_routes;
pub mod vehicle_routes;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{admin_only_middleware, auth_middleware, cors_layer};
use crate::repositories::ParkingStore;
use crate::state::AppState;

pub fn create_app<S: ParkingStore>(state: AppState<S>) -> Router {
    // route_layer: la ruta inexistente sigue siendo 404 y no 401
    let admin: Router<AppState<S>> = Router::new()
        .merge(report_routes::create_report_router())
        .merge(auth_routes::create_user_router())
        .route_layer(from_fn(admin_only_middleware));

    let protected: Router<AppState<S>> = Router::new()
        .merge(vehicle_routes::create_vehicle_router())
        .merge(session_routes::create_session_router())
        .merge(auth_routes::create_auth_router())
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware::<S>));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes::create_public_auth_router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
