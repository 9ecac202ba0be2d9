//! Axum server setup and router construction.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// Routes:
/// - `/api/health`
/// - `/api/plant/*` — plant metadata
/// - `/api/data/*` — SCADA-derived series
/// - `/api/analysis/*` — cached and background analyses
pub fn build_router(state: AppState) -> Router {
    // Permissive CORS for the separately-served frontend.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/plant/summary", get(api::plant_summary))
        .route("/api/plant/turbines", get(api::plant_turbines))
        .route("/api/data/scada", get(api::scada_data))
        .route("/api/data/wind-rose", get(api::wind_rose))
        .route("/api/data/monthly-energy", get(api::monthly_energy))
        .route("/api/analysis/power-curve", post(api::run_power_curve))
        .route(
            "/api/analysis/electrical-losses",
            post(api::run_electrical_losses),
        )
        .route("/api/analysis/wake-losses", post(api::run_wake_losses))
        .route(
            "/api/analysis/yaw-misalignment",
            post(api::run_yaw_misalignment),
        )
        .route("/api/analysis/aep", post(api::start_aep))
        .route("/api/analysis/aep/status/{task_id}", get(api::aep_status))
        .layer(cors)
        .with_state(state)
}

/// Start the axum server on a background task and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(bind_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}
