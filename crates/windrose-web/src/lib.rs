//! HTTP service exposing wind-plant analytics over the `windrose` core.
//!
//! `windrose-web` provides an axum server with three endpoint groups: plant
//! metadata, SCADA-derived data series, and analyses. Analyses are memoized
//! by parameter fingerprint; the long-running AEP analysis runs in the
//! background and is polled by task id.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use windrose::prelude::*;
//! use windrose_web::{ServeConfig, spawn_server};
//!
//! let loader = Arc::new(PlantLoader::new());
//! loader.load().await;
//! let coordinator = AnalysisCoordinator::new();
//!
//! let addr = spawn_server(loader, coordinator, ServeConfig::default()).await;
//! println!("API: http://{addr}/api/health");
//! ```
//!
//! # Architecture
//!
//! ```text
//! HTTP request ──▶ handler ──params──▶ AnalysisCoordinator ──▶ cache / tasks
//!                     │                                            │
//!                     └──────── Arc<PlantLoader> ◀── compute ──────┘
//! ```
//!
//! The coordinator and loader are constructed once per process (or per
//! test) and injected into the router state — no ambient globals.

pub mod analysis;
pub mod api;
pub mod config;
pub mod schemas;
mod server;

pub use api::AppState;
pub use config::Settings;
pub use server::build_router;

use std::net::SocketAddr;
use std::sync::Arc;

use windrose::prelude::{AnalysisCoordinator, PlantLoader};

/// Configuration for the web server.
pub struct ServeConfig {
    /// Address to bind to. Default: `127.0.0.1:8000`. Port 0 picks a random
    /// free port (used by the integration tests).
    pub bind_addr: SocketAddr,
    /// Default Monte Carlo iterations for AEP submissions. Default: 60.
    pub default_aep_num_sim: u32,
}

impl Default for ServeConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            bind_addr: settings.bind_addr,
            default_aep_num_sim: settings.default_aep_num_sim,
        }
    }
}

impl From<Settings> for ServeConfig {
    fn from(settings: Settings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            default_aep_num_sim: settings.default_aep_num_sim,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down. The caller keeps its
/// own handles to `loader` and `coordinator` — tests use them to observe
/// task state directly.
pub async fn spawn_server(
    loader: Arc<PlantLoader>,
    coordinator: AnalysisCoordinator,
    config: ServeConfig,
) -> SocketAddr {
    let state = AppState {
        loader,
        coordinator,
        default_aep_num_sim: config.default_aep_num_sim,
    };
    let router = server::build_router(state);
    server::start_server(router, config.bind_addr).await
}
