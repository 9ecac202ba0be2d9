//! Wind-plant analytics API server.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p windrose-web
//! cargo run -p windrose-web -- --port 8080
//! WINDROSE_BIND=0.0.0.0:8000 cargo run -p windrose-web
//! RUST_LOG=windrose=debug cargo run -p windrose-web
//! ```
//!
//! Then poll the API:
//!
//! ```bash
//! curl http://127.0.0.1:8000/api/health
//! curl -X POST http://127.0.0.1:8000/api/analysis/aep -H 'content-type: application/json' -d '{}'
//! curl http://127.0.0.1:8000/api/analysis/aep/status/<task_id>
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use windrose::prelude::*;
use windrose_web::{ServeConfig, Settings, spawn_server};

/// Wind-plant analytics API server.
#[derive(Parser)]
#[command(about = "HTTP service for wind-plant analytics")]
struct Args {
    /// Port to listen on (overrides WINDROSE_BIND).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut settings = Settings::from_env();
    if let Some(port) = args.port {
        settings.bind_addr.set_port(port);
    }

    // Load the plant eagerly so the first analysis request doesn't pay for it.
    let loader = Arc::new(PlantLoader::new());
    loader.load().await;

    let coordinator = AnalysisCoordinator::new();
    let addr = spawn_server(loader, coordinator, ServeConfig::from(settings)).await;
    info!(%addr, "windrose API listening");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("shutting down");
    Ok(())
}
