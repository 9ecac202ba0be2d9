//! REST API endpoint handlers.
//!
//! Handlers never run analyses inline: cheap data reads go straight to the
//! shared dataset, synchronous analyses are dispatched to the blocking pool
//! around the coordinator's memoized call, and the AEP analysis goes through
//! `submit_async` so the client polls a task id.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use windrose::error::AnalysisError;
use windrose::plant::{PlantData, PlantLoader};
use windrose::prelude::AnalysisCoordinator;

use crate::analysis;
use crate::schemas::{
    AepParams, AepRequest, AepStatusResponse, ElectricalLossesRequest, HealthResponse,
    MonthlyEnergyPoint, MonthlyEnergyResponse, PlantSummary, PowerCurveRequest, ScadaPoint,
    ScadaResponse, TurbineInfo, WakeLossesRequest, WindRoseBin, WindRoseResponse,
    YawMisalignmentRequest,
};

/// Shared application state passed to all handlers via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<PlantLoader>,
    pub coordinator: AnalysisCoordinator,
    /// Default Monte Carlo iteration count for AEP submissions.
    pub default_aep_num_sim: u32,
}

/// Error responses, mapped from the core taxonomy.
#[derive(Debug)]
pub enum ApiError {
    /// Plant dataset not loaded yet (startup still in progress).
    PlantNotLoaded,
    /// Unknown task id or other missing resource.
    NotFound(String),
    Analysis(AnalysisError),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::PlantNotLoaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Plant data not loaded".to_string(),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::Analysis(AnalysisError::InvalidParameters(detail)) => {
                (StatusCode::BAD_REQUEST, detail)
            }
            ApiError::Analysis(AnalysisError::TaskNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Task not found: {id}"))
            }
            ApiError::Analysis(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl AppState {
    fn plant(&self) -> Result<Arc<PlantData>, ApiError> {
        self.loader.get().ok_or(ApiError::PlantNotLoaded)
    }
}

/// Run a memoized analysis on the blocking pool and return its cached JSON.
async fn run_cached_blocking<F>(
    state: &AppState,
    namespace: &'static str,
    params: Value,
    compute: F,
) -> Result<Json<Value>, ApiError>
where
    F: FnOnce() -> Result<Value, AnalysisError> + Send + 'static,
{
    let coordinator = state.coordinator.clone();
    let value = tokio::task::spawn_blocking(move || {
        coordinator.run_cached(namespace, &params, compute)
    })
    .await
    .map_err(|e| {
        warn!(namespace, error = %e, "blocking analysis worker panicked");
        AnalysisError::Compute(format!("analysis worker panicked: {e}"))
    })??;
    Ok(Json(value))
}

fn to_cached_value<T: serde::Serialize>(value: T) -> Result<Value, AnalysisError> {
    serde_json::to_value(value).map_err(|e| AnalysisError::Compute(e.to_string()))
}

// ── Health ─────────────────────────────────────────────────────────

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        plant_loaded: state.loader.is_loaded(),
    })
}

// ── Plant ──────────────────────────────────────────────────────────

/// GET /api/plant/summary
pub async fn plant_summary(State(state): State<AppState>) -> Result<Json<PlantSummary>, ApiError> {
    let plant = state.plant()?;
    let (start, end) = plant
        .date_range()
        .ok_or_else(|| ApiError::Analysis(AnalysisError::Compute("SCADA series is empty".into())))?;
    Ok(Json(PlantSummary {
        name: plant.name.clone(),
        capacity_mw: plant.capacity_mw,
        turbine_count: plant.turbines.len(),
        date_range_start: start,
        date_range_end: end,
        latitude: plant.latitude,
        longitude: plant.longitude,
    }))
}

/// GET /api/plant/turbines
pub async fn plant_turbines(
    State(state): State<AppState>,
) -> Result<Json<Vec<TurbineInfo>>, ApiError> {
    let plant = state.plant()?;
    let turbines = plant
        .turbines
        .iter()
        .map(|t| TurbineInfo {
            asset_id: t.asset_id.clone(),
            latitude: t.latitude,
            longitude: t.longitude,
            elevation: t.elevation_m,
            hub_height: t.hub_height_m,
            rotor_diameter: t.rotor_diameter_m,
            rated_power: t.rated_power_kw,
            kind: "turbine".into(),
        })
        .collect();
    Ok(Json(turbines))
}

// ── Data ───────────────────────────────────────────────────────────

/// Supported SCADA resampling intervals.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub enum Resample {
    #[serde(rename = "10min")]
    TenMinutes,
    #[default]
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "1D")]
    Daily,
}

impl Resample {
    fn seconds(self) -> i64 {
        match self {
            Resample::TenMinutes => 600,
            Resample::Hourly => 3600,
            Resample::Daily => 86_400,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScadaQuery {
    pub turbine_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resample: Resample,
}

/// Most recent resampled rows returned by the SCADA endpoint.
const SCADA_ROW_LIMIT: usize = 2000;

/// GET /api/data/scada
pub async fn scada_data(
    State(state): State<AppState>,
    Query(query): Query<ScadaQuery>,
) -> Result<Json<ScadaResponse>, ApiError> {
    let plant = state.plant()?;
    let step = query.resample.seconds();

    // Bucket matching records by resample interval, averaging each bucket.
    let mut buckets: BTreeMap<i64, (f64, f64, f64, f64, f64, usize)> = BTreeMap::new();
    for record in &plant.scada {
        if let Some(id) = &query.turbine_id
            && record.asset_id != *id
        {
            continue;
        }
        if let Some(start) = query.start
            && record.time < start
        {
            continue;
        }
        if let Some(end) = query.end
            && record.time > end
        {
            continue;
        }
        let bucket = record.time.timestamp().div_euclid(step) * step;
        let entry = buckets.entry(bucket).or_default();
        entry.0 += record.power_kw;
        entry.1 += record.wind_speed_ms;
        entry.2 += record.wind_direction_deg;
        entry.3 += record.temperature_c;
        entry.4 += record.energy_kwh;
        entry.5 += 1;
    }

    let mut data: Vec<ScadaPoint> = buckets
        .into_iter()
        .map(|(bucket, (power, ws, wd, temp, energy, n))| {
            let n = n as f64;
            ScadaPoint {
                time: Utc.timestamp_opt(bucket, 0).single().unwrap_or_default(),
                power_kw: power / n,
                wind_speed: ws / n,
                wind_direction: wd / n,
                temperature: temp / n,
                energy_kwh: energy / n,
            }
        })
        .collect();
    if data.len() > SCADA_ROW_LIMIT {
        data.drain(..data.len() - SCADA_ROW_LIMIT);
    }

    Ok(Json(ScadaResponse { data }))
}

#[derive(Debug, Deserialize)]
pub struct TurbineQuery {
    pub turbine_id: Option<String>,
}

/// GET /api/data/wind-rose
pub async fn wind_rose(
    State(state): State<AppState>,
    Query(query): Query<TurbineQuery>,
) -> Result<Json<WindRoseResponse>, ApiError> {
    let plant = state.plant()?;
    // 16 direction sectors of 22.5 degrees, 5 speed bands.
    const SPEED_BINS: [f64; 6] = [0.0, 3.0, 6.0, 10.0, 15.0, 100.0];

    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut total = 0usize;
    for record in &plant.scada {
        if let Some(id) = &query.turbine_id
            && record.asset_id != *id
        {
            continue;
        }
        let dir_bin = ((record.wind_direction_deg / 22.5).floor() as usize).min(15);
        let speed_bin = SPEED_BINS[..SPEED_BINS.len() - 1]
            .iter()
            .rposition(|b| record.wind_speed_ms >= *b)
            .unwrap_or(0);
        *counts.entry((dir_bin, speed_bin)).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return Err(ApiError::NotFound(format!(
            "no SCADA rows for turbine {:?}",
            query.turbine_id
        )));
    }

    let bins = counts
        .into_iter()
        .map(|((dir_bin, speed_bin), count)| WindRoseBin {
            direction_center: (dir_bin as f64 + 0.5) * 22.5,
            speed_min: SPEED_BINS[speed_bin],
            speed_max: SPEED_BINS[speed_bin + 1],
            frequency: count as f64 / total as f64,
            count,
        })
        .collect();
    Ok(Json(WindRoseResponse { bins }))
}

/// GET /api/data/monthly-energy
pub async fn monthly_energy(
    State(state): State<AppState>,
    Query(query): Query<TurbineQuery>,
) -> Result<Json<MonthlyEnergyResponse>, ApiError> {
    let plant = state.plant()?;

    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in &plant.scada {
        if let Some(id) = &query.turbine_id
            && record.asset_id != *id
        {
            continue;
        }
        *totals
            .entry((record.time.year(), record.time.month()))
            .or_default() += record.energy_kwh;
    }

    let data = totals
        .into_iter()
        .map(|((year, month), kwh)| MonthlyEnergyPoint {
            month: format!("{year}-{month:02}"),
            year,
            energy_mwh: kwh / 1000.0,
            turbine_id: query.turbine_id.clone(),
        })
        .collect();
    Ok(Json(MonthlyEnergyResponse { data }))
}

// ── Analysis ───────────────────────────────────────────────────────

/// POST /api/analysis/power-curve
pub async fn run_power_curve(
    State(state): State<AppState>,
    Json(req): Json<PowerCurveRequest>,
) -> Result<Json<Value>, ApiError> {
    let plant = state.plant()?;
    let params = to_cached_value(&req)?;
    run_cached_blocking(&state, "power_curve", params, move || {
        to_cached_value(analysis::power_curve(&plant, &req)?)
    })
    .await
}

/// POST /api/analysis/electrical-losses
pub async fn run_electrical_losses(
    State(state): State<AppState>,
    Json(req): Json<ElectricalLossesRequest>,
) -> Result<Json<Value>, ApiError> {
    let plant = state.plant()?;
    let params = to_cached_value(&req)?;
    run_cached_blocking(&state, "electrical_losses", params, move || {
        to_cached_value(analysis::electrical_losses(&plant, req.uncertainty)?)
    })
    .await
}

/// POST /api/analysis/wake-losses
pub async fn run_wake_losses(
    State(state): State<AppState>,
    Json(req): Json<WakeLossesRequest>,
) -> Result<Json<Value>, ApiError> {
    let plant = state.plant()?;
    let params = to_cached_value(&req)?;
    run_cached_blocking(&state, "wake_losses", params, move || {
        to_cached_value(analysis::wake_losses(&plant, &req.wind_direction_data_type)?)
    })
    .await
}

/// Default wind-speed bins for yaw misalignment (m/s).
const DEFAULT_WS_BINS: [f64; 4] = [5.0, 6.0, 7.0, 8.0];

/// POST /api/analysis/yaw-misalignment
pub async fn run_yaw_misalignment(
    State(state): State<AppState>,
    Json(req): Json<YawMisalignmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let plant = state.plant()?;
    let params = to_cached_value(&req)?;
    run_cached_blocking(&state, "yaw_misalignment", params, move || {
        let ws_bins = req.ws_bins.clone().unwrap_or_else(|| DEFAULT_WS_BINS.to_vec());
        to_cached_value(analysis::yaw_misalignment(
            &plant,
            req.turbine_ids.as_deref(),
            &ws_bins,
        )?)
    })
    .await
}

/// POST /api/analysis/aep — submit the asynchronous AEP analysis.
///
/// Returns immediately: `completed` with results on a warm cache, `running`
/// with a pollable task id otherwise. Identical concurrent submissions
/// coalesce onto one execution.
pub async fn start_aep(
    State(state): State<AppState>,
    Json(req): Json<AepRequest>,
) -> Result<Json<AepStatusResponse>, ApiError> {
    let plant = state.plant()?;
    let params = AepParams {
        reanalysis_products: req.reanalysis_products,
        reg_model: req.reg_model,
        time_resolution: req.time_resolution,
        num_sim: req.num_sim.unwrap_or(state.default_aep_num_sim),
    };

    let compute_params = params.clone();
    let submission = state.coordinator.submit_async("aep", &params, move || {
        to_cached_value(analysis::run_aep(&plant, &compute_params)?)
    })?;

    let task = state
        .coordinator
        .get_task(&submission.task_id)
        .ok_or_else(|| ApiError::Analysis(AnalysisError::TaskNotFound(submission.task_id.clone())))?;
    Ok(Json(AepStatusResponse {
        task_id: task.task_id,
        status: task.status,
        results: task.result,
        error: task.error,
    }))
}

/// GET /api/analysis/aep/status/{task_id} — poll an AEP task.
pub async fn aep_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<AepStatusResponse>, ApiError> {
    let task = state
        .coordinator
        .get_task(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {task_id}")))?;
    Ok(Json(AepStatusResponse {
        task_id: task.task_id,
        status: task.status,
        results: task.result,
        error: task.error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_deserializes_from_query_names() {
        let query: ScadaQuery =
            serde_json::from_str(r#"{"resample": "1D"}"#).unwrap();
        assert!(matches!(query.resample, Resample::Daily));
        assert_eq!(query.resample.seconds(), 86_400);
    }

    #[test]
    fn resample_defaults_to_hourly() {
        let query: ScadaQuery = serde_json::from_str("{}").unwrap();
        assert!(matches!(query.resample, Resample::Hourly));
    }

    #[test]
    fn api_error_maps_invalid_parameters_to_400() {
        let response =
            ApiError::Analysis(AnalysisError::InvalidParameters("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_missing_plant_to_503() {
        let response = ApiError::PlantNotLoaded.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
