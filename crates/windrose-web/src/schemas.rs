//! Request and response bodies for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use windrose::tasks::TaskStatus;

// ── Plant ──────────────────────────────────────────────────────────

/// Plant overview summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlantSummary {
    pub name: String,
    pub capacity_mw: f64,
    pub turbine_count: usize,
    pub date_range_start: DateTime<Utc>,
    pub date_range_end: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Single turbine asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurbineInfo {
    pub asset_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub hub_height: f64,
    pub rotor_diameter: f64,
    pub rated_power: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

// ── Data ───────────────────────────────────────────────────────────

/// One resampled SCADA time-series point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScadaPoint {
    pub time: DateTime<Utc>,
    pub power_kw: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub temperature: f64,
    pub energy_kwh: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScadaResponse {
    pub data: Vec<ScadaPoint>,
}

/// One wind-rose bin (direction sector × speed band).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindRoseBin {
    pub direction_center: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub frequency: f64,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindRoseResponse {
    pub bins: Vec<WindRoseBin>,
}

/// Monthly energy production.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyEnergyPoint {
    pub month: String,
    pub year: i32,
    pub energy_mwh: f64,
    pub turbine_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyEnergyResponse {
    pub data: Vec<MonthlyEnergyPoint>,
}

// ── Analysis ───────────────────────────────────────────────────────

/// Request for power curve analysis.
///
/// Also serves as the cache parameter set — field order never affects the
/// fingerprint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerCurveRequest {
    #[serde(default)]
    pub turbine_id: Option<String>,
    #[serde(default = "default_power_curve_method")]
    pub method: String,
}

fn default_power_curve_method() -> String {
    "IEC".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerCurvePoint {
    pub wind_speed: f64,
    pub power: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerCurveResponse {
    pub scatter_data: Vec<PowerCurvePoint>,
    pub fitted_curve: Vec<PowerCurvePoint>,
    pub turbine_id: Option<String>,
    pub method: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectricalLossesRequest {
    #[serde(default)]
    pub uncertainty: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectricalLossesResponse {
    pub loss_percent: f64,
    pub total_turbine_energy: f64,
    pub total_meter_energy: f64,
    pub uncertainty_lower: Option<f64>,
    pub uncertainty_upper: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WakeLossesRequest {
    #[serde(default = "default_wind_direction_data_type")]
    pub wind_direction_data_type: String,
}

fn default_wind_direction_data_type() -> String {
    "scada".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurbineWakeLoss {
    pub turbine_id: String,
    pub wake_loss_pct: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WakeLossesResponse {
    pub plant_wake_loss_percent: f64,
    pub turbine_losses: Vec<TurbineWakeLoss>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YawMisalignmentRequest {
    #[serde(default)]
    pub turbine_ids: Option<Vec<String>>,
    #[serde(default)]
    pub ws_bins: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurbineYawResult {
    pub turbine_id: String,
    pub yaw_misalignment_deg: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YawMisalignmentResponse {
    pub turbine_results: Vec<TurbineYawResult>,
}

/// Request for the asynchronous AEP analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AepRequest {
    #[serde(default = "default_reanalysis_products")]
    pub reanalysis_products: Vec<String>,
    #[serde(default = "default_reg_model")]
    pub reg_model: String,
    #[serde(default = "default_time_resolution")]
    pub time_resolution: String,
    /// Monte Carlo iterations; falls back to the service default.
    #[serde(default)]
    pub num_sim: Option<u32>,
}

fn default_reanalysis_products() -> Vec<String> {
    vec!["era5".into(), "merra2".into()]
}

fn default_reg_model() -> String {
    "lin".into()
}

fn default_time_resolution() -> String {
    "MS".into()
}

/// The fully-resolved AEP parameter set used for fingerprinting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AepParams {
    pub reanalysis_products: Vec<String>,
    pub reg_model: String,
    pub time_resolution: String,
    pub num_sim: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AepResults {
    pub aep_gwh: f64,
    pub aep_lower: Option<f64>,
    pub aep_upper: Option<f64>,
    pub availability_pct: f64,
    pub curtailment_pct: f64,
    pub lt_por_ratio: f64,
    pub r2: f64,
    pub n_points: usize,
}

/// Task snapshot returned by the AEP submit and polling endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AepStatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub results: Option<Value>,
    pub error: Option<String>,
}

// ── Health ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub plant_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aep_request_fills_defaults() {
        let req: AepRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.reanalysis_products, vec!["era5", "merra2"]);
        assert_eq!(req.reg_model, "lin");
        assert_eq!(req.time_resolution, "MS");
        assert!(req.num_sim.is_none());
    }

    #[test]
    fn power_curve_request_defaults_to_iec() {
        let req: PowerCurveRequest = serde_json::from_str("{}").unwrap();
        assert!(req.turbine_id.is_none());
        assert_eq!(req.method, "IEC");
    }

    #[test]
    fn turbine_info_uses_type_field() {
        let info = TurbineInfo {
            asset_id: "R80711".into(),
            latitude: 48.0,
            longitude: 5.5,
            elevation: 411.0,
            hub_height: 80.0,
            rotor_diameter: 82.0,
            rated_power: 2050.0,
            kind: "turbine".into(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "turbine");
    }
}
