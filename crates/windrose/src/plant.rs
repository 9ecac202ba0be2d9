//! Shared plant dataset and its at-most-once loader.
//!
//! Every analysis reads the same immutable [`PlantData`] handle. The
//! [`PlantLoader`] guards initialization with a `tokio::sync::OnceCell`, so
//! concurrent first calls to [`PlantLoader::load`] perform exactly one
//! initialization and all callers share the same `Arc` thereafter.
//!
//! The built-in dataset models the ENGIE La Haute Borne plant (4 turbines,
//! 8.2 MW) with deterministic synthetic hourly SCADA, so the service runs
//! self-contained. Real data ingestion and validation are out of scope.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// One turbine asset.
#[derive(Clone, Debug, Serialize)]
pub struct Turbine {
    pub asset_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub hub_height_m: f64,
    pub rotor_diameter_m: f64,
    pub rated_power_kw: f64,
}

/// One SCADA sample for one turbine.
#[derive(Clone, Debug)]
pub struct ScadaRecord {
    pub time: DateTime<Utc>,
    pub asset_id: String,
    pub power_kw: f64,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: f64,
    /// Wind-vane offset relative to nacelle heading.
    pub vane_offset_deg: f64,
    pub temperature_c: f64,
    pub energy_kwh: f64,
}

/// One plant-level revenue-meter sample.
#[derive(Clone, Debug)]
pub struct MeterRecord {
    pub time: DateTime<Utc>,
    pub energy_kwh: f64,
}

/// The immutable-after-construction plant dataset.
#[derive(Clone, Debug)]
pub struct PlantData {
    pub name: String,
    pub capacity_mw: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub turbines: Vec<Turbine>,
    pub scada: Vec<ScadaRecord>,
    pub meter: Vec<MeterRecord>,
}

/// Fraction of turbine energy that reaches the revenue meter in the
/// synthetic dataset (the rest is electrical loss).
const METER_EFFICIENCY: f64 = 0.978;

/// Days of hourly SCADA generated for the built-in dataset.
const SCADA_DAYS: i64 = 90;

impl PlantData {
    /// Deterministic synthetic rendition of the La Haute Borne plant.
    ///
    /// Wind speed, direction, and temperature follow overlaid diurnal and
    /// multi-day cycles; power comes from a cut-in/rated/cut-out curve with
    /// a per-turbine wake deficit when the flow arrives from the dominant
    /// south-west sector. Identical on every call.
    pub fn la_haute_borne() -> Self {
        let turbines = vec![
            turbine("R80711", 48.4461, 5.5925),
            turbine("R80721", 48.4497, 5.5869),
            turbine("R80736", 48.4508, 5.5941),
            turbine("R80790", 48.4536, 5.5875),
        ];
        // Static vane offsets give the yaw-misalignment analysis a signal.
        let vane_offsets = [-2.5, 1.0, 3.5, -0.5];
        // Wake deficit applied when wind comes from 210–270 degrees.
        let wake_deficits = [0.0, 0.04, 0.09, 0.06];

        let start = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let hours = SCADA_DAYS * 24;

        let mut scada = Vec::with_capacity((hours as usize) * turbines.len());
        let mut meter = Vec::with_capacity(hours as usize);
        for h in 0..hours {
            let time = start + Duration::hours(h);
            let t = h as f64;

            let wind_speed_base = 7.0
                + 2.5 * (t * std::f64::consts::TAU / 24.0).sin()
                + 1.5 * (t * std::f64::consts::TAU / (24.0 * 11.0)).sin();
            let wind_direction =
                (230.0 + 60.0 * (t * std::f64::consts::TAU / (24.0 * 7.0)).sin()).rem_euclid(360.0);
            let temperature = 8.0
                + 6.0 * (t * std::f64::consts::TAU / (24.0 * 365.0)).sin()
                + 2.0 * (t * std::f64::consts::TAU / 24.0).sin();

            let mut plant_energy = 0.0;
            for (i, turbine) in turbines.iter().enumerate() {
                // Small per-turbine and per-hour variation, fully deterministic.
                let jitter = 0.6 * ((t * 12.9898 + i as f64 * 78.233).sin());
                let wind_speed = (wind_speed_base + 0.3 * i as f64 + jitter).max(0.0);

                let waked = (210.0..=270.0).contains(&wind_direction);
                let deficit = if waked { wake_deficits[i] } else { 0.0 };
                let power = power_curve_kw(wind_speed, turbine.rated_power_kw) * (1.0 - deficit);

                let vane = vane_offsets[i] + 1.2 * ((t * 3.31 + i as f64).sin());
                plant_energy += power;
                scada.push(ScadaRecord {
                    time,
                    asset_id: turbine.asset_id.clone(),
                    power_kw: power,
                    wind_speed_ms: wind_speed,
                    wind_direction_deg: wind_direction,
                    vane_offset_deg: vane,
                    temperature_c: temperature,
                    energy_kwh: power, // hourly samples
                });
            }
            meter.push(MeterRecord {
                time,
                energy_kwh: plant_energy * METER_EFFICIENCY,
            });
        }

        Self {
            name: "La Haute Borne".into(),
            capacity_mw: 8.2,
            latitude: 48.4497,
            longitude: 5.5896,
            turbines,
            scada,
            meter,
        }
    }

    pub fn turbine_ids(&self) -> Vec<&str> {
        self.turbines.iter().map(|t| t.asset_id.as_str()).collect()
    }

    /// First and last SCADA timestamps, if any data exists.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.scada.first()?.time;
        let last = self.scada.last()?.time;
        Some((first, last))
    }

    /// Months (year, month) covered by the SCADA series, in order.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        for record in &self.scada {
            let key = (record.time.year(), record.time.month());
            if months.last() != Some(&key) {
                months.push(key);
            }
        }
        months
    }
}

fn turbine(asset_id: &str, latitude: f64, longitude: f64) -> Turbine {
    Turbine {
        asset_id: asset_id.into(),
        latitude,
        longitude,
        elevation_m: 411.0,
        hub_height_m: 80.0,
        rotor_diameter_m: 82.0,
        rated_power_kw: 2050.0,
    }
}

/// Idealized power curve: cut-in 3 m/s, rated at 12 m/s, cut-out 25 m/s.
fn power_curve_kw(wind_speed_ms: f64, rated_kw: f64) -> f64 {
    if wind_speed_ms < 3.0 || wind_speed_ms > 25.0 {
        0.0
    } else if wind_speed_ms >= 12.0 {
        rated_kw
    } else {
        let frac = (wind_speed_ms - 3.0) / 9.0;
        rated_kw * frac.powi(3).min(1.0)
    }
}

/// Lazily-initialized, process-wide plant singleton.
///
/// `load()` is idempotent and thread-safe: concurrent first callers race on
/// one initialization, everyone gets the same `Arc<PlantData>` afterwards.
#[derive(Debug, Default)]
pub struct PlantLoader {
    cell: OnceCell<Arc<PlantData>>,
}

impl PlantLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the plant dataset, initializing it at most once.
    pub async fn load(&self) -> Arc<PlantData> {
        self.cell
            .get_or_init(|| async {
                let plant = PlantData::la_haute_borne();
                info!(
                    name = %plant.name,
                    turbines = plant.turbines.len(),
                    scada_rows = plant.scada.len(),
                    "plant data loaded"
                );
                Arc::new(plant)
            })
            .await
            .clone()
    }

    /// The loaded dataset, or `None` before the first `load()` finishes.
    pub fn get(&self) -> Option<Arc<PlantData>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_is_deterministic() {
        let a = PlantData::la_haute_borne();
        let b = PlantData::la_haute_borne();
        assert_eq!(a.scada.len(), b.scada.len());
        assert_eq!(a.scada[1000].power_kw, b.scada[1000].power_kw);
        assert_eq!(a.meter[500].energy_kwh, b.meter[500].energy_kwh);
    }

    #[test]
    fn dataset_shape() {
        let plant = PlantData::la_haute_borne();
        assert_eq!(plant.turbines.len(), 4);
        assert_eq!(plant.scada.len(), 90 * 24 * 4);
        assert_eq!(plant.meter.len(), 90 * 24);
        assert_eq!(
            plant.turbine_ids(),
            vec!["R80711", "R80721", "R80736", "R80790"]
        );
    }

    #[test]
    fn power_never_exceeds_rated() {
        let plant = PlantData::la_haute_borne();
        for record in &plant.scada {
            assert!(record.power_kw >= 0.0);
            assert!(record.power_kw <= 2050.0 + f64::EPSILON);
        }
    }

    #[test]
    fn meter_energy_below_turbine_energy() {
        let plant = PlantData::la_haute_borne();
        let turbine_total: f64 = plant.scada.iter().map(|r| r.energy_kwh).sum();
        let meter_total: f64 = plant.meter.iter().map(|r| r.energy_kwh).sum();
        assert!(meter_total < turbine_total);
        assert!(meter_total > turbine_total * 0.9);
    }

    #[test]
    fn months_are_in_order() {
        let plant = PlantData::la_haute_borne();
        let months = plant.months();
        assert_eq!(months.first(), Some(&(2014, 1)));
        assert!(months.len() >= 3);
    }

    #[tokio::test]
    async fn loader_initializes_once() {
        let loader = PlantLoader::new();
        assert!(!loader.is_loaded());
        assert!(loader.get().is_none());

        let a = loader.load().await;
        let b = loader.load().await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(loader.is_loaded());
        assert!(Arc::ptr_eq(&loader.get().unwrap(), &a));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_loads_share_one_instance() {
        let loader = Arc::new(PlantLoader::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let loader = Arc::clone(&loader);
            handles.push(tokio::spawn(async move { loader.load().await }));
        }
        let mut arcs = Vec::new();
        for handle in handles {
            arcs.push(handle.await.unwrap());
        }
        assert!(arcs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
