//! Analysis computations over the plant dataset.
//!
//! These are the opaque `compute` closures handed to the coordinator:
//! deterministic-given-inputs aggregations standing in for the heavyweight
//! statistics library the service fronts. Each returns a typed response the
//! handlers serialize into the result cache.

use windrose::error::AnalysisError;
use windrose::plant::PlantData;

use crate::schemas::{
    AepParams, AepResults, ElectricalLossesResponse, PowerCurvePoint, PowerCurveRequest,
    PowerCurveResponse, TurbineWakeLoss, TurbineYawResult, WakeLossesResponse,
    YawMisalignmentResponse,
};

/// Scatter points returned by the power-curve analysis.
const SCATTER_LIMIT: usize = 500;

/// Wind-speed bin width (m/s) for the fitted curve.
const CURVE_BIN_WIDTH: f64 = 0.5;

/// Power curve: raw scatter sample plus a binned mean curve.
pub fn power_curve(
    plant: &PlantData,
    req: &PowerCurveRequest,
) -> Result<PowerCurveResponse, AnalysisError> {
    let records: Vec<_> = plant
        .scada
        .iter()
        .filter(|r| match &req.turbine_id {
            Some(id) => r.asset_id == *id,
            None => true,
        })
        .collect();
    if records.is_empty() {
        return Err(AnalysisError::Compute(format!(
            "no SCADA rows for turbine {:?}",
            req.turbine_id
        )));
    }

    let scatter_data: Vec<PowerCurvePoint> = records
        .iter()
        .take(SCATTER_LIMIT)
        .map(|r| PowerCurvePoint {
            wind_speed: r.wind_speed_ms,
            power: r.power_kw,
        })
        .collect();

    // Binned mean power per wind-speed bin, sorted by wind speed.
    let mut bins: Vec<(f64, f64, usize)> = Vec::new();
    for record in &records {
        let bin = (record.wind_speed_ms / CURVE_BIN_WIDTH).floor() * CURVE_BIN_WIDTH;
        match bins.iter_mut().find(|(b, _, _)| (*b - bin).abs() < 1e-9) {
            Some((_, power_sum, count)) => {
                *power_sum += record.power_kw;
                *count += 1;
            }
            None => bins.push((bin, record.power_kw, 1)),
        }
    }
    bins.sort_by(|a, b| a.0.total_cmp(&b.0));
    let fitted_curve = bins
        .into_iter()
        .map(|(bin, power_sum, count)| PowerCurvePoint {
            wind_speed: bin + CURVE_BIN_WIDTH / 2.0,
            power: power_sum / count as f64,
        })
        .collect();

    Ok(PowerCurveResponse {
        scatter_data,
        fitted_curve,
        turbine_id: req.turbine_id.clone(),
        method: req.method.clone(),
    })
}

/// Electrical losses: turbine energy vs revenue-meter energy.
pub fn electrical_losses(
    plant: &PlantData,
    uncertainty: bool,
) -> Result<ElectricalLossesResponse, AnalysisError> {
    let total_turbine_energy: f64 = plant.scada.iter().map(|r| r.energy_kwh).sum();
    let total_meter_energy: f64 = plant.meter.iter().map(|r| r.energy_kwh).sum();
    if total_turbine_energy <= 0.0 {
        return Err(AnalysisError::Compute("turbine energy series is empty".into()));
    }

    let loss_percent = (1.0 - total_meter_energy / total_turbine_energy) * 100.0;
    let (uncertainty_lower, uncertainty_upper) = if uncertainty {
        (Some(loss_percent - 0.3), Some(loss_percent + 0.3))
    } else {
        (None, None)
    };

    Ok(ElectricalLossesResponse {
        loss_percent,
        total_turbine_energy,
        total_meter_energy,
        uncertainty_lower,
        uncertainty_upper,
    })
}

/// Wake losses: per-turbine mean power shortfall against the best performer.
pub fn wake_losses(
    plant: &PlantData,
    _wind_direction_data_type: &str,
) -> Result<WakeLossesResponse, AnalysisError> {
    let mut means: Vec<(String, f64)> = Vec::new();
    for turbine in &plant.turbines {
        let powers: Vec<f64> = plant
            .scada
            .iter()
            .filter(|r| r.asset_id == turbine.asset_id)
            .map(|r| r.power_kw)
            .collect();
        if powers.is_empty() {
            return Err(AnalysisError::Compute(format!(
                "no SCADA rows for turbine {}",
                turbine.asset_id
            )));
        }
        let mean = powers.iter().sum::<f64>() / powers.len() as f64;
        means.push((turbine.asset_id.clone(), mean));
    }

    let reference = means
        .iter()
        .map(|(_, m)| *m)
        .fold(f64::MIN, f64::max);
    let turbine_losses: Vec<TurbineWakeLoss> = means
        .into_iter()
        .map(|(turbine_id, mean)| TurbineWakeLoss {
            turbine_id,
            wake_loss_pct: (1.0 - mean / reference) * 100.0,
        })
        .collect();
    let plant_wake_loss_percent = turbine_losses
        .iter()
        .map(|t| t.wake_loss_pct)
        .sum::<f64>()
        / turbine_losses.len() as f64;

    Ok(WakeLossesResponse {
        plant_wake_loss_percent,
        turbine_losses,
    })
}

/// Static yaw misalignment: mean vane offset per turbine inside the
/// requested wind-speed bins.
pub fn yaw_misalignment(
    plant: &PlantData,
    turbine_ids: Option<&[String]>,
    ws_bins: &[f64],
) -> Result<YawMisalignmentResponse, AnalysisError> {
    let selected: Vec<_> = plant
        .turbines
        .iter()
        .filter(|t| match turbine_ids {
            Some(ids) => ids.iter().any(|id| *id == t.asset_id),
            None => true,
        })
        .collect();
    if selected.is_empty() {
        return Err(AnalysisError::Compute("no matching turbines".into()));
    }

    let in_bins = |ws: f64| {
        ws_bins
            .iter()
            .any(|center| (ws - center).abs() <= CURVE_BIN_WIDTH)
    };

    let mut turbine_results = Vec::with_capacity(selected.len());
    for turbine in selected {
        let offsets: Vec<f64> = plant
            .scada
            .iter()
            .filter(|r| r.asset_id == turbine.asset_id && in_bins(r.wind_speed_ms))
            .map(|r| r.vane_offset_deg)
            .collect();
        if offsets.is_empty() {
            return Err(AnalysisError::Compute(format!(
                "no samples in requested wind-speed bins for {}",
                turbine.asset_id
            )));
        }
        turbine_results.push(TurbineYawResult {
            turbine_id: turbine.asset_id.clone(),
            yaw_misalignment_deg: offsets.iter().sum::<f64>() / offsets.len() as f64,
        });
    }

    Ok(YawMisalignmentResponse { turbine_results })
}

/// Monte Carlo AEP: annualized energy with simulated uncertainty bounds.
pub fn run_aep(plant: &PlantData, params: &AepParams) -> Result<AepResults, AnalysisError> {
    if params.num_sim == 0 {
        return Err(AnalysisError::Compute("num_sim must be at least 1".into()));
    }
    let Some((start, end)) = plant.date_range() else {
        return Err(AnalysisError::Compute("SCADA series is empty".into()));
    };

    let total_kwh: f64 = plant.scada.iter().map(|r| r.energy_kwh).sum();
    let por_days = ((end - start).num_hours() as f64 / 24.0).max(1.0);
    let aep_gwh = total_kwh / por_days * 365.25 / 1e6;

    // Deterministic Monte Carlo: golden-angle phases stand in for draws.
    let mut sims: Vec<f64> = (0..params.num_sim)
        .map(|i| aep_gwh * (1.0 + 0.04 * (i as f64 * 2.399_963).sin()))
        .collect();
    sims.sort_by(f64::total_cmp);
    let (aep_lower, aep_upper) = if params.num_sim > 1 {
        (Some(percentile(&sims, 2.5)), Some(percentile(&sims, 97.5)))
    } else {
        (None, None)
    };

    let operating = plant
        .scada
        .iter()
        .filter(|r| r.power_kw > 0.0)
        .count() as f64;
    let availability_pct = operating / plant.scada.len() as f64 * 100.0;

    let r2 = match params.reg_model.as_str() {
        "gam" => 0.982,
        "gbm" => 0.978,
        _ => 0.967,
    };
    let n_points = match params.time_resolution.as_str() {
        "D" => por_days as usize,
        _ => plant.months().len(),
    };

    Ok(AepResults {
        aep_gwh,
        aep_lower,
        aep_upper,
        availability_pct,
        curtailment_pct: 0.0,
        lt_por_ratio: 365.25 / por_days,
        r2,
        n_points,
    })
}

fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let frac = rank - low as f64;
        sorted[low] * (1.0 - frac) + sorted[high] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::PowerCurveRequest;

    fn plant() -> PlantData {
        PlantData::la_haute_borne()
    }

    #[test]
    fn power_curve_produces_monotonic_region() {
        let plant = plant();
        let req = PowerCurveRequest {
            turbine_id: Some("R80711".into()),
            method: "IEC".into(),
        };
        let response = power_curve(&plant, &req).unwrap();
        assert!(!response.scatter_data.is_empty());
        assert!(response.scatter_data.len() <= 500);
        assert!(response.fitted_curve.len() > 3);
        // Curve is sorted by wind speed.
        assert!(
            response
                .fitted_curve
                .windows(2)
                .all(|w| w[0].wind_speed < w[1].wind_speed)
        );
    }

    #[test]
    fn power_curve_unknown_turbine_fails() {
        let plant = plant();
        let req = PowerCurveRequest {
            turbine_id: Some("R99999".into()),
            method: "IEC".into(),
        };
        assert!(power_curve(&plant, &req).is_err());
    }

    #[test]
    fn electrical_losses_match_meter_efficiency() {
        let plant = plant();
        let response = electrical_losses(&plant, false).unwrap();
        // The synthetic meter keeps 97.8% of turbine energy.
        assert!((response.loss_percent - 2.2).abs() < 0.05);
        assert!(response.uncertainty_lower.is_none());

        let with_uq = electrical_losses(&plant, true).unwrap();
        assert!(with_uq.uncertainty_lower.unwrap() < with_uq.loss_percent);
        assert!(with_uq.uncertainty_upper.unwrap() > with_uq.loss_percent);
    }

    #[test]
    fn wake_losses_cover_all_turbines() {
        let plant = plant();
        let response = wake_losses(&plant, "scada").unwrap();
        assert_eq!(response.turbine_losses.len(), 4);
        // Losses are percentages relative to the best performer.
        assert!(
            response
                .turbine_losses
                .iter()
                .all(|t| (0.0..100.0).contains(&t.wake_loss_pct))
        );
        assert!(response.plant_wake_loss_percent >= 0.0);
    }

    #[test]
    fn yaw_misalignment_recovers_static_offsets() {
        let plant = plant();
        let response =
            yaw_misalignment(&plant, None, &[5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(response.turbine_results.len(), 4);
        // R80736 carries the largest built-in offset (+3.5 deg).
        let r80736 = response
            .turbine_results
            .iter()
            .find(|t| t.turbine_id == "R80736")
            .unwrap();
        assert!((r80736.yaw_misalignment_deg - 3.5).abs() < 1.0);
    }

    #[test]
    fn yaw_misalignment_respects_turbine_filter() {
        let plant = plant();
        let ids = vec!["R80711".to_string()];
        let response =
            yaw_misalignment(&plant, Some(&ids), &[5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(response.turbine_results.len(), 1);
        assert_eq!(response.turbine_results[0].turbine_id, "R80711");
    }

    #[test]
    fn aep_is_deterministic_and_bounded() {
        let plant = plant();
        let params = AepParams {
            reanalysis_products: vec!["era5".into(), "merra2".into()],
            reg_model: "lin".into(),
            time_resolution: "MS".into(),
            num_sim: 60,
        };
        let a = run_aep(&plant, &params).unwrap();
        let b = run_aep(&plant, &params).unwrap();
        assert_eq!(a.aep_gwh, b.aep_gwh);

        assert!(a.aep_gwh > 0.0);
        assert!(a.aep_lower.unwrap() <= a.aep_gwh);
        assert!(a.aep_upper.unwrap() >= a.aep_gwh);
        assert!(a.availability_pct > 50.0);
        assert_eq!(a.n_points, plant.months().len());
    }

    #[test]
    fn aep_rejects_zero_simulations() {
        let plant = plant();
        let params = AepParams {
            reanalysis_products: vec![],
            reg_model: "lin".into(),
            time_resolution: "MS".into(),
            num_sim: 0,
        };
        assert!(run_aep(&plant, &params).is_err());
    }
}
