//! Carbon reduction calculation engine.

use super::region::{resolve_region_code, RegionType};
use crate::types::{InverterSample, PanelRecord};

/// Default whole-panel annual irradiance assumption (kWh/m²/year).
pub const DEFAULT_SOLAR_IRRADIANCE_KWH_PER_M2_YEAR: f64 = 1500.0;

/// Lifetime carbon reduction for a panel, computed once at registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifetimeReduction {
    pub annual_energy_kwh: f64,
    pub lifetime_energy_kwh: f64,
    pub lifetime_reduction_kgco2: f64,
    /// Panel-side carbon intensity (kgCO₂/kWh), amortized manufacturing
    /// footprint over lifetime energy.
    pub carbon_intensity: f64,
}

/// Computes the lifetime carbon reduction for `panel`.
pub fn lifetime_reduction(panel: &PanelRecord) -> LifetimeReduction {
    let annual_energy_kwh = (panel.nominal_efficiency_pct / 100.0)
        * panel.size_m2
        * DEFAULT_SOLAR_IRRADIANCE_KWH_PER_M2_YEAR;
    let lifetime_energy_kwh = annual_energy_kwh * panel.lifetime_years as f64;
    let lifetime_reduction_kgco2 =
        annual_energy_kwh * panel.carbon_reduction_factor * panel.lifetime_years as f64;
    let carbon_intensity = if lifetime_energy_kwh > 0.0 {
        panel.manufacturing_footprint_kgco2 / lifetime_energy_kwh
    } else {
        0.0
    };

    LifetimeReduction {
        annual_energy_kwh,
        lifetime_energy_kwh,
        lifetime_reduction_kgco2,
        carbon_intensity,
    }
}

/// Real-time reduction credited for a single `InverterSample`, after
/// region compensation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleReduction {
    /// Computed but not credited; informational only.
    pub theoretical_kw: f64,
    pub grid_emission_kgco2: f64,
    pub panel_emission_kgco2: f64,
    pub raw_reduction_kgco2: f64,
    pub region_type: RegionType,
    pub effective_reduction_kgco2: f64,
}

/// Evaluates a sample's credited reduction against its panel and the grid
/// emission factor of its resolved region.
pub fn sample_reduction(
    sample: &InverterSample,
    panel: &PanelRecord,
    carbon_intensity: f64,
    grid_factor: f64,
) -> SampleReduction {
    let temp_adjust = 1.0 + (-0.0045) * (sample.module_temperature_c - 25.0);
    let theoretical_kw = (panel.nominal_efficiency_pct / 100.0)
        * panel.size_m2
        * (sample.irradiance_w_per_m2 / 1000.0)
        * temp_adjust;

    let grid_emission_kgco2 = sample.energy_generated_kwh * grid_factor;
    let panel_emission_kgco2 = sample.energy_generated_kwh * carbon_intensity;
    let raw_reduction_kgco2 = grid_emission_kgco2 - panel_emission_kgco2;

    let region_code = resolve_region_code(&sample.location_tag);
    let region_type = RegionType::from_code(region_code);
    let effective_reduction_kgco2 = raw_reduction_kgco2 * region_type.compensation();

    SampleReduction {
        theoretical_kw,
        grid_emission_kgco2,
        panel_emission_kgco2,
        raw_reduction_kgco2,
        region_type,
        effective_reduction_kgco2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn panel() -> PanelRecord {
        PanelRecord::new(
            "p1",
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            22.5,
            1.8,
            "Oxford PV",
            1200.0,
            25,
            0.4,
            "alice",
        )
        .unwrap()
    }

    #[test]
    fn lifetime_reduction_computes_annual_and_lifetime_totals() {
        let r = lifetime_reduction(&panel());
        assert!((r.annual_energy_kwh - 607.5).abs() < 1e-9);
        assert!((r.lifetime_reduction_kgco2 - 6075.0).abs() < 1e-6);
    }

    #[test]
    fn sample_reduction_applies_region_compensation() {
        let sample = InverterSample {
            inverter_id: "inv-1".into(),
            panel_id: "p1".into(),
            timestamp: Utc::now(),
            power_output_kw: 0.3,
            irradiance_w_per_m2: 800.0,
            module_temperature_c: 25.0,
            energy_generated_kwh: 10.0,
            location_tag: "西藏自治区".into(),
            signature_bytes: "a".repeat(64),
        };
        let r = sample_reduction(&sample, &panel(), 0.1, 0.681);
        let raw = 10.0 * 0.681 - 10.0 * 0.1;
        assert_eq!(r.region_type, RegionType::TypeI);
        assert!((r.effective_reduction_kgco2 - raw * 0.9).abs() < 1e-9);
    }

    #[test]
    fn sample_reduction_can_be_negative_when_panel_emission_exceeds_grid() {
        let sample = InverterSample {
            inverter_id: "inv-1".into(),
            panel_id: "p1".into(),
            timestamp: Utc::now(),
            power_output_kw: 0.3,
            irradiance_w_per_m2: 800.0,
            module_temperature_c: 40.0,
            energy_generated_kwh: 10.0,
            location_tag: "untracked".into(),
            signature_bytes: "a".repeat(64),
        };
        let r = sample_reduction(&sample, &panel(), 5.0, 0.681);
        assert!(r.raw_reduction_kgco2 < 0.0);
    }
}
