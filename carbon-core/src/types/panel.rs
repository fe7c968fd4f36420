use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Manufacturing and performance metadata for a registered panel.
///
/// Immutable after registration: the registry stores these by value and
/// never exposes a mutable handle to a caller outside the ledger actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    pub panel_id: String,
    pub production_date: NaiveDate,
    pub nominal_efficiency_pct: f64,
    pub size_m2: f64,
    pub manufacturer: String,
    pub manufacturing_footprint_kgco2: f64,
    pub lifetime_years: u32,
    pub carbon_reduction_factor: f64,
    pub owner: String,
}

/// Errors in panel field validation, raised before a `PanelRecord` is ever
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelFieldError {
    #[error("efficiency must satisfy 0 < efficiency <= 100, got {0}")]
    InvalidEfficiency(f64),

    #[error("panel size must be > 0, got {0}")]
    InvalidSize(f64),

    #[error("manufacturing footprint must be >= 0, got {0}")]
    InvalidFootprint(f64),

    #[error("lifetime_years must be >= 1, got {0}")]
    InvalidLifetime(u32),

    #[error("carbon_reduction_factor must be >= 0, got {0}")]
    InvalidReductionFactor(f64),
}

impl PanelRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        panel_id: impl Into<String>,
        production_date: NaiveDate,
        nominal_efficiency_pct: f64,
        size_m2: f64,
        manufacturer: impl Into<String>,
        manufacturing_footprint_kgco2: f64,
        lifetime_years: u32,
        carbon_reduction_factor: f64,
        owner: impl Into<String>,
    ) -> Result<Self, PanelFieldError> {
        if !(nominal_efficiency_pct > 0.0 && nominal_efficiency_pct <= 100.0) {
            return Err(PanelFieldError::InvalidEfficiency(nominal_efficiency_pct));
        }
        if !(size_m2 > 0.0) {
            return Err(PanelFieldError::InvalidSize(size_m2));
        }
        if manufacturing_footprint_kgco2 < 0.0 {
            return Err(PanelFieldError::InvalidFootprint(manufacturing_footprint_kgco2));
        }
        if lifetime_years < 1 {
            return Err(PanelFieldError::InvalidLifetime(lifetime_years));
        }
        if carbon_reduction_factor < 0.0 {
            return Err(PanelFieldError::InvalidReductionFactor(carbon_reduction_factor));
        }

        Ok(Self {
            panel_id: panel_id.into(),
            production_date,
            nominal_efficiency_pct,
            size_m2,
            manufacturer: manufacturer.into(),
            manufacturing_footprint_kgco2,
            lifetime_years,
            carbon_reduction_factor,
            owner: owner.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> (String, NaiveDate, f64, f64, String, f64, u32, f64, String) {
        (
            "panel-1".into(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            22.5,
            1.8,
            "Oxford PV".into(),
            1200.0,
            25,
            0.4,
            "alice".into(),
        )
    }

    #[test]
    fn rejects_out_of_range_efficiency() {
        let (id, date, _, size, manu, fp, life, factor, owner) = base();
        assert!(PanelRecord::new(id, date, 0.0, size, manu, fp, life, factor, owner).is_err());
    }

    #[test]
    fn rejects_zero_size() {
        let (id, date, eff, _, manu, fp, life, factor, owner) = base();
        assert!(PanelRecord::new(id, date, eff, 0.0, manu, fp, life, factor, owner).is_err());
    }

    #[test]
    fn accepts_valid_fields() {
        let (id, date, eff, size, manu, fp, life, factor, owner) = base();
        assert!(PanelRecord::new(id, date, eff, size, manu, fp, life, factor, owner).is_ok());
    }
}
