use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single telemetry reading submitted by an inverter, owned by the
/// pending pool until it is mined into a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterSample {
    pub inverter_id: String,
    pub panel_id: String,
    pub timestamp: DateTime<Utc>,
    pub power_output_kw: f64,
    pub irradiance_w_per_m2: f64,
    pub module_temperature_c: f64,
    /// Cumulative-day energy counter used for crediting (kWh).
    pub energy_generated_kwh: f64,
    pub location_tag: String,
    pub signature_bytes: String,
}

impl InverterSample {
    /// Identifier baked into the block's payload digest:
    /// `inverter_id || energy_generated`.
    pub fn payload_digest_piece(&self) -> String {
        format!("{}{}", self.inverter_id, self.energy_generated_kwh)
    }
}
