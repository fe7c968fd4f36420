//! `RegisterPanel`: prompts for panel_id, production_date, efficiency %,
//! size m², manufacturer, carbon_reduction kgCO₂/kWh, lifetime years,
//! owner.

use crate::{CliError, RegisterPanelArgs};
use carbon_core::ledger::LedgerState;
use carbon_core::types::PanelRecord;
use chrono::NaiveDate;
use dialoguer::Input;

pub fn register_panel(ledger: &mut LedgerState, args: RegisterPanelArgs) -> Result<(), CliError> {
    let panel_id = prompt_or(args.panel_id, "Panel ID")?;
    let production_date = match args.production_date {
        Some(d) => parse_date(&d)?,
        None => loop {
            let raw: String = Input::new().with_prompt("Production date (yyyy-MM-dd)").interact_text()?;
            match parse_date(&raw) {
                Ok(date) => break date,
                Err(err) => crate::commands::print_error(&err.to_string()),
            }
        },
    };
    let nominal_efficiency_pct = prompt_or_f64(args.efficiency_pct, "Nominal efficiency (%)")?;
    let size_m2 = prompt_or_f64(args.size_m2, "Panel size (m^2)")?;
    let manufacturer = prompt_or(args.manufacturer, "Manufacturer")?;
    let manufacturing_footprint_kgco2 = prompt_or_f64(args.manufacturing_footprint_kgco2, "Manufacturing footprint (kgCO2)")?;
    let lifetime_years = prompt_or_u32(args.lifetime_years, "Lifetime (years)")?;
    let carbon_reduction_factor = prompt_or_f64(args.carbon_reduction_factor, "Carbon reduction factor (kgCO2/kWh)")?;
    let owner = prompt_or(args.owner, "Owner address")?;

    let panel = PanelRecord::new(
        panel_id.clone(),
        production_date,
        nominal_efficiency_pct,
        size_m2,
        manufacturer,
        manufacturing_footprint_kgco2,
        lifetime_years,
        carbon_reduction_factor,
        owner,
    )
    .map_err(|e| CliError::User(e.to_string()))?;

    let issuance = ledger.register_panel(panel).map_err(|e| CliError::User(e.to_string()))?;
    crate::commands::print_success(&format!("registered panel {panel_id}; issuance credited: {issuance}"));
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CliError::User(format!("'{raw}' is not a yyyy-MM-dd date")))
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, CliError> {
    match value {
        Some(v) => Ok(v),
        None => Input::<String>::new().with_prompt(prompt).interact_text().map_err(CliError::from),
    }
}

fn prompt_or_f64(value: Option<f64>, prompt: &str) -> Result<f64, CliError> {
    match value {
        Some(v) => Ok(v),
        None => Input::<f64>::new().with_prompt(prompt).interact_text().map_err(CliError::from),
    }
}

fn prompt_or_u32(value: Option<u32>, prompt: &str) -> Result<u32, CliError> {
    match value {
        Some(v) => Ok(v),
        None => Input::<u32>::new().with_prompt(prompt).interact_text().map_err(CliError::from),
    }
}
