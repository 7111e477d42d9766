use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::{
    core::{
        current::CurrentRates,
        fuel_adjustment::FuelAdjustmentEntry,
        levy::{LevyDiscovery, LevySchedule},
        tariff::TariffSchedule,
    },
    prelude::*,
    scrape::scrape_fuel_adjustments,
};

/// Complete rate snapshot, as written to the output file.
#[must_use]
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub current_rates: CurrentRates,
    pub fuel_adjustment: Vec<FuelAdjustmentEntry>,
    pub standard_s: TariffSchedule,
    pub renewable_energy_levy: LevySchedule,
}

impl Report {
    /// Build the report from the price list page.
    ///
    /// Levy discovery is optional and never fails the assembly.
    #[instrument(skip_all, fields(today = %today))]
    pub fn assemble(
        html: &str,
        levy_discovery: Option<&LevyDiscovery>,
        today: NaiveDate,
    ) -> Result<Self> {
        let fuel_adjustment = scrape_fuel_adjustments(html)?;
        let mut renewable_energy_levy = LevySchedule::try_known()?;
        if let Some(discovery) = levy_discovery {
            discovery.extend(&mut renewable_energy_levy);
        }
        let standard_s = TariffSchedule::standard_s();
        let current_rates = CurrentRates::select(today, &fuel_adjustment, &renewable_energy_levy);
        Ok(Self { current_rates, fuel_adjustment, standard_s, renewable_energy_levy })
    }

    /// Serialize with 4-space indentation, keeping non-ASCII characters as is.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer).context("failed to serialize the report")?;
        Ok(buffer)
    }

    /// Overwrite the file with the report.
    ///
    /// The report is serialized before the file gets touched.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("failed to write `{}`", path.display()))
    }
}
