use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{fuel_adjustment::FuelAdjustmentEntry, levy::LevySchedule, year_month::YearMonth};

/// Rates applicable on a specific day.
///
/// Missing values are `null`: the fuel cost adjustment is published a few months ahead,
/// and the levy only for the current levy year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentRates {
    pub year: i32,
    pub month: u32,
    pub date_iso: NaiveDate,
    pub fuel_adjustment: Option<f64>,
    pub renewable_energy_levy: Option<f64>,
}

impl CurrentRates {
    pub fn select(
        today: NaiveDate,
        fuel_adjustments: &[FuelAdjustmentEntry],
        levy: &LevySchedule,
    ) -> Self {
        let this_month = YearMonth::of(today);
        let fuel_adjustment = fuel_adjustments
            .iter()
            .find(|entry| entry.year == this_month.year() && entry.month == this_month.month())
            .map(|entry| entry.price_kwh);
        let renewable_energy_levy = levy.find(this_month).map(|period| period.price);
        Self {
            year: this_month.year(),
            month: this_month.month(),
            date_iso: today,
            fuel_adjustment,
            renewable_energy_levy,
        }
    }
}
