//! Fixed «Standard S» low-voltage tariff.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay, serde_as};

use crate::prelude::*;

/// Base charge per 10 amperes of the contracted current, yen.
pub const BASE_RATE_PER_10A: f64 = 311.75;

/// Contracted current tiers.
pub const AMPERE_TIERS: [u32; 6] = [10, 20, 30, 40, 50, 60];

/// Per-kWh usage bands: `(min, max, yen/kWh)`.
const USAGE_BANDS: [(u32, Option<u32>, f64); 3] =
    [(0, Some(120), 29.80), (121, Some(300), 36.40), (301, None, 40.49)];

/// Contracted current, serialized as `30A`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, DeserializeFromStr, SerializeDisplay)]
pub struct Amperes(pub u32);

impl Display for Amperes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}A", self.0)
    }
}

impl FromStr for Amperes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.strip_suffix('A').with_context(|| format!("`{s}` is not in amperes"))?;
        Ok(Self(value.parse().with_context(|| format!("invalid amperes `{s}`"))?))
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TariffSchedule {
    pub base_rate_per_10a: f64,

    /// Ordered base charge ladder.
    #[serde_as(as = "serde_with::Map<_, _>")]
    pub base_rates: Vec<(Amperes, f64)>,

    pub usage_rates: Vec<UsageBand>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageBand {
    /// Inclusive, kWh.
    pub min: u32,

    /// Inclusive, kWh; unbounded when absent.
    pub max: Option<u32>,

    #[serde(rename = "price")]
    pub price_kwh: f64,
}

impl TariffSchedule {
    /// Build the «Standard S» schedule from the fixed constants.
    pub fn standard_s() -> Self {
        Self::new(BASE_RATE_PER_10A, &USAGE_BANDS)
    }

    fn new(base_rate_per_10a: f64, bands: &[(u32, Option<u32>, f64)]) -> Self {
        let base_rates = AMPERE_TIERS
            .into_iter()
            .map(|amperes| {
                let charge = round_to_sen(base_rate_per_10a * (f64::from(amperes) / 10.0));
                (Amperes(amperes), charge)
            })
            .collect();
        let usage_rates = bands
            .iter()
            .map(|&(min, max, price_kwh)| UsageBand { min, max, price_kwh })
            .collect();
        Self { base_rate_per_10a, base_rates, usage_rates }
    }
}

/// Round yen to two decimals (half away from zero).
fn round_to_sen(yen: f64) -> f64 {
    (yen * 100.0).round() / 100.0
}
