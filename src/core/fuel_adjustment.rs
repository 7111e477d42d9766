//! Monthly fuel cost adjustment unit prices.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    core::year_month::YearMonth,
    parse::{normalize_text, parse_month, parse_price, parse_year},
    prelude::*,
};

pub const AREA: &str = "Kanto";
pub const PLAN: &str = "Low Voltage (Standard S)";

/// Rows containing any of these are table headers, not data.
pub const HEADER_MARKERS: [&str; 3] = ["適用年月", "燃料費調整単価", "円/kWh"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelAdjustmentEntry {
    pub year: i32,
    pub month: u32,
    pub date_iso: NaiveDate,

    /// Yen per kilowatt-hour, negative for discounts.
    pub price_kwh: f64,

    pub area: String,

    #[serde(rename = "type")]
    pub plan: String,
}

impl FuelAdjustmentEntry {
    pub fn new(year_month: YearMonth, price_kwh: f64) -> Self {
        Self {
            year: year_month.year(),
            month: year_month.month(),
            date_iso: year_month.first_day(),
            price_kwh,
            area: AREA.to_owned(),
            plan: PLAN.to_owned(),
        }
    }
}

/// Table row, classified by its shape.
#[derive(Debug, PartialEq, Eq)]
enum Row<'a> {
    /// `年 | 月 | (other plan) | Standard S`: opens a new year.
    WithYear { year: &'a str, month: &'a str, price: &'a str },

    /// `月 | (other plan) | Standard S`: continues the running year.
    MonthOnly { month: &'a str, price: &'a str },

    Header,
    Empty,
    Unrecognized(usize),
}

impl<'a> Row<'a> {
    fn classify(cells: &'a [String]) -> Self {
        if cells.is_empty() {
            return Self::Empty;
        }
        let text = cells.concat();
        if HEADER_MARKERS.iter().any(|marker| text.contains(marker)) {
            return Self::Header;
        }
        match cells {
            [year, month, _, price] => Self::WithYear {
                year: year.as_str(),
                month: month.as_str(),
                price: price.as_str(),
            },
            [month, _, price] => {
                Self::MonthOnly { month: month.as_str(), price: price.as_str() }
            }
            _ => Self::Unrecognized(cells.len()),
        }
    }
}

/// Sequential scan over the table rows.
///
/// The year is only present in the first row of each year,
/// so the scan carries it forward to the following month-only rows.
#[must_use]
#[derive(Default)]
pub struct RowScan {
    current_year: Option<i32>,
    seen: BTreeSet<YearMonth>,
    entries: Vec<FuelAdjustmentEntry>,
}

impl RowScan {
    /// Scan the rows, each given as the text of its data cells.
    pub fn scan<I, R>(rows: I) -> Vec<FuelAdjustmentEntry>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        rows.into_iter().fold(Self::default(), |scan, cells| scan.accept(cells.as_ref())).entries
    }

    fn accept(mut self, cells: &[String]) -> Self {
        let cells: Vec<String> = cells.iter().map(|cell| normalize_text(cell)).collect();
        let (month, price) = match Row::classify(&cells) {
            Row::WithYear { year, month, price } => {
                self.current_year = parse_year(year);
                (month, price)
            }
            Row::MonthOnly { month, price } => (month, price),
            Row::Header | Row::Empty => return self,
            Row::Unrecognized(n_cells) => {
                debug!(n_cells, "skipped a row of unexpected shape");
                return self;
            }
        };

        let Some(year) = self.current_year else {
            debug!(month, "skipped a row without a known year");
            return self;
        };
        let Some(month) = parse_month(month) else {
            debug!(year, month, "skipped a row without a month");
            return self;
        };
        let price = match parse_price(price) {
            Ok(price) => price.value(),
            Err(error) => {
                warn!(year, month, "skipped a row: {error}");
                return self;
            }
        };
        let Ok(year_month) = YearMonth::try_new(year, month) else {
            return self;
        };
        if self.seen.insert(year_month) {
            self.entries.push(FuelAdjustmentEntry::new(year_month, price));
        } else {
            warn!(%year_month, "skipped a duplicate row");
        }
        self
    }
}
