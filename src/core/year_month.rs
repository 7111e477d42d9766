use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::prelude::*;

/// Calendar month, serialized as `YYYY-MM`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn try_new(year: i32, month: u32) -> Result<Self> {
        ensure!((1..=12).contains(&month), "month `{month}` is out of range");
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn month(self) -> u32 {
        self.month
    }

    /// Single integer encoding (`year × 100 + month`) used for range checks.
    pub fn key(self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// First day of the month.
    pub fn first_day(self) -> NaiveDate {
        // Month is validated on construction, so the date always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Debug for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) =
            s.split_once('-').with_context(|| format!("`{s}` is not in `YYYY-MM` format"))?;
        let year = year.parse().with_context(|| format!("invalid year in `{s}`"))?;
        let month = month.parse().with_context(|| format!("invalid month in `{s}`"))?;
        Self::try_new(year, month)
    }
}
