//! Cell-level parsers for the fuel cost adjustment table.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Marks negative prices on the TEPCO pages, for example `▲1.23円`.
pub const NEGATIVE_MARKER: char = '▲';

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("valid year regex"));

static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,2}").expect("valid month regex"));

/// Collapse full-width digits and punctuation into ASCII and trim the line breaks.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.nfkc().filter(|c| !matches!(c, '\n' | '\r')).collect::<String>().trim().to_owned()
}

/// Successfully read price cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CellPrice {
    Parsed(f64),

    /// No digits at all: the cell is treated as zero.
    Blank,
}

impl CellPrice {
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Parsed(value) => value,
            Self::Blank => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("malformed price `{text}`")]
pub struct MalformedPrice {
    pub text: String,
}

/// Parse a price cell like `▲12.3円` or `5.20 円`.
///
/// Everything except ASCII digits and the decimal point is dropped.
pub fn parse_price(text: &str) -> Result<CellPrice, MalformedPrice> {
    let is_negative = text.contains(NEGATIVE_MARKER);
    let amount: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if amount.is_empty() {
        return Ok(CellPrice::Blank);
    }
    if amount.matches('.').count() > 1 {
        return Err(MalformedPrice { text: text.to_owned() });
    }
    let amount: f64 = amount.parse().map_err(|_| MalformedPrice { text: text.to_owned() })?;
    Ok(CellPrice::Parsed(if is_negative { -amount } else { amount }))
}

/// Extract the first four-digit run, for example `2026年` → 2026.
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    YEAR_RE.find(text)?.as_str().parse().ok()
}

/// Extract the first one- or two-digit run, for example `2月分` → 2.
///
/// Values outside 1–12 are rejected.
#[must_use]
pub fn parse_month(text: &str) -> Option<u32> {
    MONTH_RE.find(text)?.as_str().parse().ok().filter(|month| (1..=12).contains(month))
}
