//! Renewable energy promotion levy («再エネ賦課金»).
//!
//! The levy changes once a year in May. Known periods are built in,
//! newer ones may be discovered from the yearly PDF notice.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{core::year_month::YearMonth, parse::normalize_text, prelude::*};

/// Month in which a new levy year starts.
pub const LEVY_YEAR_START_MONTH: u32 = 5;

/// Upper bound for the discovery lookahead.
pub const MAX_LOOKAHEAD_YEARS: i32 = 10;

/// Known periods: `(start, end, yen/kWh)`, both ends inclusive.
const KNOWN_PERIODS: [(&str, &str, f64); 2] =
    [("2024-05", "2025-04", 3.49), ("2025-05", "2026-04", 3.98)];

/// Levy price over an inclusive range of months.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevyPeriod {
    pub start: YearMonth,
    pub end: YearMonth,

    /// Yen per kilowatt-hour.
    pub price: f64,
}

impl LevyPeriod {
    pub fn try_new(start: YearMonth, end: YearMonth, price: f64) -> Result<Self> {
        ensure!(start <= end, "levy period starts at {start} but ends at {end}");
        ensure!(price.is_finite() && price > 0.0, "levy price `{price}` must be positive");
        Ok(Self { start, end, price })
    }

    /// Levy year starting in May of the `year` and ending in April of the next one.
    pub fn levy_year(year: i32, price: f64) -> Result<Self> {
        let start = YearMonth::try_new(year, LEVY_YEAR_START_MONTH)?;
        let end = YearMonth::try_new(year + 1, LEVY_YEAR_START_MONTH)?.previous();
        Self::try_new(start, end, price)
    }

    pub fn contains(&self, year_month: YearMonth) -> bool {
        (self.start.key()..=self.end.key()).contains(&year_month.key())
    }
}

/// Ordered, non-overlapping and contiguous levy periods.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevySchedule(Vec<LevyPeriod>);

impl LevySchedule {
    pub fn try_known() -> Result<Self> {
        let periods = KNOWN_PERIODS
            .into_iter()
            .map(|(start, end, price)| -> Result<LevyPeriod> {
                LevyPeriod::try_new(start.parse()?, end.parse()?, price)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::try_from_periods(periods)
    }

    pub fn try_from_periods(periods: impl IntoIterator<Item = LevyPeriod>) -> Result<Self> {
        let mut schedule = Self(Vec::new());
        for period in periods {
            schedule.try_push(period)?;
        }
        Ok(schedule)
    }

    /// Append the period, which must start right after the last one ends.
    pub fn try_push(&mut self, period: LevyPeriod) -> Result {
        if let Some(last) = self.0.last() {
            ensure!(
                period.start == last.end.next(),
                "levy period {}..{} does not follow the previous one ending at {}",
                period.start,
                period.end,
                last.end,
            );
        }
        self.0.push(period);
        Ok(())
    }

    pub fn periods(&self) -> &[LevyPeriod] {
        &self.0
    }

    pub fn last(&self) -> Option<&LevyPeriod> {
        self.0.last()
    }

    pub fn find(&self, year_month: YearMonth) -> Option<&LevyPeriod> {
        self.0.iter().find(|period| period.contains(year_month))
    }
}

impl<'de> Deserialize<'de> for LevySchedule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let periods = Vec::<LevyPeriod>::deserialize(deserializer)?;
        Self::try_from_periods(periods).map_err(serde::de::Error::custom)
    }
}

/// Ordered list of patterns locating the levy price in the notice text.
///
/// The first pattern that matches wins. Capture group 1 must be the price.
#[derive(Clone, Debug)]
pub struct LevyPatterns(Vec<Regex>);

impl LevyPatterns {
    pub fn try_new<S: AsRef<str>>(patterns: impl IntoIterator<Item = S>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|pattern| -> Result<Regex> {
                let pattern = pattern.as_ref();
                let regex = Regex::new(pattern)
                    .with_context(|| format!("invalid levy pattern `{pattern}`"))?;
                ensure!(regex.captures_len() >= 2, "levy pattern `{pattern}` has no capture group");
                Ok(regex)
            })
            .collect::<Result<Vec<_>>>()?;
        ensure!(!patterns.is_empty(), "at least one levy pattern is required");
        Ok(Self(patterns))
    }

    /// Find the levy price in the unstructured notice text.
    pub fn extract_price(&self, text: &str) -> Option<f64> {
        let text = normalize_text(text);
        self.0.iter().find_map(|pattern| {
            pattern
                .captures(&text)?
                .get(1)?
                .as_str()
                .parse::<f64>()
                .ok()
                .filter(|price| *price > 0.0)
        })
    }
}

/// Text of the yearly levy notice.
pub trait LevyNotices {
    /// Fetch the notice for the levy year starting in May of the `year`.
    fn fetch_text(&self, year: i32) -> Result<String>;
}

/// Looks for levy years that are not built in yet.
#[derive(bon::Builder)]
pub struct LevyDiscovery<'a> {
    notices: &'a dyn LevyNotices,
    patterns: &'a LevyPatterns,
    today: NaiveDate,

    #[builder(default = 1)]
    lookahead_years: i32,
}

impl LevyDiscovery<'_> {
    /// Years after the last known period up to the lookahead.
    pub fn candidate_years(&self, schedule: &LevySchedule) -> Vec<i32> {
        let until = self.today.year() + self.lookahead_years.clamp(0, MAX_LOOKAHEAD_YEARS);
        let since = schedule.last().map_or(self.today.year(), |last| last.start.year() + 1);
        (since..=until)
            .filter(|year| schedule.periods().iter().all(|period| period.start.year() != *year))
            .collect()
    }

    /// Extend the schedule with the discovered periods.
    ///
    /// Failures are logged and never abort the run.
    #[instrument(skip_all)]
    pub fn extend(&self, schedule: &mut LevySchedule) {
        for year in self.candidate_years(schedule) {
            match self.discover(year) {
                Ok(Some(period)) => {
                    let price = period.price;
                    match schedule.try_push(period) {
                        Ok(()) => info!(year, price, "discovered a levy period"),
                        Err(error) => warn!(year, price, "ignored the levy period: {error:#}"),
                    }
                }
                Ok(None) => {
                    warn!(year, "the notice is found, but the levy price is not");
                }
                Err(error) => {
                    warn!(year, "failed to check the levy notice: {error:#}");
                }
            }
        }
    }

    fn discover(&self, year: i32) -> Result<Option<LevyPeriod>> {
        let text = self.notices.fetch_text(year)?;
        self.patterns
            .extract_price(&text)
            .map(|price| LevyPeriod::levy_year(year, price))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::settings::LevySettings;

    struct StubNotices(HashMap<i32, &'static str>);

    impl LevyNotices for StubNotices {
        fn fetch_text(&self, year: i32) -> Result<String> {
            self.0.get(&year).map(|text| (*text).to_owned()).context("404 Not Found")
        }
    }

    fn default_patterns() -> LevyPatterns {
        LevyPatterns::try_new(LevySettings::default().patterns).unwrap()
    }

    fn year_month(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn known_schedule_is_contiguous() -> Result {
        let schedule = LevySchedule::try_known()?;
        assert_eq!(schedule.periods().len(), 2);
        assert_eq!(schedule.periods()[0].end.next(), schedule.periods()[1].start);
        Ok(())
    }

    #[test]
    fn find_period_for_july_2025() -> Result {
        let schedule = LevySchedule::try_known()?;
        let period = schedule.find(year_month("2025-07")).context("no period")?;
        assert_abs_diff_eq!(period.price, 3.98);
        Ok(())
    }

    #[test]
    fn find_period_on_boundaries() -> Result {
        let schedule = LevySchedule::try_known()?;
        assert_abs_diff_eq!(schedule.find(year_month("2025-04")).context("no period")?.price, 3.49);
        assert_abs_diff_eq!(schedule.find(year_month("2025-05")).context("no period")?.price, 3.98);
        assert_eq!(schedule.find(year_month("2024-04")), None);
        assert_eq!(schedule.find(year_month("2026-05")), None);
        Ok(())
    }

    #[test]
    fn overlapping_periods_are_rejected() -> Result {
        let result = LevySchedule::try_from_periods([
            LevyPeriod::try_new(year_month("2024-05"), year_month("2025-05"), 3.49)?,
            LevyPeriod::try_new(year_month("2025-05"), year_month("2026-04"), 3.98)?,
        ]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn gaps_are_rejected() -> Result {
        let result = LevySchedule::try_from_periods([
            LevyPeriod::levy_year(2024, 3.49)?,
            LevyPeriod::levy_year(2026, 3.98)?,
        ]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn invalid_periods_are_rejected() {
        assert!(LevyPeriod::try_new(year_month("2025-05"), year_month("2025-04"), 1.0).is_err());
        assert!(LevyPeriod::try_new(year_month("2025-05"), year_month("2026-04"), 0.0).is_err());
    }

    #[test]
    fn levy_year_spans_may_to_april() -> Result {
        let period = LevyPeriod::levy_year(2026, 4.12)?;
        assert_eq!(period.start, year_month("2026-05"));
        assert_eq!(period.end, year_month("2027-04"));
        Ok(())
    }

    #[test]
    fn extract_price_from_unit_price_marker() {
        let text = "2026年度の再生可能エネルギー発電促進賦課金単価は\n１kWhあたり４．１２円となります。";
        assert_eq!(default_patterns().extract_price(text), Some(4.12));
    }

    #[test]
    fn extract_price_with_fallback_pattern() {
        let text = "賦課金（1kWhにつき） 3.98円";
        assert_eq!(default_patterns().extract_price(text), Some(3.98));
    }

    #[test]
    fn extract_price_misses() {
        assert_eq!(default_patterns().extract_price("お知らせ 2026年5月1日"), None);
    }

    #[test]
    fn patterns_without_capture_group_are_rejected() {
        assert!(LevyPatterns::try_new(["単価.*円"]).is_err());
        assert!(LevyPatterns::try_new(Vec::<String>::new()).is_err());
        assert!(LevyPatterns::try_new(["単価(("]).is_err());
    }

    #[test]
    fn discovery_appends_next_levy_year() -> Result {
        let notices = StubNotices(HashMap::from([(2026, "賦課金単価 ４．１２ 円")]));
        let patterns = default_patterns();
        let mut schedule = LevySchedule::try_known()?;
        LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(NaiveDate::from_ymd_opt(2026, 10, 19).context("invalid date")?)
            .build()
            .extend(&mut schedule);
        assert_eq!(schedule.periods().len(), 3);
        let last = schedule.last().context("empty schedule")?;
        assert_eq!(last.start, year_month("2026-05"));
        assert_abs_diff_eq!(last.price, 4.12);
        Ok(())
    }

    #[test]
    fn discovery_failures_do_not_abort() -> Result {
        let notices = StubNotices(HashMap::from([(2027, "単価 4.50円")]));
        let patterns = default_patterns();
        let mut schedule = LevySchedule::try_known()?;
        let discovery = LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(NaiveDate::from_ymd_opt(2026, 10, 19).context("invalid date")?)
            .build();
        assert_eq!(discovery.candidate_years(&schedule), [2026, 2027]);
        discovery.extend(&mut schedule);

        // 2026 is missing, so 2027 would leave a gap.
        assert_eq!(schedule, LevySchedule::try_known()?);
        Ok(())
    }

    #[test]
    fn discovery_continues_after_a_missing_year() -> Result {
        struct RecordingNotices(RefCell<Vec<i32>>);

        impl LevyNotices for RecordingNotices {
            fn fetch_text(&self, year: i32) -> Result<String> {
                self.0.borrow_mut().push(year);
                bail!("404 Not Found")
            }
        }

        let notices = RecordingNotices(RefCell::new(Vec::new()));
        let patterns = default_patterns();
        let mut schedule = LevySchedule::try_known()?;
        LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(NaiveDate::from_ymd_opt(2026, 10, 19).context("invalid date")?)
            .build()
            .extend(&mut schedule);
        assert_eq!(*notices.0.borrow(), [2026, 2027]);
        assert_eq!(schedule.periods().len(), 2);
        Ok(())
    }

    #[test]
    fn lookahead_is_bounded() -> Result {
        let notices = StubNotices(HashMap::new());
        let patterns = default_patterns();
        let schedule = LevySchedule::try_known()?;
        let discovery = LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(NaiveDate::from_ymd_opt(2026, 10, 19).context("invalid date")?)
            .lookahead_years(i32::MAX)
            .build();
        let years = discovery.candidate_years(&schedule);
        assert_eq!(years.first(), Some(&2026));
        assert_eq!(years.last(), Some(&(2026 + MAX_LOOKAHEAD_YEARS)));

        let discovery = LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(NaiveDate::from_ymd_opt(2026, 10, 19).context("invalid date")?)
            .lookahead_years(-5)
            .build();
        assert_eq!(discovery.candidate_years(&schedule), [2026]);
        Ok(())
    }

    #[test]
    fn deserialize_validates_periods() {
        let json = r#"[
            {"start": "2024-05", "end": "2025-04", "price": 3.49},
            {"start": "2025-05", "end": "2026-05", "price": 3.98},
            {"start": "2026-05", "end": "2027-04", "price": 4.00}
        ]"#;
        assert!(serde_json::from_str::<LevySchedule>(json).is_err());
    }
}
