//! Optional TOML settings file. Every key has a built-in default.

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::prelude::*;

pub const PAGE_URL: &str = "https://www.tepco.co.jp/ep/private/fuelcost2/newlist/index-j.html";

/// `{year}` is replaced with the levy year.
pub const LEVY_NOTICE_URL: &str =
    "https://www.tepco.co.jp/ep/renewable_energy/institution/pdf/{year}0501.pdf";

#[must_use]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: SourceSettings,
    pub http: HttpSettings,
    pub levy: LevySettings,
}

impl Settings {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let settings = toml::from_str(&text)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!("loaded the settings");
        Ok(settings)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    pub page_url: String,
    pub levy_notice_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { page_url: PAGE_URL.to_owned(), levy_notice_url: LEVY_NOTICE_URL.to_owned() }
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    pub timeout_secs: u64,

    /// Total number of attempts per request, including the first one.
    pub max_attempts: u32,

    pub retry_delay_millis: u64,
}

impl HttpSettings {
    pub const fn timeout(self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub const fn retry_delay(self) -> Duration {
        Duration::from_millis(self.retry_delay_millis)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10, max_attempts: 3, retry_delay_millis: 500 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevySettings {
    /// How many years past the current one to look for a notice, at most 10.
    pub lookahead_years: i32,

    /// Ordered price patterns, matched against the normalized notice text.
    pub patterns: Vec<String>,
}

impl Default for LevySettings {
    fn default() -> Self {
        Self {
            lookahead_years: 1,
            patterns: vec![
                r"単価.*?(\d+(?:\.\d+)?)\s*円".to_owned(),
                r"賦課金.*?(\d+\.\d+)\s*円".to_owned(),
            ],
        }
    }
}
