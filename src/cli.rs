use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;

#[derive(Parser)]
#[command(version, about, propagate_version = true)]
pub struct Args {
    /// Local copy of the price list page. Fetched from TEPCO when omitted.
    pub file: Option<PathBuf>,

    /// Look for newer renewable energy levy notices (PDF).
    #[clap(long = "scrape-pdf", env = "SCRAPE_PDF")]
    pub scrape_pdf: bool,

    #[clap(long, short, env = "OUTPUT_PATH", default_value = "tepco_rates.json")]
    pub output: PathBuf,

    /// Optional TOML settings file.
    #[clap(long, env = "SETTINGS_PATH")]
    pub settings: Option<PathBuf>,

    /// Select the current rates for this date instead of today.
    #[clap(long, env = "TODAY")]
    pub today: Option<NaiveDate>,

    /// Do not print the rate tables.
    #[clap(long, short)]
    pub quiet: bool,
}

impl Args {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}
