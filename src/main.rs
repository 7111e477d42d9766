mod api;
mod charset;
mod cli;
mod core;
mod parse;
mod prelude;
mod report;
mod scrape;
mod settings;
mod tables;

use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{client::Client, notice::Notices},
    charset::decode_html,
    cli::Args,
    core::levy::{LevyDiscovery, LevyPatterns},
    prelude::*,
    report::Report,
    settings::Settings,
    tables::{build_current_rates_table, build_fuel_adjustment_table, build_levy_table},
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => Settings::read_from(path)?,
        None => Settings::default(),
    };
    let client = Client::new(settings.http);

    let html = match &args.file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            decode_html(&bytes, None)
        }
        None => client.get_html(&settings.source.page_url)?,
    };

    let patterns = LevyPatterns::try_new(&settings.levy.patterns)?;
    let notices = Notices::new(&client, &settings.source.levy_notice_url);
    let today = args.today();
    let levy_discovery = args.scrape_pdf.then(|| {
        LevyDiscovery::builder()
            .notices(&notices)
            .patterns(&patterns)
            .today(today)
            .lookahead_years(settings.levy.lookahead_years)
            .build()
    });

    let report = Report::assemble(&html, levy_discovery.as_ref(), today)?;
    report.write_to(&args.output)?;

    if !args.quiet {
        println!("{}", build_current_rates_table(&report.current_rates));
        println!("{}", build_fuel_adjustment_table(&report.fuel_adjustment));
        println!("{}", build_levy_table(&report.renewable_energy_levy));
    }
    info!(path = %args.output.display(), "successfully wrote the rates");
    Ok(())
}
