//! Fuel cost adjustment price list page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::{
    core::fuel_adjustment::{FuelAdjustmentEntry, RowScan},
    prelude::*,
};

/// Title of the low-voltage section on the page.
pub const SECTION_TITLE: &str = "燃料費調整単価（低圧）";

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));
static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid tr selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid td selector"));

/// Way to locate the section that holds the price table.
#[derive(Copy, Clone, Debug)]
pub enum ContainerLookup {
    /// `div` with the element ID.
    ById(&'static str),

    /// The FAQ element whose question link contains the text.
    ByQuestion(&'static str),
}

impl ContainerLookup {
    /// Tried in order, the first hit wins.
    pub const DEFAULT: [Self; 2] = [Self::ById("anker01"), Self::ByQuestion(SECTION_TITLE)];

    pub fn find(self, document: &Html) -> Option<ElementRef<'_>> {
        match self {
            Self::ById(id) => document
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|element| is_div(*element, None) && element.value().id() == Some(id)),

            Self::ByQuestion(text) => {
                let anchor = document
                    .select(&ANCHOR_SELECTOR)
                    .find(|anchor| anchor.text().collect::<String>().contains(text))?;
                let question = find_ancestor_div(anchor, "question")?;
                find_ancestor_div(question, "faq-element")
            }
        }
    }
}

fn is_div(element: ElementRef, class: Option<&str>) -> bool {
    element.value().name() == "div"
        && class.is_none_or(|class| element.value().classes().any(|name| name == class))
}

fn find_ancestor_div<'a>(element: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap).find(|ancestor| is_div(*ancestor, Some(class)))
}

/// Text of every data cell, row by row.
fn table_rows(table: ElementRef) -> Vec<Vec<String>> {
    table
        .select(&ROW_SELECTOR)
        .map(|row| row.select(&CELL_SELECTOR).map(|cell| cell.text().collect()).collect())
        .collect()
}

/// Scrape the low-voltage fuel cost adjustment table from the page.
#[instrument(skip_all)]
pub fn scrape_fuel_adjustments(html: &str) -> Result<Vec<FuelAdjustmentEntry>> {
    scrape_with(html, &ContainerLookup::DEFAULT)
}

fn scrape_with(html: &str, lookups: &[ContainerLookup]) -> Result<Vec<FuelAdjustmentEntry>> {
    let document = Html::parse_document(html);
    let container = lookups
        .iter()
        .find_map(|lookup| {
            let container = lookup.find(&document)?;
            debug!(?lookup, "found the section");
            Some(container)
        })
        .with_context(|| format!("could not find the «{SECTION_TITLE}» section"))?;
    let table = container
        .select(&TABLE_SELECTOR)
        .next()
        .with_context(|| format!("could not find the price table in «{SECTION_TITLE}»"))?;
    let rows = table_rows(table);
    let entries = RowScan::scan(&rows);
    info!(n_rows = rows.len(), n_entries = entries.len(), "scraped the fuel cost adjustments");
    Ok(entries)
}
