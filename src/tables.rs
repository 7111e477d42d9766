use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::core::{
    current::CurrentRates,
    fuel_adjustment::FuelAdjustmentEntry,
    levy::LevySchedule,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn price_cell(price: Option<f64>) -> Cell {
    match price {
        Some(price) => Cell::new(format!("{price:+.2} ¥/kWh"))
            .set_alignment(CellAlignment::Right)
            .fg(if price <= 0.0 { Color::Green } else { Color::Red }),
        None => Cell::new("unknown").add_attribute(Attribute::Dim),
    }
}

#[must_use]
pub fn build_current_rates_table(rates: &CurrentRates) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Fuel cost adjustment", "Renewable energy levy"]);
    table.add_row(vec![
        Cell::new(rates.date_iso),
        price_cell(rates.fuel_adjustment),
        price_cell(rates.renewable_energy_levy),
    ]);
    table
}

#[must_use]
pub fn build_fuel_adjustment_table(entries: &[FuelAdjustmentEntry]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Month", "Fuel cost adjustment"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(format!("{}-{:02}", entry.year, entry.month)),
            price_cell(Some(entry.price_kwh)),
        ]);
    }
    table
}

#[must_use]
pub fn build_levy_table(levy: &LevySchedule) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Renewable energy levy"]);
    for period in levy.periods() {
        table.add_row(vec![
            Cell::new(period.start),
            Cell::new(period.end).add_attribute(Attribute::Dim),
            price_cell(Some(period.price)),
        ]);
    }
    table
}
