//! Colored console table for one cycle's signals.

use colored::Colorize;

use crate::exchange::Exchange;
use crate::signal::{CycleSignals, ExchangeSignals};

const HEADERS: [&str; 9] = [
    "Exchange",
    "Price",
    "Difference %",
    "Leader %",
    "TWAP",
    "TWAP Detected",
    "TWAP Direction",
    "Est. Order Size",
    "Arbitrage Opportunity",
];

/// Render the full per-cycle table, one row per exchange.
pub fn render_cycle(signals: &CycleSignals, symbol: &str) -> String {
    let rows: Vec<[String; 9]> = signals
        .per_exchange
        .iter()
        .map(|row| plain_row(signals, row))
        .collect();

    let widths = column_widths(&rows);

    let mut out = String::new();
    out.push('\n');
    out.push_str(&"Arbitrage Finder and TWAP Detection".yellow().to_string());
    out.push('\n');
    out.push('\n');

    out.push_str(&separator(&widths));
    out.push_str(&header_line(&widths));
    out.push_str(&separator(&widths));
    for row in &rows {
        out.push_str(&row_line(row, &widths));
        out.push_str(&separator(&widths));
    }

    out.push_str(
        &format!(
            "Currently targeted token: {} | Leader: {}",
            symbol,
            signals
                .leader
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Undetermined".to_string()),
        )
        .blue()
        .to_string(),
    );
    out.push('\n');
    out
}

/// Plain (uncolored) cells for one exchange row. Color is applied after
/// padding so ANSI codes never skew column widths.
fn plain_row(signals: &CycleSignals, row: &ExchangeSignals) -> [String; 9] {
    let divergences: Vec<String> = signals
        .divergences
        .iter()
        .filter(|d| d.a == row.exchange || d.b == row.exchange)
        .map(|d| format!("{:.2}%", d.pct))
        .collect();

    let arbitrage = signals
        .opportunity
        .filter(|o| o.involves(row.exchange))
        .map(|o| o.to_string())
        .unwrap_or_default();

    [
        row.exchange.to_string(),
        row.price.to_string(),
        divergences.join(" / "),
        format!("{:.2}%", row.lead_pct),
        row.twap
            .map(|t| format!("{:.2}", t.price))
            .unwrap_or_else(|| "N/A".to_string()),
        if row.twap_pattern { "Yes" } else { "No" }.to_string(),
        row.twap
            .map(|t| t.direction.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        row.est_order_size
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "N/A".to_string()),
        arbitrage,
    ]
}

fn column_widths(rows: &[[String; 9]]) -> [usize; 9] {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }
    widths
}

fn separator(widths: &[usize; 9]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn header_line(widths: &[usize; 9]) -> String {
    let mut line = String::from("|");
    for (header, width) in HEADERS.iter().zip(widths) {
        line.push_str(&format!(" {} |", pad(header, *width).blue()));
    }
    line.push('\n');
    line
}

fn row_line(row: &[String; 9], widths: &[usize; 9]) -> String {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(cell, *width))
        .collect();

    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
        cells[0],
        cells[1].green(),
        cells[2].cyan(),
        cells[3].magenta(),
        cells[4].yellow(),
        if row[5] == "Yes" {
            cells[5].red().to_string()
        } else {
            cells[5].clone()
        },
        cells[6].yellow(),
        cells[7].yellow(),
        if row[8].is_empty() {
            cells[8].clone()
        } else {
            cells[8].red().bold().to_string()
        },
    )
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// One-line notice for an incomplete cycle.
pub fn render_incomplete(missing: &[Exchange]) -> String {
    let names: Vec<String> = missing.iter().map(|e| e.to_string()).collect();
    format!(
        "Could not retrieve prices for all exchanges (missing: {}). Skipping calculation.",
        names.join(", ")
    )
    .red()
    .to_string()
}
