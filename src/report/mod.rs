//! Cycle reporting: console table and opportunity log.
//!
//! This module handles:
//! - The per-cycle colored console table
//! - Incomplete-cycle notices
//! - The append-only opportunity log file

pub mod log;
pub mod table;

use crate::exchange::Exchange;
use crate::signal::CycleSignals;

pub use log::OpportunityLog;

/// What one polling cycle produced.
#[derive(Debug, Clone)]
pub enum CycleReport {
    /// All exchanges reported a price and signals were derived.
    Complete(CycleSignals),
    /// One or more fetches failed; derived signals were suppressed.
    Incomplete {
        /// Exchanges whose fetch failed this cycle.
        missing: Vec<Exchange>,
    },
}

/// Formats cycle results for the console.
#[derive(Debug, Clone)]
pub struct Reporter {
    symbol: String,
}

impl Reporter {
    /// Create a reporter for the watched symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    /// Emit one cycle's report to stdout.
    pub fn emit(&self, report: &CycleReport) {
        match report {
            CycleReport::Complete(signals) => {
                println!("{}", table::render_cycle(signals, &self.symbol));
            }
            CycleReport::Incomplete { missing } => {
                println!("{}", table::render_incomplete(missing));
            }
        }
    }
}
