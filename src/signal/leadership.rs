//! Price-movement leadership over the observation window.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::exchange::Exchange;
use crate::history::HistoryBuffer;

/// Determine which exchange led price movement over the full window.
///
/// Requires every buffer to be full. The leader is the exchange with the
/// strictly greatest positive net change; ties and non-positive maxima
/// yield no leader (`None` reads as "Undetermined").
pub fn determine_leader(buffers: &BTreeMap<Exchange, HistoryBuffer>) -> Option<Exchange> {
    if buffers.values().any(|b| !b.is_full()) {
        return None;
    }

    let mut best: Option<(Exchange, Decimal)> = None;
    let mut tied = false;

    for (&exchange, buffer) in buffers {
        let change = buffer.net_change()?;
        match best {
            Some((_, max)) if change > max => {
                best = Some((exchange, change));
                tied = false;
            }
            Some((_, max)) if change == max => tied = true,
            None => best = Some((exchange, change)),
            _ => {}
        }
    }

    match best {
        Some((exchange, max)) if max > Decimal::ZERO && !tied => Some(exchange),
        _ => None,
    }
}

/// Run-wide leadership counters. Grows monotonically; never reset.
#[derive(Debug, Clone, Default)]
pub struct LeadershipTally {
    counts: BTreeMap<Exchange, u64>,
    total_evaluated_cycles: u64,
}

impl LeadershipTally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one complete cycle's outcome.
    ///
    /// The evaluated-cycle count advances on every complete cycle; the
    /// per-exchange count only when a leader was determined.
    pub fn record(&mut self, leader: Option<Exchange>) {
        self.total_evaluated_cycles += 1;
        if let Some(exchange) = leader {
            *self.counts.entry(exchange).or_insert(0) += 1;
        }
    }

    /// Cycles in which this exchange led.
    pub fn lead_count(&self, exchange: Exchange) -> u64 {
        self.counts.get(&exchange).copied().unwrap_or(0)
    }

    /// Complete cycles evaluated so far.
    pub fn total_evaluated_cycles(&self) -> u64 {
        self.total_evaluated_cycles
    }

    /// Percentage of evaluated cycles this exchange led. Zero before any
    /// cycle has been evaluated.
    pub fn lead_pct(&self, exchange: Exchange) -> Decimal {
        if self.total_evaluated_cycles == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.lead_count(exchange)) / Decimal::from(self.total_evaluated_cycles)
            * Decimal::ONE_HUNDRED
    }
}
