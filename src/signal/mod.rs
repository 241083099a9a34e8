//! Pure signal computation over history snapshots.
//!
//! This module handles:
//! - Pairwise divergence and arbitrage detection
//! - Leadership determination and the run-wide tally
//! - TWAP, TWAP-pattern detection, and the order-size heuristic
//!
//! Everything here is cycle-stateless: functions operate on buffer
//! snapshots for the current cycle, and the only carried state is the
//! [`LeadershipTally`] owned by the poll loop.

pub mod divergence;
pub mod leadership;
pub mod twap;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::Config;
use crate::exchange::Exchange;
use crate::history::HistoryBuffer;

pub use divergence::{
    detect_opportunity, divergence_pct, pairwise_divergences, Opportunity, PairDivergence,
};
pub use leadership::{determine_leader, LeadershipTally};
pub use twap::{calculate_twap, detect_twap_pattern, estimate_twap_order_size, Twap, TwapDirection};

/// Per-exchange derived values for one complete cycle.
#[derive(Debug, Clone)]
pub struct ExchangeSignals {
    /// Which exchange this row describes.
    pub exchange: Exchange,
    /// Current cycle price.
    pub price: Decimal,
    /// Share of evaluated cycles this exchange led, in percent.
    pub lead_pct: Decimal,
    /// TWAP over the trailing window, when the buffer has samples.
    pub twap: Option<Twap>,
    /// Whether TWAP-style execution was detected.
    pub twap_pattern: bool,
    /// Estimated TWAP order size, when at least two samples exist.
    pub est_order_size: Option<Decimal>,
}

/// Everything the signal engine derives from one complete cycle.
#[derive(Debug, Clone)]
pub struct CycleSignals {
    /// Pairwise divergences in fixed evaluation order.
    pub divergences: Vec<PairDivergence>,
    /// This cycle's leader; `None` reads as "Undetermined".
    pub leader: Option<Exchange>,
    /// First threshold-breaching pair, if any.
    pub opportunity: Option<Opportunity>,
    /// Per-exchange rows in canonical order.
    pub per_exchange: Vec<ExchangeSignals>,
}

/// Compute all derived signals for a complete cycle.
///
/// `leader` must be this cycle's determination and `tally` must already
/// include it; the poll loop owns both and calls in that order.
pub fn evaluate_cycle(
    prices: &BTreeMap<Exchange, Decimal>,
    buffers: &BTreeMap<Exchange, HistoryBuffer>,
    leader: Option<Exchange>,
    tally: &LeadershipTally,
    config: &Config,
) -> CycleSignals {
    let divergences = pairwise_divergences(prices);
    let opportunity = detect_opportunity(&divergences, config.arbitrage_threshold_pct);

    let per_exchange = Exchange::ALL
        .into_iter()
        .filter_map(|exchange| {
            let price = *prices.get(&exchange)?;
            let snapshot = buffers.get(&exchange)?.snapshot();

            Some(ExchangeSignals {
                exchange,
                price,
                lead_pct: tally.lead_pct(exchange),
                twap: calculate_twap(&snapshot, config.twap_period()),
                twap_pattern: detect_twap_pattern(
                    &snapshot,
                    config.twap_detect_samples,
                    config.twap_pattern_threshold,
                ),
                est_order_size: estimate_twap_order_size(&snapshot),
            })
        })
        .collect();

    CycleSignals {
        divergences,
        leader,
        opportunity,
        per_exchange,
    }
}
