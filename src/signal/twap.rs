//! TWAP estimation and TWAP-execution pattern heuristics.

use rust_decimal::Decimal;
use strum::Display;

use crate::history::PriceSample;

/// Side implied by the latest price relative to the TWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TwapDirection {
    /// Latest price trades above the TWAP.
    Ask,
    /// Latest price at or below the TWAP.
    Bid,
}

/// Computed TWAP for one exchange's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Twap {
    /// Arithmetic mean of samples inside the trailing window.
    pub price: Decimal,
    /// `Ask` iff the most recent price is strictly above the TWAP.
    pub direction: TwapDirection,
}

/// TWAP over the trailing `period` ending at the newest sample.
///
/// Uses every sample whose timestamp falls in
/// `[newest - period, newest]`; `None` only for an empty buffer.
pub fn calculate_twap(samples: &[PriceSample], period: time::Duration) -> Option<Twap> {
    let newest = samples.last()?;
    let cutoff = newest.observed_at - period;

    let relevant: Vec<Decimal> = samples
        .iter()
        .filter(|s| s.observed_at >= cutoff)
        .map(|s| s.price)
        .collect();

    // The newest sample is always in its own window.
    let twap = relevant.iter().sum::<Decimal>() / Decimal::from(relevant.len());

    let direction = if newest.price > twap {
        TwapDirection::Ask
    } else {
        TwapDirection::Bid
    };

    Some(Twap {
        price: twap,
        direction,
    })
}

/// Detect TWAP-style (slow, steady) execution.
///
/// Looks at the most recent `sample_count` samples, a fixed count
/// independent of the time-based TWAP window, and flags the pattern iff
/// the mean absolute consecutive change is at or below `threshold`.
/// Lower threshold means stricter.
pub fn detect_twap_pattern(
    samples: &[PriceSample],
    sample_count: usize,
    threshold: Decimal,
) -> bool {
    if sample_count < 2 || samples.len() < sample_count {
        return false;
    }

    let recent = &samples[samples.len() - sample_count..];
    match mean_abs_change(recent) {
        Some(change) => change <= threshold,
        None => false,
    }
}

/// Rough proxy for the volume needed to move price by the observed
/// per-tick amount: mean absolute consecutive change across the whole
/// buffer times the buffer length. Heuristic only, not calibrated.
pub fn estimate_twap_order_size(samples: &[PriceSample]) -> Option<Decimal> {
    let change = mean_abs_change(samples)?;
    Some(change * Decimal::from(samples.len()))
}

/// Mean absolute price-to-price change between consecutive samples.
fn mean_abs_change(samples: &[PriceSample]) -> Option<Decimal> {
    if samples.len() < 2 {
        return None;
    }

    let total: Decimal = samples
        .windows(2)
        .map(|w| (w[1].price - w[0].price).abs())
        .sum();

    Some(total / Decimal::from(samples.len() - 1))
}
