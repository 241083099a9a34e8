//! Bounded rolling price history per exchange.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use time::OffsetDateTime;

/// One observed price. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSample {
    /// Observed price (always positive; the poll loop rejects anything else).
    pub price: Decimal,
    /// When the price was observed.
    pub observed_at: OffsetDateTime,
}

impl PriceSample {
    /// Create a sample observed now.
    pub fn now(price: Decimal) -> Self {
        Self {
            price,
            observed_at: OffsetDateTime::now_utc(),
        }
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(price: Decimal, observed_at: OffsetDateTime) -> Self {
        Self { price, observed_at }
    }
}

/// Fixed-capacity, insertion-ordered FIFO of price samples.
///
/// Invariants: length never exceeds capacity; samples are ordered by
/// arrival, so timestamps are monotonically non-decreasing.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when at capacity. O(1).
    pub fn append(&mut self, sample: PriceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Current samples in arrival order, oldest first.
    pub fn snapshot(&self) -> Vec<PriceSample> {
        self.samples.iter().copied().collect()
    }

    /// True iff the buffer holds exactly `capacity` samples.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True iff no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended sample.
    pub fn newest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    /// Oldest retained sample.
    pub fn oldest(&self) -> Option<&PriceSample> {
        self.samples.front()
    }

    /// Net price change over the retained window (newest - oldest).
    pub fn net_change(&self) -> Option<Decimal> {
        match (self.newest(), self.oldest()) {
            (Some(newest), Some(oldest)) => Some(newest.price - oldest.price),
            _ => None,
        }
    }
}
