//! Exchange adapters: spot price sources and symbol encoding.
//!
//! This module handles:
//! - Exchange identifiers and per-exchange symbol encoding
//! - The `PriceSource` capability used by the poll loop
//! - Live HTTP sources backed by each exchange's public spot endpoint
//! - Mock sources for testing

pub mod client;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::SourceError;

pub use client::{LiveSource, SpotClient};
pub use mock::{MockPriceSource, MockTick};
pub use types::Exchange;

/// Capability to fetch one exchange's current spot price for a symbol.
///
/// The poll loop only ever talks to sources through this trait; symbol
/// encoding and response-shape parsing are the implementation's concern.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// The exchange this source reports for.
    fn exchange(&self) -> Exchange;

    /// Fetch the current spot price for the canonical symbol.
    async fn fetch(&self, symbol: &str) -> Result<Decimal, SourceError>;
}
