//! Mock price sources for unit testing.
//!
//! This module provides scripted sources that can stand in for the live
//! exchange clients without making real network requests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::SourceError;

use super::types::Exchange;
use super::PriceSource;

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
pub enum MockTick {
    /// Return this price.
    Price(Decimal),
    /// Return a NoPrice error.
    NoPrice,
    /// Never complete; triggers the poll loop's per-fetch timeout.
    Hang,
}

/// Scripted price source for testing.
///
/// Outcomes are served in FIFO order; an exhausted script answers NoPrice.
#[derive(Debug, Clone)]
pub struct MockPriceSource {
    exchange: Exchange,
    script: Arc<Mutex<VecDeque<MockTick>>>,
    latency: Option<Duration>,
}

impl MockPriceSource {
    /// Create an empty mock for the given exchange.
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            script: Arc::new(Mutex::new(VecDeque::new())),
            latency: None,
        }
    }

    /// Create a mock that serves the given prices in order.
    pub fn with_prices(exchange: Exchange, prices: impl IntoIterator<Item = Decimal>) -> Self {
        let source = Self::new(exchange);
        for price in prices {
            source.push(MockTick::Price(price));
        }
        source
    }

    /// Add simulated latency to every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a scripted outcome.
    pub fn push(&self, tick: MockTick) {
        self.script.lock().unwrap().push_back(tick);
    }

    /// Number of outcomes still queued.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn fetch(&self, _symbol: &str) -> Result<Decimal, SourceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let tick = self.script.lock().unwrap().pop_front();
        match tick {
            Some(MockTick::Price(price)) => Ok(price),
            Some(MockTick::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
            Some(MockTick::NoPrice) | None => Err(SourceError::NoPrice {
                exchange: self.exchange,
            }),
        }
    }
}
