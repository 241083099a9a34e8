//! Fixed-interval polling loop driving fetch, history, signals, and
//! reporting.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SourceError;
use crate::exchange::{Exchange, PriceSource};
use crate::history::{HistoryBuffer, PriceSample};
use crate::report::{CycleReport, OpportunityLog, Reporter};
use crate::signal::{self, LeadershipTally};

/// Drives an unbounded sequence of fixed-interval polling cycles.
///
/// The loop exclusively owns the per-exchange history buffers and the
/// leadership tally; nothing else mutates them, so no locking is needed.
pub struct PollLoop {
    config: Config,
    sources: Vec<Arc<dyn PriceSource>>,
    buffers: BTreeMap<Exchange, HistoryBuffer>,
    tally: LeadershipTally,
    reporter: Reporter,
    opportunity_log: OpportunityLog,
    cycles: u64,
}

impl PollLoop {
    /// Create a loop over the given sources.
    pub fn new(
        config: Config,
        sources: Vec<Arc<dyn PriceSource>>,
        reporter: Reporter,
        opportunity_log: OpportunityLog,
    ) -> Self {
        let buffers = sources
            .iter()
            .map(|s| (s.exchange(), HistoryBuffer::new(config.history_size)))
            .collect();

        Self {
            config,
            sources,
            buffers,
            tally: LeadershipTally::new(),
            reporter,
            opportunity_log,
            cycles: 0,
        }
    }

    /// The run-wide leadership tally.
    pub fn tally(&self) -> &LeadershipTally {
        &self.tally
    }

    /// Cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// History buffer for one exchange.
    pub fn buffer(&self, exchange: Exchange) -> Option<&HistoryBuffer> {
        self.buffers.get(&exchange)
    }

    /// Run until the shutdown channel fires.
    ///
    /// The interval guarantees at least `poll_interval_ms` between cycle
    /// starts; a cycle that runs long delays the next tick rather than
    /// bursting.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            symbol = %self.config.symbol,
            interval_ms = self.config.poll_interval_ms,
            history_size = self.config.history_size,
            "Starting polling loop"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender also means stop.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.cycle().await;
                }
            }
        }

        self.log_summary();
    }

    /// Run exactly one polling cycle.
    pub async fn cycle(&mut self) {
        self.cycles += 1;
        let prices = self.fetch_all().await;

        for (&exchange, &price) in &prices {
            if let Some(buffer) = self.buffers.get_mut(&exchange) {
                buffer.append(PriceSample::now(price));
            }
        }

        let report = if prices.len() == self.sources.len() {
            let leader = signal::determine_leader(&self.buffers);
            self.tally.record(leader);

            let signals =
                signal::evaluate_cycle(&prices, &self.buffers, leader, &self.tally, &self.config);

            if let Some(opportunity) = &signals.opportunity {
                info!(%opportunity, "Arbitrage opportunity detected");
                if let Err(e) = self.opportunity_log.append(opportunity) {
                    warn!(error = %e, "Failed to append opportunity log");
                }
            }

            CycleReport::Complete(signals)
        } else {
            let missing: Vec<Exchange> = self
                .sources
                .iter()
                .map(|s| s.exchange())
                .filter(|e| !prices.contains_key(e))
                .collect();
            debug!(?missing, "Incomplete cycle");
            CycleReport::Incomplete { missing }
        };

        self.reporter.emit(&report);
    }

    /// Concurrently fetch every source's current price, each bounded by
    /// the per-fetch timeout. Failures are logged and skipped; a single
    /// exchange never stalls or aborts the cycle.
    async fn fetch_all(&self) -> BTreeMap<Exchange, Decimal> {
        let timeout = self.config.fetch_timeout();
        let timeout_ms = self.config.fetch_timeout_ms;
        let symbol = self.config.symbol.as_str();

        let fetches = self.sources.iter().map(|source| async move {
            let exchange = source.exchange();
            let result = match tokio::time::timeout(timeout, source.fetch(symbol)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    exchange,
                    timeout_ms,
                }),
            };
            (exchange, result)
        });

        let mut prices = BTreeMap::new();
        for (exchange, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(price) if price > Decimal::ZERO => {
                    prices.insert(exchange, price);
                }
                Ok(price) => {
                    warn!(%exchange, %price, "Rejected non-positive price");
                }
                Err(e) => {
                    warn!(%exchange, error = %e, "Fetch failed; skipping for this cycle");
                }
            }
        }
        prices
    }

    fn log_summary(&self) {
        info!("========================================");
        info!("POLLING STOPPED - FINAL SUMMARY");
        info!("Cycles started: {}", self.cycles);
        info!(
            "Complete cycles evaluated: {}",
            self.tally.total_evaluated_cycles()
        );
        for exchange in Exchange::ALL {
            info!(
                "{} led {} cycles ({:.2}%)",
                exchange,
                self.tally.lead_count(exchange),
                self.tally.lead_pct(exchange)
            );
        }
        info!("========================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{MockPriceSource, MockTick};
    use rust_decimal_macros::dec;

    fn test_config() -> Config {
        Config {
            symbol: "BTC-USD".to_string(),
            history_size: 3,
            arbitrage_threshold_pct: dec!(0.02),
            twap_period_seconds: 60.0,
            twap_detect_samples: 3,
            twap_pattern_threshold: dec!(0.01),
            poll_interval_ms: 10,
            fetch_timeout_ms: 50,
            http_pool_size: 10,
            binance_url: "http://localhost/binance".to_string(),
            bybit_url: "http://localhost/bybit".to_string(),
            coinbase_url: "http://localhost/coinbase".to_string(),
            opportunity_log: "arbitrage_opportunities.log".to_string(),
            rust_log: "info".to_string(),
            verbose: false,
        }
    }

    fn poll_loop_with(
        config: Config,
        sources: Vec<MockPriceSource>,
        log_path: std::path::PathBuf,
    ) -> PollLoop {
        let sources: Vec<Arc<dyn PriceSource>> = sources
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn PriceSource>)
            .collect();
        PollLoop::new(
            config,
            sources,
            Reporter::new("BTC-USD"),
            OpportunityLog::new(log_path),
        )
    }

    #[tokio::test]
    async fn complete_cycle_advances_all_buffers_and_tally() {
        let dir = tempfile::tempdir().unwrap();
        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::with_prices(Exchange::Binance, [dec!(100.00)]),
                MockPriceSource::with_prices(Exchange::Bybit, [dec!(100.01)]),
                MockPriceSource::with_prices(Exchange::Coinbase, [dec!(100.02)]),
            ],
            dir.path().join("opps.log"),
        );

        poll.cycle().await;

        for exchange in Exchange::ALL {
            assert_eq!(poll.buffer(exchange).unwrap().len(), 1);
        }
        assert_eq!(poll.tally().total_evaluated_cycles(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_marks_cycle_incomplete_but_advances_others() {
        let dir = tempfile::tempdir().unwrap();
        let coinbase = MockPriceSource::new(Exchange::Coinbase);
        coinbase.push(MockTick::NoPrice);

        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::with_prices(Exchange::Binance, [dec!(100.00)]),
                MockPriceSource::with_prices(Exchange::Bybit, [dec!(99.00)]),
                coinbase,
            ],
            dir.path().join("opps.log"),
        );

        poll.cycle().await;

        assert_eq!(poll.buffer(Exchange::Binance).unwrap().len(), 1);
        assert_eq!(poll.buffer(Exchange::Bybit).unwrap().len(), 1);
        assert_eq!(poll.buffer(Exchange::Coinbase).unwrap().len(), 0);
        // Incomplete cycles never count as evaluated.
        assert_eq!(poll.tally().total_evaluated_cycles(), 0);
    }

    #[tokio::test]
    async fn hung_fetch_times_out_without_stalling_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let coinbase = MockPriceSource::new(Exchange::Coinbase);
        coinbase.push(MockTick::Hang);

        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::with_prices(Exchange::Binance, [dec!(100.00)]),
                MockPriceSource::with_prices(Exchange::Bybit, [dec!(99.00)]),
                coinbase,
            ],
            dir.path().join("opps.log"),
        );

        let start = std::time::Instant::now();
        poll.cycle().await;

        // Bounded by the 50ms fetch timeout, not by the hang.
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(poll.buffer(Exchange::Coinbase).unwrap().len(), 0);
        assert_eq!(poll.buffer(Exchange::Binance).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn breaching_divergence_is_appended_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("opps.log");
        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::with_prices(Exchange::Binance, [dec!(100.00)]),
                MockPriceSource::with_prices(Exchange::Bybit, [dec!(99.00)]),
                MockPriceSource::with_prices(Exchange::Coinbase, [dec!(100.50)]),
            ],
            log_path.clone(),
        );

        poll.cycle().await;

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("Buy on Bybit and sell on Binance"));
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::with_prices(Exchange::Binance, [dec!(0)]),
                MockPriceSource::with_prices(Exchange::Bybit, [dec!(99.00)]),
                MockPriceSource::with_prices(Exchange::Coinbase, [dec!(99.00)]),
            ],
            dir.path().join("opps.log"),
        );

        poll.cycle().await;

        assert_eq!(poll.buffer(Exchange::Binance).unwrap().len(), 0);
        assert_eq!(poll.tally().total_evaluated_cycles(), 0);
    }

    #[tokio::test]
    async fn buffers_evict_fifo_across_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.history_size = 2;

        let prices = [dec!(100), dec!(101), dec!(102)];
        let mut poll = poll_loop_with(
            config,
            vec![
                MockPriceSource::with_prices(Exchange::Binance, prices),
                MockPriceSource::with_prices(Exchange::Bybit, prices),
                MockPriceSource::with_prices(Exchange::Coinbase, prices),
            ],
            dir.path().join("opps.log"),
        );

        for _ in 0..3 {
            poll.cycle().await;
        }

        let buffer = poll.buffer(Exchange::Binance).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.oldest().unwrap().price, dec!(101));
        assert_eq!(buffer.newest().unwrap().price, dec!(102));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let mut poll = poll_loop_with(
            test_config(),
            vec![
                MockPriceSource::new(Exchange::Binance),
                MockPriceSource::new(Exchange::Bybit),
                MockPriceSource::new(Exchange::Coinbase),
            ],
            dir.path().join("opps.log"),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            poll.run(rx).await;
            poll
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let poll = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
        assert!(poll.cycles() >= 1);
    }
}
