//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Every field is run-wide and immutable after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Watch Target ===
    /// Trading pair in canonical dash form (e.g. "BTC-USD").
    #[serde(default = "default_symbol")]
    pub symbol: String,

    // === History ===
    /// Samples kept per exchange (minimum 2).
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    // === Signal Thresholds ===
    /// Pairwise divergence (in percent) above which an arbitrage
    /// opportunity is reported.
    #[serde(default = "default_arbitrage_threshold")]
    pub arbitrage_threshold_pct: Decimal,

    /// Trailing time window for the TWAP average, in seconds.
    #[serde(default = "default_twap_period")]
    pub twap_period_seconds: f64,

    /// Sample count examined by TWAP pattern detection (minimum 2).
    /// Independent of the time-based `twap_period_seconds`.
    #[serde(default = "default_twap_detect_samples")]
    pub twap_detect_samples: usize,

    /// Mean absolute per-tick change at or below which price action
    /// counts as TWAP-like execution.
    #[serde(default = "default_twap_pattern_threshold")]
    pub twap_pattern_threshold: Decimal,

    // === Polling ===
    /// Minimum milliseconds between cycle starts.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-fetch timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Connection pool per host.
    #[serde(default = "default_http_pool_size")]
    pub http_pool_size: usize,

    // === Endpoints ===
    /// Binance spot ticker endpoint.
    #[serde(default = "default_binance_url")]
    pub binance_url: String,

    /// Bybit market tickers endpoint.
    #[serde(default = "default_bybit_url")]
    pub bybit_url: String,

    /// Coinbase spot price endpoint base (symbol is appended).
    #[serde(default = "default_coinbase_url")]
    pub coinbase_url: String,

    // === Output ===
    /// Append-only opportunity log path.
    #[serde(default = "default_opportunity_log")]
    pub opportunity_log: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_symbol() -> String {
    "BTC-USD".to_string()
}

fn default_history_size() -> usize {
    20
}

fn default_arbitrage_threshold() -> Decimal {
    Decimal::new(2, 2) // 0.02%
}

fn default_twap_period() -> f64 {
    60.0
}

fn default_twap_detect_samples() -> usize {
    20
}

fn default_twap_pattern_threshold() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_fetch_timeout_ms() -> u64 {
    2000
}

fn default_http_pool_size() -> usize {
    10
}

fn default_binance_url() -> String {
    "https://api.binance.com/api/v3/ticker/price".to_string()
}

fn default_bybit_url() -> String {
    "https://api.bybit.com/v5/market/tickers".to_string()
}

fn default_coinbase_url() -> String {
    "https://api.coinbase.com/v2/prices".to_string()
}

fn default_opportunity_log() -> String {
    "arbitrage_opportunities.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("SYMBOL must not be empty".to_string());
        }

        if self.history_size < 2 {
            return Err("HISTORY_SIZE must be at least 2".to_string());
        }

        if self.arbitrage_threshold_pct <= Decimal::ZERO {
            return Err("ARBITRAGE_THRESHOLD_PCT must be positive".to_string());
        }

        if !self.twap_period_seconds.is_finite() || self.twap_period_seconds <= 0.0 {
            return Err("TWAP_PERIOD_SECONDS must be positive".to_string());
        }

        if self.twap_detect_samples < 2 {
            return Err("TWAP_DETECT_SAMPLES must be at least 2".to_string());
        }

        if self.twap_pattern_threshold < Decimal::ZERO {
            return Err("TWAP_PATTERN_THRESHOLD must not be negative".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("POLL_INTERVAL_MS must be positive".to_string());
        }

        if self.fetch_timeout_ms == 0 {
            return Err("FETCH_TIMEOUT_MS must be positive".to_string());
        }

        Ok(())
    }

    /// Minimum duration between cycle starts.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Trailing TWAP window.
    pub fn twap_period(&self) -> time::Duration {
        time::Duration::seconds_f64(self.twap_period_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            symbol: default_symbol(),
            history_size: default_history_size(),
            arbitrage_threshold_pct: default_arbitrage_threshold(),
            twap_period_seconds: default_twap_period(),
            twap_detect_samples: default_twap_detect_samples(),
            twap_pattern_threshold: default_twap_pattern_threshold(),
            poll_interval_ms: default_poll_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            http_pool_size: default_http_pool_size(),
            binance_url: default_binance_url(),
            bybit_url: default_bybit_url(),
            coinbase_url: default_coinbase_url(),
            opportunity_log: default_opportunity_log(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_history_size(), 20);
        assert_eq!(default_arbitrage_threshold(), Decimal::new(2, 2));
        assert_eq!(default_poll_interval_ms(), 200);
        assert_eq!(default_twap_period(), 60.0);
    }

    #[test]
    fn default_config_validates() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_small_history() {
        let mut config = test_config();
        config.history_size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut config = test_config();
        config.arbitrage_threshold_pct = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = test_config();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_twap_period() {
        let mut config = test_config();
        config.twap_period_seconds = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_convert() {
        let config = test_config();
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(2000));
        assert_eq!(config.twap_period(), time::Duration::seconds(60));
    }
}
