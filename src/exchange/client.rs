//! Live spot price client for the three exchanges.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::SourceError;

use super::types::Exchange;
use super::PriceSource;

/// HTTP client for the public spot price endpoints.
#[derive(Debug, Clone)]
pub struct SpotClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Binance ticker endpoint.
    binance_url: String,
    /// Bybit tickers endpoint.
    bybit_url: String,
    /// Coinbase spot price endpoint base.
    coinbase_url: String,
}

/// Binance `/ticker/price` response.
#[derive(Debug, Clone, Deserialize)]
struct BinanceTicker {
    /// Last price as a decimal string; absent on error responses.
    price: Option<String>,
}

/// Bybit `/v5/market/tickers` response envelope.
#[derive(Debug, Clone, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    result: Option<BybitResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<BybitTicker>,
}

#[derive(Debug, Clone, Deserialize)]
struct BybitTicker {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: String,
}

/// Coinbase `/v2/prices/{symbol}/spot` response.
#[derive(Debug, Clone, Deserialize)]
struct CoinbaseResponse {
    data: Option<CoinbasePrice>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoinbasePrice {
    amount: Option<String>,
}

impl SpotClient {
    /// Create a new client from config with low-latency HTTP settings.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            // Fast connection establishment
            .connect_timeout(std::time::Duration::from_millis(500))
            // TCP_NODELAY for low-latency (disable Nagle's algorithm)
            .tcp_nodelay(true)
            // Keep connections alive for reuse
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(config.http_pool_size)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            binance_url: config.binance_url.clone(),
            bybit_url: config.bybit_url.clone(),
            coinbase_url: config.coinbase_url.clone(),
        }
    }

    /// Get the HTTP client reference.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch the current spot price from one exchange.
    #[instrument(skip(self), fields(exchange = %exchange, symbol = %symbol))]
    pub async fn fetch_price(
        &self,
        exchange: Exchange,
        symbol: &str,
    ) -> Result<Decimal, SourceError> {
        let price = match exchange {
            Exchange::Binance => self.binance_price(symbol).await?,
            Exchange::Bybit => self.bybit_price(symbol).await?,
            Exchange::Coinbase => self.coinbase_price(symbol).await?,
        };

        debug!(price = %price, "Fetched spot price");
        Ok(price)
    }

    async fn binance_price(&self, symbol: &str) -> Result<Decimal, SourceError> {
        let encoded = Exchange::Binance.encode_symbol(symbol);
        let response = self
            .http
            .get(&self.binance_url)
            .query(&[("symbol", encoded.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::BadStatus {
                exchange: Exchange::Binance,
                status: response.status(),
            });
        }

        let ticker: BinanceTicker = response.json().await.map_err(|e| SourceError::Parse {
            exchange: Exchange::Binance,
            reason: e.to_string(),
        })?;

        let raw = ticker.price.ok_or(SourceError::NoPrice {
            exchange: Exchange::Binance,
        })?;

        parse_price(Exchange::Binance, &raw)
    }

    async fn bybit_price(&self, symbol: &str) -> Result<Decimal, SourceError> {
        let encoded = Exchange::Bybit.encode_symbol(symbol);
        let response = self
            .http
            .get(&self.bybit_url)
            .query(&[("category", "spot"), ("symbol", encoded.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::BadStatus {
                exchange: Exchange::Bybit,
                status: response.status(),
            });
        }

        let body: BybitResponse = response.json().await.map_err(|e| SourceError::Parse {
            exchange: Exchange::Bybit,
            reason: e.to_string(),
        })?;

        if body.ret_code != 0 {
            return Err(SourceError::NoPrice {
                exchange: Exchange::Bybit,
            });
        }

        let raw = body
            .result
            .map(|r| r.list)
            .unwrap_or_default()
            .into_iter()
            .find(|t| t.symbol == encoded)
            .map(|t| t.last_price)
            .ok_or(SourceError::NoPrice {
                exchange: Exchange::Bybit,
            })?;

        parse_price(Exchange::Bybit, &raw)
    }

    async fn coinbase_price(&self, symbol: &str) -> Result<Decimal, SourceError> {
        let encoded = Exchange::Coinbase.encode_symbol(symbol);
        let url = format!("{}/{}/spot", self.coinbase_url, encoded);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::BadStatus {
                exchange: Exchange::Coinbase,
                status: response.status(),
            });
        }

        let body: CoinbaseResponse = response.json().await.map_err(|e| SourceError::Parse {
            exchange: Exchange::Coinbase,
            reason: e.to_string(),
        })?;

        let raw = body
            .data
            .and_then(|d| d.amount)
            .ok_or(SourceError::NoPrice {
                exchange: Exchange::Coinbase,
            })?;

        parse_price(Exchange::Coinbase, &raw)
    }
}

fn parse_price(exchange: Exchange, raw: &str) -> Result<Decimal, SourceError> {
    raw.parse::<Decimal>().map_err(|e| SourceError::Parse {
        exchange,
        reason: format!("bad price {raw:?}: {e}"),
    })
}

/// A `PriceSource` bound to one exchange, backed by a shared [`SpotClient`].
#[derive(Debug, Clone)]
pub struct LiveSource {
    exchange: Exchange,
    client: Arc<SpotClient>,
}

impl LiveSource {
    /// Create a live source for one exchange.
    pub fn new(exchange: Exchange, client: Arc<SpotClient>) -> Self {
        Self { exchange, client }
    }

    /// One live source per supported exchange, sharing a single client.
    pub fn all(client: Arc<SpotClient>) -> Vec<Self> {
        Exchange::ALL
            .into_iter()
            .map(|exchange| Self::new(exchange, Arc::clone(&client)))
            .collect()
    }
}

#[async_trait]
impl PriceSource for LiveSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    async fn fetch(&self, symbol: &str) -> Result<Decimal, SourceError> {
        self.client.fetch_price(self.exchange, symbol).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            symbol: "BTC-USD".to_string(),
            history_size: 20,
            arbitrage_threshold_pct: Decimal::new(2, 2),
            twap_period_seconds: 60.0,
            twap_detect_samples: 20,
            twap_pattern_threshold: Decimal::new(1, 2),
            poll_interval_ms: 200,
            fetch_timeout_ms: 2000,
            http_pool_size: 10,
            binance_url: "https://api.binance.com/api/v3/ticker/price".to_string(),
            bybit_url: "https://api.bybit.com/v5/market/tickers".to_string(),
            coinbase_url: "https://api.coinbase.com/v2/prices".to_string(),
            opportunity_log: "arbitrage_opportunities.log".to_string(),
            rust_log: "info".to_string(),
            verbose: false,
        }
    }

    #[test]
    fn client_creation_works() {
        let config = test_config();
        let client = SpotClient::new(&config);
        assert_eq!(client.binance_url, config.binance_url);
    }

    #[test]
    fn live_source_all_covers_every_exchange() {
        let client = Arc::new(SpotClient::new(&test_config()));
        let sources = LiveSource::all(client);
        let exchanges: Vec<_> = sources.iter().map(|s| s.exchange()).collect();
        assert_eq!(exchanges, Exchange::ALL);
    }

    #[test]
    fn bybit_response_parses() {
        let json = r#"{
            "retCode": 0,
            "result": {"list": [{"symbol": "BTCUSDT", "lastPrice": "67000.10"}]}
        }"#;
        let body: BybitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.ret_code, 0);
        assert_eq!(body.result.unwrap().list[0].last_price, "67000.10");
    }

    #[test]
    fn coinbase_response_parses() {
        let json = r#"{"data": {"base": "BTC", "currency": "USD", "amount": "66950.01"}}"#;
        let body: CoinbaseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.data.unwrap().amount.as_deref(), Some("66950.01"));
    }

    #[test]
    fn parse_price_rejects_garbage() {
        assert!(parse_price(Exchange::Binance, "not-a-number").is_err());
        assert!(parse_price(Exchange::Binance, "123.45").is_ok());
    }
}
