//! Cross-exchange spot price divergence and TWAP pattern watcher.
//!
//! Polls Binance, Bybit, and Coinbase for one trading symbol on a fixed
//! interval, keeps a bounded rolling history per exchange, and derives
//! three per-cycle signals:
//!
//! - pairwise cross-exchange divergence (percent, normalized by the
//!   second exchange's price)
//! - which exchange is currently leading price movement over the window
//! - a TWAP estimate with a slow-steady execution-pattern flag and an
//!   implied order-size heuristic
//!
//! Results render to a colored console table; divergences above the
//! configured threshold are appended to a persistent opportunity log.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`exchange`]: Exchange adapters and the price-source capability
//! - [`history`]: Bounded rolling price history
//! - [`signal`]: Divergence, leadership, and TWAP computation
//! - [`report`]: Console table and opportunity log
//! - [`poll`]: The fixed-interval polling loop

pub mod config;
pub mod error;
pub mod exchange;
pub mod history;
pub mod poll;
pub mod report;
pub mod signal;

pub use config::Config;
pub use error::{Result, SourceError, WatchError};
