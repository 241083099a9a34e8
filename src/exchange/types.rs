//! Exchange identifiers and symbol encoding.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported spot exchanges.
///
/// The derive order is the canonical ordering used for pair evaluation
/// and table rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Binance spot.
    #[strum(serialize = "binance", to_string = "Binance")]
    Binance,
    /// Bybit spot.
    #[strum(serialize = "bybit", to_string = "Bybit")]
    Bybit,
    /// Coinbase spot.
    #[strum(serialize = "coinbase", to_string = "Coinbase")]
    Coinbase,
}

impl Exchange {
    /// All exchanges in canonical order.
    pub const ALL: [Exchange; 3] = [Exchange::Binance, Exchange::Bybit, Exchange::Coinbase];

    /// Unordered exchange pairs in fixed evaluation order.
    pub const PAIRS: [(Exchange, Exchange); 3] = [
        (Exchange::Binance, Exchange::Bybit),
        (Exchange::Binance, Exchange::Coinbase),
        (Exchange::Bybit, Exchange::Coinbase),
    ];

    /// Encode a canonical dash-form symbol (e.g. "BTC-USD") the way this
    /// exchange's API expects it.
    ///
    /// Binance and Bybit use a concatenated pair quoted in USDT
    /// ("BTC-USD" becomes "BTCUSDT"); Coinbase takes the canonical form
    /// unchanged.
    pub fn encode_symbol(&self, symbol: &str) -> String {
        match self {
            Exchange::Binance | Exchange::Bybit => {
                let joined = symbol.replace('-', "");
                if let Some(base) = joined.strip_suffix("USD") {
                    format!("{base}USDT")
                } else {
                    joined
                }
            }
            Exchange::Coinbase => symbol.to_string(),
        }
    }
}
