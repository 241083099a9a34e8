//! Pairwise cross-exchange divergence and arbitrage detection.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::instrument;

use crate::exchange::Exchange;

/// Divergence between one exchange pair for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairDivergence {
    /// First exchange of the pair (canonical order).
    pub a: Exchange,
    /// Second exchange of the pair; its price is the normalization
    /// denominator.
    pub b: Exchange,
    /// (pA - pB) / pB * 100. Positive means `a` trades above `b`.
    pub pct: Decimal,
}

/// A pairwise divergence exceeding the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opportunity {
    /// Exchange to buy on (the lower-priced side).
    pub buy: Exchange,
    /// Exchange to sell on (the higher-priced side).
    pub sell: Exchange,
    /// The breaching divergence, signed as computed for the pair.
    pub divergence_pct: Decimal,
    /// When the opportunity was detected.
    pub detected_at: OffsetDateTime,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buy on {} and sell on {} ({}% divergence)",
            self.buy,
            self.sell,
            self.divergence_pct.round_dp(4)
        )
    }
}

impl Opportunity {
    /// True if the exchange participates in this opportunity.
    pub fn involves(&self, exchange: Exchange) -> bool {
        self.buy == exchange || self.sell == exchange
    }
}

/// Percentage divergence of `a` over `b`, normalized by `b`.
///
/// Note the asymmetric denominator: `divergence_pct(a, b)` is not the
/// exact negation of `divergence_pct(b, a)`.
pub fn divergence_pct(a: Decimal, b: Decimal) -> Decimal {
    (a - b) / b * Decimal::ONE_HUNDRED
}

/// Divergence for every exchange pair, in fixed evaluation order.
///
/// Callers must supply a price for every exchange; the poll loop only
/// invokes this on complete cycles.
pub fn pairwise_divergences(prices: &BTreeMap<Exchange, Decimal>) -> Vec<PairDivergence> {
    Exchange::PAIRS
        .iter()
        .filter_map(|&(a, b)| {
            let (pa, pb) = (prices.get(&a)?, prices.get(&b)?);
            Some(PairDivergence {
                a,
                b,
                pct: divergence_pct(*pa, *pb),
            })
        })
        .collect()
}

/// Report the first pair whose |divergence| exceeds the threshold.
///
/// Pairs are evaluated in the fixed canonical order and only the first
/// breach is reported per cycle, matching the short-circuit policy
/// described in the module docs.
#[instrument(skip(divergences))]
pub fn detect_opportunity(
    divergences: &[PairDivergence],
    threshold_pct: Decimal,
) -> Option<Opportunity> {
    divergences
        .iter()
        .find(|d| d.pct.abs() > threshold_pct)
        .map(|d| {
            // Positive divergence: a trades above b, so buy b / sell a.
            let (buy, sell) = if d.pct > Decimal::ZERO {
                (d.b, d.a)
            } else {
                (d.a, d.b)
            };
            Opportunity {
                buy,
                sell,
                divergence_pct: d.pct,
                detected_at: OffsetDateTime::now_utc(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn prices(binance: Decimal, bybit: Decimal, coinbase: Decimal) -> BTreeMap<Exchange, Decimal> {
        BTreeMap::from([
            (Exchange::Binance, binance),
            (Exchange::Bybit, bybit),
            (Exchange::Coinbase, coinbase),
        ])
    }

    #[test]
    fn divergence_formula_is_exact() {
        // (100 - 99) / 99 * 100
        assert_eq!(
            divergence_pct(dec!(100), dec!(99)).round_dp(4),
            dec!(1.0101)
        );
    }

    #[test]
    fn divergence_is_not_naively_antisymmetric() {
        let forward = divergence_pct(dec!(100), dec!(99));
        let backward = divergence_pct(dec!(99), dec!(100));

        // Different denominators: -1.0 vs +1.0101..., not exact negations.
        assert_eq!(backward, dec!(-1));
        assert_ne!(forward, -backward);
        // But signs always oppose.
        assert!(forward > Decimal::ZERO && backward < Decimal::ZERO);
    }

    #[test]
    fn pairwise_follows_canonical_order() {
        let divergences = pairwise_divergences(&prices(dec!(100), dec!(99), dec!(100.50)));

        assert_eq!(divergences.len(), 3);
        assert_eq!(
            (divergences[0].a, divergences[0].b),
            (Exchange::Binance, Exchange::Bybit)
        );
        assert_eq!(
            (divergences[1].a, divergences[1].b),
            (Exchange::Binance, Exchange::Coinbase)
        );
        assert_eq!(
            (divergences[2].a, divergences[2].b),
            (Exchange::Bybit, Exchange::Coinbase)
        );
    }

    #[test]
    fn worked_example_buy_bybit_sell_binance() {
        // Binance=100.00, Bybit=99.00, Coinbase=100.50, threshold=0.02%.
        let divergences = pairwise_divergences(&prices(dec!(100.00), dec!(99.00), dec!(100.50)));
        let opportunity = detect_opportunity(&divergences, dec!(0.02)).unwrap();

        // Binance-Bybit breaches first (+1.01%), so the later pairs are
        // never reported even though they also breach.
        assert_eq!(opportunity.buy, Exchange::Bybit);
        assert_eq!(opportunity.sell, Exchange::Binance);
        assert_eq!(opportunity.divergence_pct.round_dp(2), dec!(1.01));
    }

    #[test]
    fn negative_divergence_flips_sides() {
        let divergences = pairwise_divergences(&prices(dec!(99.00), dec!(100.00), dec!(99.00)));
        let opportunity = detect_opportunity(&divergences, dec!(0.5)).unwrap();

        assert_eq!(opportunity.buy, Exchange::Binance);
        assert_eq!(opportunity.sell, Exchange::Bybit);
        assert!(opportunity.divergence_pct < Decimal::ZERO);
    }

    #[test]
    fn no_opportunity_below_threshold() {
        let divergences = pairwise_divergences(&prices(dec!(100.00), dec!(100.001), dec!(100.0)));
        assert!(detect_opportunity(&divergences, dec!(0.02)).is_none());
    }

    #[test]
    fn threshold_is_strict() {
        // Exactly at threshold does not breach.
        let divergences = vec![PairDivergence {
            a: Exchange::Binance,
            b: Exchange::Bybit,
            pct: dec!(0.02),
        }];
        assert!(detect_opportunity(&divergences, dec!(0.02)).is_none());
    }

    #[test]
    fn opportunity_display_names_both_sides() {
        let text = Opportunity {
            buy: Exchange::Bybit,
            sell: Exchange::Binance,
            divergence_pct: dec!(1.0101),
            detected_at: OffsetDateTime::UNIX_EPOCH,
        }
        .to_string();

        assert!(text.contains("Buy on Bybit"));
        assert!(text.contains("sell on Binance"));
    }
}
