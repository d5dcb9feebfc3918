use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical trade signal, produced fresh on every evaluation.
///
/// `GridHold` exists in the label set but the current decision rules never
/// produce it: a HOLD stays untagged even in a ranging regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Hold,
    Buy,
    Sell,
    StrongBuy,
    StrongSell,
    GridBuy,
    GridSell,
    GridHold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Hold => "HOLD",
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::StrongBuy => "STRONG_BUY",
            Signal::StrongSell => "STRONG_SELL",
            Signal::GridBuy => "GRID_BUY",
            Signal::GridSell => "GRID_SELL",
            Signal::GridHold => "GRID_HOLD",
        }
    }

    pub fn is_buy_side(&self) -> bool {
        matches!(self, Signal::Buy | Signal::StrongBuy | Signal::GridBuy)
    }

    pub fn is_sell_side(&self) -> bool {
        matches!(self, Signal::Sell | Signal::StrongSell | Signal::GridSell)
    }

    /// Grid signals are executed as a ladder of limit orders rather than a
    /// single market order.
    pub fn is_grid(&self) -> bool {
        matches!(self, Signal::GridBuy | Signal::GridSell | Signal::GridHold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-evaluation features supplied from outside the candle series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalFeatures {
    /// Aggregate sentiment score, roughly -1 (bearish) to 1 (bullish).
    /// Defaults to 0 when the sentiment source is unavailable.
    pub sentiment: f64,
    /// Latest perpetual funding rate for the traded coin.
    pub funding_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_labels() {
        assert_eq!(Signal::StrongBuy.to_string(), "STRONG_BUY");
        assert_eq!(Signal::GridSell.to_string(), "GRID_SELL");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Signal::GridBuy).unwrap();
        assert_eq!(json, "\"GRID_BUY\"");
        let back: Signal = serde_json::from_str("\"STRONG_SELL\"").unwrap();
        assert_eq!(back, Signal::StrongSell);
    }

    #[test]
    fn side_predicates() {
        assert!(Signal::GridBuy.is_buy_side());
        assert!(Signal::StrongSell.is_sell_side());
        assert!(!Signal::Hold.is_buy_side());
        assert!(!Signal::Hold.is_sell_side());
        assert!(Signal::GridHold.is_grid());
    }
}
