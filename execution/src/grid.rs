//! Grid ladder planning.
//!
//! A GRID_* signal is executed as a ladder of equally-sized limit orders
//! at stepped offsets from the current price instead of a single market
//! order: buys step upward from the price, sells step downward.

use common::{OrderSide, Signal};
use tracing::debug;

use crate::client::OrderRequest;

pub const GRID_LEVELS: usize = 3;
pub const GRID_STEP: f64 = 0.01;

/// Plan the default three-level, 1%-step ladder.
pub fn plan_grid(signal: Signal, coin: &str, price: f64, total_size: f64) -> Vec<OrderRequest> {
    plan_grid_with(signal, coin, price, total_size, GRID_LEVELS, GRID_STEP)
}

/// Plan a grid ladder. Non-grid signals and degenerate inputs produce an
/// empty plan.
pub fn plan_grid_with(
    signal: Signal,
    coin: &str,
    price: f64,
    total_size: f64,
    levels: usize,
    step: f64,
) -> Vec<OrderRequest> {
    let side = match signal {
        Signal::GridBuy => OrderSide::Buy,
        Signal::GridSell => OrderSide::Sell,
        _ => return Vec::new(),
    };
    if levels == 0 || !(price > 0.0) || !(total_size > 0.0) {
        return Vec::new();
    }

    let size = total_size / levels as f64;
    let orders = (0..levels)
        .map(|level| {
            let offset = level as f64 * step;
            let limit_price = match side {
                OrderSide::Buy => price * (1.0 + offset),
                OrderSide::Sell => price * (1.0 - offset),
            };
            OrderRequest {
                coin: coin.to_string(),
                side,
                size,
                limit_price: Some(limit_price),
            }
        })
        .collect::<Vec<_>>();
    debug!(%signal, levels = orders.len(), size_per_level = size, "grid ladder planned");
    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{a} != {e}");
        }
    }

    #[test]
    fn buy_ladder_steps_upward() {
        let orders = plan_grid(Signal::GridBuy, "BTC", 60000.0, 0.009);
        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(|o| o.side == OrderSide::Buy));

        let prices: Vec<f64> = orders.iter().filter_map(|o| o.limit_price).collect();
        assert_close(&prices, &[60000.0, 60600.0, 61200.0]);
    }

    #[test]
    fn sell_ladder_steps_downward() {
        let orders = plan_grid(Signal::GridSell, "BTC", 60000.0, 0.009);
        let prices: Vec<f64> = orders.iter().filter_map(|o| o.limit_price).collect();
        assert_close(&prices, &[60000.0, 59400.0, 58800.0]);
    }

    #[test]
    fn level_sizes_sum_to_total() {
        let orders = plan_grid(Signal::GridBuy, "BTC", 60000.0, 0.009);
        let total: f64 = orders.iter().map(|o| o.size).sum();
        assert!((total - 0.009).abs() < 1e-12);
        assert!(orders.iter().all(|o| (o.size - 0.003).abs() < 1e-12));
    }

    #[test]
    fn non_grid_signals_plan_nothing() {
        assert!(plan_grid(Signal::Buy, "BTC", 60000.0, 0.009).is_empty());
        assert!(plan_grid(Signal::Hold, "BTC", 60000.0, 0.009).is_empty());
        assert!(plan_grid(Signal::GridHold, "BTC", 60000.0, 0.009).is_empty());
    }

    #[test]
    fn degenerate_inputs_plan_nothing() {
        assert!(plan_grid(Signal::GridBuy, "BTC", 0.0, 0.009).is_empty());
        assert!(plan_grid(Signal::GridBuy, "BTC", 60000.0, 0.0).is_empty());
        assert!(plan_grid_with(Signal::GridBuy, "BTC", 60000.0, 0.009, 0, GRID_STEP).is_empty());
    }
}
