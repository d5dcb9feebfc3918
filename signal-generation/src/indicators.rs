//! Rolling-window indicators over a candle series.
//!
//! Every indicator reads only already-observed bars, never ahead. This is
//! a correctness invariant: it keeps live evaluation and backtests
//! producing the same values for the same rows.
//!
//! Warm-up policy: the first `window - 1` rows of each indicator are
//! computed over a shrinking window (the rows observed so far) instead of
//! being left undefined, so short series still produce deterministic
//! values.

use common::CandleSeries;
use statrs::statistics::Statistics;
use tracing::debug;

pub const SMA_FAST: usize = 10;
pub const SMA_SLOW: usize = 50;
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;
pub const CHOP_PERIOD: usize = 14;

/// Neutral RSI value used when no price differences are available yet.
const RSI_NEUTRAL: f64 = 50.0;
/// Mid-scale choppiness used for degenerate windows (no range, no true
/// range, or fewer than two bars).
const CHOP_NEUTRAL: f64 = 50.0;

/// Per-row indicator columns. All vectors have the same length as the
/// input series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    pub sma10: Vec<f64>,
    pub sma20: Vec<f64>,
    pub sma50: Vec<f64>,
    pub rsi14: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub choppiness: Vec<f64>,
}

/// The most recent indicator row, consumed by the decision rules.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorRow {
    pub sma10: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub rsi14: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub choppiness: f64,
}

impl IndicatorSet {
    /// Compute all indicator columns for the series.
    pub fn compute(series: &CandleSeries) -> Self {
        let closes = series.closes();

        let sma10 = rolling_mean(&closes, SMA_FAST);
        let sma20 = rolling_mean(&closes, BOLLINGER_WINDOW);
        let sma50 = rolling_mean(&closes, SMA_SLOW);
        let std20 = rolling_std(&closes, BOLLINGER_WINDOW);

        let bb_upper = sma20
            .iter()
            .zip(&std20)
            .map(|(m, s)| m + BOLLINGER_WIDTH * s)
            .collect();
        let bb_lower = sma20
            .iter()
            .zip(&std20)
            .map(|(m, s)| m - BOLLINGER_WIDTH * s)
            .collect();

        let set = Self {
            sma10,
            sma20,
            sma50,
            rsi14: rsi(&closes, RSI_PERIOD),
            bb_upper,
            bb_lower,
            choppiness: choppiness(series, CHOP_PERIOD),
        };
        debug!(rows = set.len(), "indicators computed");
        set
    }

    pub fn len(&self) -> usize {
        self.sma10.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma10.is_empty()
    }

    /// The last row of every column, or `None` for an empty set.
    pub fn latest(&self) -> Option<IndicatorRow> {
        Some(IndicatorRow {
            sma10: *self.sma10.last()?,
            sma20: *self.sma20.last()?,
            sma50: *self.sma50.last()?,
            rsi14: *self.rsi14.last()?,
            bb_upper: *self.bb_upper.last()?,
            bb_lower: *self.bb_lower.last()?,
            choppiness: *self.choppiness.last()?,
        })
    }
}

/// Rolling mean with a shrinking window over the first `window - 1` rows.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i].iter().mean()
        })
        .collect()
}

/// Rolling sample standard deviation; 0 while fewer than two observations.
fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            if slice.len() < 2 {
                0.0
            } else {
                slice.iter().std_dev()
            }
        })
        .collect()
}

/// Relative strength index over simple rolling means of gains and losses.
///
/// A window with zero average loss yields exactly 100 rather than a
/// division fault. Row 0 has no differences yet and is reported neutral.
fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    (0..closes.len())
        .map(|i| {
            if i == 0 {
                return RSI_NEUTRAL;
            }
            // Last `period` one-step differences ending at row i.
            let start = (i + 1).saturating_sub(period).max(1);
            let mut gain_sum = 0.0;
            let mut loss_sum = 0.0;
            let mut count = 0.0;
            for k in start..=i {
                let diff = closes[k] - closes[k - 1];
                gain_sum += diff.max(0.0);
                loss_sum += (-diff).max(0.0);
                count += 1.0;
            }
            let gain_avg = gain_sum / count;
            let loss_avg = loss_sum / count;
            if loss_avg == 0.0 {
                return 100.0;
            }
            let rs = gain_avg / loss_avg;
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// Choppiness index: 100 * log10(sum of true range / overall range) /
/// log10(bars), bounded to [0, 100]. Higher values mean a ranging market.
fn choppiness(series: &CandleSeries, period: usize) -> Vec<f64> {
    let candles = series.candles();
    (0..candles.len())
        .map(|i| {
            // True range needs a previous close, so bars start at row 1.
            let bars = i.min(period);
            if bars < 2 {
                return CHOP_NEUTRAL;
            }
            let lo = i + 1 - bars;

            let mut tr_sum = 0.0;
            let mut max_high = f64::MIN;
            let mut min_low = f64::MAX;
            for k in lo..=i {
                let bar = &candles[k];
                let prev_close = candles[k - 1].close;
                let tr = (bar.high - bar.low)
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs());
                tr_sum += tr;
                max_high = max_high.max(bar.high);
                min_low = min_low.min(bar.low);
            }

            let range = max_high - min_low;
            if !(range > 0.0) || !(tr_sum > 0.0) {
                return CHOP_NEUTRAL;
            }
            let raw = 100.0 * (tr_sum / range).log10() / (bars as f64).log10();
            raw.clamp(0.0, 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::Candle;

    fn series_from_closes(closes: &[f64]) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle {
                    timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                    open,
                    high: open.max(close),
                    low: open.min(close),
                    close,
                    volume: 1.0,
                }
            })
            .collect();
        CandleSeries::from_rows(candles)
    }

    #[test]
    fn columns_match_series_length() {
        let series = series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let set = IndicatorSet::compute(&series);
        assert_eq!(set.len(), 5);
        assert_eq!(set.rsi14.len(), 5);
        assert_eq!(set.choppiness.len(), 5);
        assert_eq!(set.bb_upper.len(), 5);
    }

    #[test]
    fn shrinking_window_sma_equals_plain_mean() {
        let values = [2.0, 4.0, 6.0, 8.0];
        let sma = rolling_mean(&values, 10);
        assert_eq!(sma[0], 2.0);
        assert_eq!(sma[1], 3.0);
        assert_eq!(sma[3], 5.0);
    }

    #[test]
    fn full_window_sma_drops_old_rows() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let sma = rolling_mean(&values, 2);
        assert_eq!(sma[2], 2.5);
        assert_eq!(sma[3], 3.5);
    }

    #[test]
    fn rsi_is_exactly_100_with_zero_losses() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let values = rsi(&closes, RSI_PERIOD);
        assert_eq!(*values.last().unwrap(), 100.0);
    }

    #[test]
    fn rsi_balances_symmetric_moves() {
        // Alternating +1/-1 diffs: equal average gain and loss -> RSI 50.
        let mut closes = vec![100.0];
        for i in 0..28 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let values = rsi(&closes, RSI_PERIOD);
        assert!((values.last().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_neutral_on_first_row() {
        let values = rsi(&[42.0], RSI_PERIOD);
        assert_eq!(values, vec![50.0]);
    }

    #[test]
    fn bollinger_bands_collapse_on_flat_series() {
        let series = series_from_closes(&[5.0; 25]);
        let set = IndicatorSet::compute(&series);
        let row = set.latest().unwrap();
        assert_eq!(row.bb_upper, 5.0);
        assert_eq!(row.bb_lower, 5.0);
        assert_eq!(row.sma20, 5.0);
    }

    #[test]
    fn choppiness_stays_in_bounds() {
        let mut closes = Vec::new();
        for i in 0..60 {
            // Oscillating series: strongly range-bound.
            closes.push(100.0 + if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        let series = series_from_closes(&closes);
        let set = IndicatorSet::compute(&series);
        for value in &set.choppiness {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
        // A tight oscillation covers the same range many times over.
        assert!(*set.choppiness.last().unwrap() > 50.0);
    }

    #[test]
    fn choppiness_low_for_steady_trend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let series = series_from_closes(&closes);
        let set = IndicatorSet::compute(&series);
        // A straight advance never retraces: true range sums to the total
        // range, so the index sits at the trending floor.
        assert!(*set.choppiness.last().unwrap() < 10.0);
    }

    #[test]
    fn choppiness_neutral_on_flat_series() {
        let series = series_from_closes(&[7.0; 20]);
        let set = IndicatorSet::compute(&series);
        assert_eq!(*set.choppiness.last().unwrap(), CHOP_NEUTRAL);
    }

    #[test]
    fn latest_returns_none_for_empty_series() {
        let set = IndicatorSet::compute(&CandleSeries::new());
        assert!(set.latest().is_none());
        assert!(set.is_empty());
    }
}
