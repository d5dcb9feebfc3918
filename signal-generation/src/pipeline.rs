// Signal Pipeline
// indicators -> base rule -> predictive reinforcement -> regime/funding overlay

use common::{CandleSeries, ExternalFeatures, Signal};
use tracing::{debug, info, warn};

use crate::indicators::{IndicatorRow, IndicatorSet, SMA_SLOW};
use crate::predictor::{PredictiveOverlay, PricePredictor};

const RSI_BUY_CEILING: f64 = 70.0;
const RSI_SELL_FLOOR: f64 = 30.0;

/// Configuration for the signal pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum rows before anything other than HOLD can be produced;
    /// defaults to the slow SMA window.
    pub min_rows: usize,
    /// Force the grid overlay on regardless of the choppiness reading.
    pub grid_mode: bool,
    /// Choppiness above this value marks the market as ranging.
    pub chop_threshold: f64,
    /// Minimum relative |close - SMA50| deviation before grid tagging.
    pub grid_deviation: f64,
    /// Absolute sentiment score needed to escalate BUY/SELL to STRONG_*.
    pub sentiment_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_rows: SMA_SLOW,
            grid_mode: false,
            chop_threshold: 50.0,
            grid_deviation: 0.02,
            sentiment_threshold: 0.3,
        }
    }
}

/// Signal generation pipeline.
///
/// Stateless across evaluations: every call recomputes indicators from the
/// snapshot it is handed and returns exactly one [`Signal`]. By contract it
/// never fails; an internal numeric fault neutralizes the stage it
/// occurred in, not the evaluation.
pub struct SignalPipeline {
    config: PipelineConfig,
    overlay: Option<PredictiveOverlay>,
}

impl SignalPipeline {
    /// Create a new signal pipeline without a predictive overlay
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            overlay: None,
        }
    }

    /// Attach a predictive model behind the default overlay settings
    pub fn with_predictor(self, model: Box<dyn PricePredictor>) -> Self {
        self.with_overlay(PredictiveOverlay::new(model))
    }

    /// Attach a fully configured predictive overlay
    pub fn with_overlay(mut self, overlay: PredictiveOverlay) -> Self {
        info!("predictive overlay attached");
        self.overlay = Some(overlay);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Evaluate one candle snapshot plus external features into a signal.
    pub fn evaluate(&self, series: &CandleSeries, features: &ExternalFeatures) -> Signal {
        if series.len() < self.config.min_rows {
            debug!(
                rows = series.len(),
                min = self.config.min_rows,
                "insufficient history, holding"
            );
            return Signal::Hold;
        }
        let Some(last) = series.last() else {
            return Signal::Hold;
        };

        let indicators = IndicatorSet::compute(series);
        let Some(row) = indicators.latest() else {
            return Signal::Hold;
        };

        let base = self.base_signal(&row);
        let reinforced = self.reinforce(base, series);
        let escalated = self.escalate_sentiment(reinforced, features.sentiment);
        let regime = self.apply_grid(escalated, &row, last.close);
        let signal = self.apply_funding_veto(regime, features.funding_rate);

        info!(
            %signal,
            close = last.close,
            sma10 = row.sma10,
            sma50 = row.sma50,
            rsi = row.rsi14,
            choppiness = row.choppiness,
            "evaluation complete"
        );
        signal
    }

    /// SMA crossover gated by RSI; ties resolve to HOLD.
    fn base_signal(&self, row: &IndicatorRow) -> Signal {
        if !row.sma10.is_finite() || !row.sma50.is_finite() || !row.rsi14.is_finite() {
            warn!("non-finite indicator row, holding");
            return Signal::Hold;
        }

        if row.sma10 > row.sma50 && row.rsi14 < RSI_BUY_CEILING {
            debug!("base signal BUY: SMA10 > SMA50 and RSI < 70");
            Signal::Buy
        } else if row.sma10 < row.sma50 && row.rsi14 > RSI_SELL_FLOOR {
            debug!("base signal SELL: SMA10 < SMA50 and RSI > 30");
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    /// Reinforcement-only combination: the predictive signal is adopted
    /// only when it agrees with the base signal, so disagreement can never
    /// flip the decision.
    fn reinforce(&self, base: Signal, series: &CandleSeries) -> Signal {
        let Some(overlay) = &self.overlay else {
            return base;
        };
        match overlay.signal(&series.closes()) {
            Some(predicted) if predicted == base => {
                debug!(?predicted, "predictor agrees, reinforcing");
                predicted
            }
            Some(predicted) => {
                debug!(?predicted, ?base, "predictor disagrees, base signal stands");
                base
            }
            None => base,
        }
    }

    /// Escalate BUY/SELL to STRONG_* when sentiment points the same way.
    /// Opposite-direction or weak sentiment changes nothing.
    fn escalate_sentiment(&self, signal: Signal, sentiment: f64) -> Signal {
        let threshold = self.config.sentiment_threshold;
        match signal {
            Signal::Buy if sentiment > threshold => {
                info!(sentiment, "bullish sentiment, escalating to STRONG_BUY");
                Signal::StrongBuy
            }
            Signal::Sell if sentiment < -threshold => {
                info!(sentiment, "bearish sentiment, escalating to STRONG_SELL");
                Signal::StrongSell
            }
            other => other,
        }
    }

    /// Tag plain BUY/SELL for grid execution in a ranging regime.
    ///
    /// HOLD stays untagged (GRID_HOLD is never produced) and STRONG_*
    /// signals pass through unchanged; the label set has no grid variant
    /// for them.
    fn apply_grid(&self, signal: Signal, row: &IndicatorRow, close: f64) -> Signal {
        let ranging = self.config.grid_mode
            || (row.choppiness.is_finite() && row.choppiness > self.config.chop_threshold);
        if !ranging {
            return signal;
        }
        if !row.sma50.is_finite() || row.sma50 == 0.0 {
            warn!("unusable SMA50, grid overlay skipped");
            return signal;
        }
        let deviation = ((close - row.sma50) / row.sma50).abs();
        if !(deviation > self.config.grid_deviation) {
            return signal;
        }

        match signal {
            Signal::Buy => {
                info!(deviation, "ranging regime, tagging GRID_BUY");
                Signal::GridBuy
            }
            Signal::Sell => {
                info!(deviation, "ranging regime, tagging GRID_SELL");
                Signal::GridSell
            }
            other => other,
        }
    }

    /// Negative funding vetoes exactly BUY. The veto is narrow: STRONG_BUY
    /// and GRID_BUY are out of its scope.
    fn apply_funding_veto(&self, signal: Signal, funding_rate: f64) -> Signal {
        if funding_rate < 0.0 && signal == Signal::Buy {
            info!(funding_rate, "negative funding, vetoing long entry");
            return Signal::Hold;
        }
        signal
    }
}
