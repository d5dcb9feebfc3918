//! Short-horizon predictive overlay.
//!
//! The overlay fits nothing at runtime: the reference model is a tiny
//! recurrent unit with randomly initialized parameters, kept behind the
//! narrow [`PricePredictor`] interface so any comparable short-horizon
//! regressor can be substituted. The overlay only ever *reinforces* the
//! base rule; see [`crate::pipeline::SignalPipeline`] for the combination
//! policy.

use common::Signal;
use statrs::statistics::Statistics;
use tracing::debug;

/// Next-step scoring function over a normalized close-price window.
pub trait PricePredictor: Send + Sync {
    /// Predict the next normalized value following `window`.
    fn predict_next(&self, window: &[f64]) -> f64;
}

/// Overlay parameters.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Minimum close-price history before the overlay produces anything.
    pub min_history: usize,
    /// Number of trailing points fed to the model.
    pub window: usize,
    /// Relative threshold around the last close; predictions inside the
    /// band are treated as noise and map to HOLD.
    pub threshold: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_history: 100,
            window: 10,
            threshold: 0.001,
        }
    }
}

/// Directional overlay around a pluggable price predictor.
pub struct PredictiveOverlay {
    config: OverlayConfig,
    model: Box<dyn PricePredictor>,
}

impl PredictiveOverlay {
    pub fn new(model: Box<dyn PricePredictor>) -> Self {
        Self::with_config(OverlayConfig::default(), model)
    }

    pub fn with_config(config: OverlayConfig, model: Box<dyn PricePredictor>) -> Self {
        Self { config, model }
    }

    /// Directional signal from the close-price history, or `None` when the
    /// history is too short or the numbers degenerate.
    ///
    /// The history is split chronologically: the leading 80% supplies the
    /// normalization statistics, the model only ever sees the trailing
    /// window of the evaluation segment. Nothing from the future leaks
    /// into the fit side.
    pub fn signal(&self, closes: &[f64]) -> Option<Signal> {
        if closes.len() < self.config.min_history {
            debug!(
                have = closes.len(),
                need = self.config.min_history,
                "history too short for predictive overlay"
            );
            return None;
        }

        let fit_len = closes.len() * 4 / 5;
        let fit = &closes[..fit_len];
        let eval = &closes[fit_len..];
        if eval.len() < self.config.window {
            return None;
        }

        let mean = fit.iter().mean();
        let std = fit.iter().std_dev();
        if !std.is_finite() || std <= 0.0 || !mean.is_finite() {
            debug!("degenerate fit segment, overlay skipped");
            return None;
        }

        let window: Vec<f64> = eval[eval.len() - self.config.window..]
            .iter()
            .map(|x| (x - mean) / std)
            .collect();
        let predicted = self.model.predict_next(&window) * std + mean;

        let last = *closes.last()?;
        if !predicted.is_finite() || !(last > 0.0) {
            debug!(predicted, last, "non-finite prediction, overlay skipped");
            return None;
        }

        let relative = (predicted - last) / last;
        debug!(predicted, last, relative, "predictive overlay output");
        Some(if relative > self.config.threshold {
            Signal::Buy
        } else if relative < -self.config.threshold {
            Signal::Sell
        } else {
            Signal::Hold
        })
    }
}

const HIDDEN_UNITS: usize = 8;

/// Minimal Elman-style recurrent unit with unfit, randomly initialized
/// parameters. Carries no learned state across runs; a fixed seed makes
/// the instance deterministic.
pub struct RecurrentPredictor {
    w_in: Vec<f64>,
    w_rec: Vec<Vec<f64>>,
    bias: Vec<f64>,
    w_out: Vec<f64>,
    b_out: f64,
}

impl RecurrentPredictor {
    pub fn new() -> Self {
        Self::seeded(fastrand::u64(..))
    }

    pub fn seeded(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut weight = move || rng.f64() * 0.2 - 0.1;

        Self {
            w_in: (0..HIDDEN_UNITS).map(|_| weight()).collect(),
            w_rec: (0..HIDDEN_UNITS)
                .map(|_| (0..HIDDEN_UNITS).map(|_| weight()).collect())
                .collect(),
            bias: (0..HIDDEN_UNITS).map(|_| weight()).collect(),
            w_out: (0..HIDDEN_UNITS).map(|_| weight()).collect(),
            b_out: weight(),
        }
    }
}

impl Default for RecurrentPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl PricePredictor for RecurrentPredictor {
    fn predict_next(&self, window: &[f64]) -> f64 {
        let mut hidden = vec![0.0; HIDDEN_UNITS];
        for &x in window {
            let mut next = vec![0.0; HIDDEN_UNITS];
            for (i, cell) in next.iter_mut().enumerate() {
                let mut acc = self.bias[i] + self.w_in[i] * x;
                for (j, h) in hidden.iter().enumerate() {
                    acc += self.w_rec[i][j] * h;
                }
                *cell = acc.tanh();
            }
            hidden = next;
        }

        self.w_out
            .iter()
            .zip(&hidden)
            .map(|(w, h)| w * h)
            .sum::<f64>()
            + self.b_out
    }
}
