// Signal Generation Framework (Layer 2)
// Turns a candle series plus external features into one categorical signal

pub mod indicators;
pub mod pipeline;
pub mod predictor;

pub use indicators::{IndicatorRow, IndicatorSet};
pub use pipeline::{PipelineConfig, SignalPipeline};
pub use predictor::{OverlayConfig, PredictiveOverlay, PricePredictor, RecurrentPredictor};

// Re-export common types for convenience
pub use common::{Candle, CandleSeries, ExternalFeatures, Signal};
