//! Shared data model for the trading agent
//!
//! Types crossing crate boundaries live here: candles and candle series,
//! the categorical trade signal, per-evaluation external features, and the
//! account-state types returned by the venue.

pub mod account;
pub mod candle;
pub mod signal;

pub use account::{AccountBalance, OrderSide, Position};
pub use candle::{Candle, CandleSeries};
pub use signal::{ExternalFeatures, Signal};
