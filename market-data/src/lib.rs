//! Market Data (Layer 0)
//!
//! Read side of the venue: candle snapshots, mid prices, funding and
//! account state over the Hyperliquid info endpoint, plus a websocket
//! price stream that publishes the latest observed mid into a watch
//! channel.

pub mod info;
pub mod stream;

pub use info::{InfoClient, MAINNET_API_URL, TESTNET_API_URL};
pub use stream::{PriceReceiver, PriceStream, PriceUpdate, MAINNET_WS_URL, TESTNET_WS_URL};
