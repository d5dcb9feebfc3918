use thiserror::Error;

/// Errors surfaced by the write-side venue client.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("venue request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("unknown asset {0}")]
    UnknownAsset(String),

    #[error("market data unavailable: {0}")]
    MarketData(String),

    #[error("signing failed: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("malformed venue payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid order: {0}")]
    InvalidOrder(String),
}
