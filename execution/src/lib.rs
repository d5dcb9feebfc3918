//! Execution (Layer 3)
//!
//! Write side of the venue: wallet-signed order placement and cancels,
//! plus grid-ladder planning for GRID_* signals.

pub mod client;
pub mod error;
pub mod grid;

pub use client::{ExchangeClient, OrderReceipt, OrderRequest};
pub use error::ExecutionError;
pub use grid::{plan_grid, plan_grid_with, GRID_LEVELS, GRID_STEP};
