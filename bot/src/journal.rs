//! Append-only JSONL journal of placed orders.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use common::{OrderSide, Signal};
use execution::{OrderReceipt, OrderRequest};

#[derive(Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub coin: String,
    pub signal: Signal,
    pub side: OrderSide,
    pub size: f64,
    pub price: Option<f64>,
    pub order_id: Option<u64>,
    pub client_id: String,
}

/// One JSON object per line, flushed per order.
pub struct TradeJournal {
    path: PathBuf,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record one placed order. Journal failures are logged, never fatal:
    /// bookkeeping must not stop the trading loop.
    pub fn record(&self, signal: Signal, order: &OrderRequest, receipt: &OrderReceipt) {
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            coin: order.coin.clone(),
            signal,
            side: order.side,
            size: order.size,
            price: order.limit_price,
            order_id: receipt.order_id,
            client_id: receipt.client_id.clone(),
        };
        if let Err(e) = self.append(&entry) {
            warn!(error = %e, path = %self.path.display(), "trade journal write failed");
        }
    }

    fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open journal {}", self.path.display()))?;
        let mut line = serde_json::to_string(entry).context("serialize journal entry")?;
        line.push('\n');
        file.write_all(line.as_bytes()).context("append journal entry")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("journal-{}.jsonl", Uuid::new_v4()))
    }

    fn sample_order() -> (OrderRequest, OrderReceipt) {
        (
            OrderRequest {
                coin: "BTC".to_string(),
                side: OrderSide::Buy,
                size: 0.003,
                limit_price: Some(60600.0),
            },
            OrderReceipt {
                order_id: Some(42),
                client_id: "0xabc".to_string(),
                status: "resting".to_string(),
            },
        )
    }

    #[test]
    fn records_round_trip_as_jsonl() {
        let path = temp_path();
        let journal = TradeJournal::new(&path);
        let (order, receipt) = sample_order();

        journal.record(Signal::GridBuy, &order, &receipt);
        journal.record(Signal::GridBuy, &order, &receipt);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: JournalEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry.coin, "BTC");
        assert_eq!(entry.signal, Signal::GridBuy);
        assert_eq!(entry.order_id, Some(42));
        assert_eq!(entry.price, Some(60600.0));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn journal_failure_does_not_panic() {
        let journal = TradeJournal::new("/nonexistent-dir/journal.jsonl");
        let (order, receipt) = sample_order();
        journal.record(Signal::Buy, &order, &receipt);
    }
}
