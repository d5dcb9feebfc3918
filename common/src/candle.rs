use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Time-ordered candle sequence.
///
/// Invariant: strictly increasing timestamps. The invariant holds by
/// construction: [`CandleSeries::from_rows`] sorts venue rows and drops
/// duplicate timestamps, and [`CandleSeries::push`] rejects out-of-order
/// bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from venue rows in arbitrary order.
    ///
    /// Rows are sorted by timestamp; for duplicate timestamps the first
    /// row wins and the rest are dropped.
    pub fn from_rows(mut rows: Vec<Candle>) -> Self {
        rows.sort_by_key(|c| c.timestamp);
        let before = rows.len();
        rows.dedup_by_key(|c| c.timestamp);
        if rows.len() < before {
            debug!(dropped = before - rows.len(), "dropped duplicate candle timestamps");
        }
        Self { candles: rows }
    }

    /// Append a bar; fails if its timestamp does not advance the series.
    pub fn push(&mut self, candle: Candle) -> Result<()> {
        if let Some(last) = self.candles.last() {
            if candle.timestamp <= last.timestamp {
                bail!(
                    "candle timestamp {} does not advance past {}",
                    candle.timestamp,
                    last.timestamp
                );
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
