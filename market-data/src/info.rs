//! Hyperliquid info-endpoint client.
//!
//! Every query is a POST to `{base}/info` with a `type` discriminator.
//! Prices arrive as decimal strings and timestamps as epoch milliseconds.

use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use common::{AccountBalance, Candle, CandleSeries, OrderSide, Position};

pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

/// Read-only venue client.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: reqwest::Client,
    base_url: String,
}

/// Candle row as the venue serializes it.
#[derive(Debug, Deserialize)]
struct WireCandle {
    #[serde(rename = "t")]
    open_time_ms: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
}

impl WireCandle {
    fn into_candle(self) -> Result<Candle> {
        let timestamp = Utc
            .timestamp_millis_opt(self.open_time_ms)
            .single()
            .ok_or_else(|| anyhow!("candle timestamp {} out of range", self.open_time_ms))?;
        Ok(Candle {
            timestamp,
            open: parse_price(&self.open, "open")?,
            high: parse_price(&self.high, "high")?,
            low: parse_price(&self.low, "low")?,
            close: parse_price(&self.close, "close")?,
            volume: parse_price(&self.volume, "volume")?,
        })
    }
}

fn parse_price(raw: &str, field: &str) -> Result<f64> {
    raw.parse()
        .with_context(|| format!("unparseable {field} value {raw:?}"))
}

#[derive(Debug, Deserialize)]
struct ClearinghouseState {
    #[serde(rename = "marginSummary")]
    margin_summary: MarginSummary,
    withdrawable: String,
    #[serde(rename = "assetPositions", default)]
    asset_positions: Vec<AssetPosition>,
}

#[derive(Debug, Deserialize)]
struct MarginSummary {
    #[serde(rename = "totalMarginUsed")]
    total_margin_used: String,
}

#[derive(Debug, Deserialize)]
struct AssetPosition {
    position: WirePosition,
}

#[derive(Debug, Deserialize)]
struct WirePosition {
    coin: String,
    /// Signed size: positive long, negative short.
    szi: String,
    #[serde(rename = "entryPx", default)]
    entry_px: Option<String>,
}

impl InfoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(MAINNET_API_URL)
    }

    pub fn testnet() -> Self {
        Self::new(TESTNET_API_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, body: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(&body)
            .send()
            .await
            .context("info request failed")?
            .error_for_status()
            .context("info request rejected")?;
        response.json().await.context("malformed info response")
    }

    /// Historical OHLCV snapshot for `[start_ms, end_ms]`.
    ///
    /// Rows are sorted and deduplicated into the series; a venue failure
    /// surfaces as an error and the caller treats it as insufficient data.
    pub async fn candles(
        &self,
        coin: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<CandleSeries> {
        let body = json!({
            "type": "candleSnapshot",
            "req": {
                "coin": coin,
                "interval": interval,
                "startTime": start_ms,
                "endTime": end_ms,
            },
        });
        let rows: Vec<WireCandle> =
            serde_json::from_value(self.post(body).await?).context("malformed candle snapshot")?;
        let candles = rows
            .into_iter()
            .map(WireCandle::into_candle)
            .collect::<Result<Vec<_>>>()?;
        let series = CandleSeries::from_rows(candles);
        info!(coin, interval, rows = series.len(), "fetched candle snapshot");
        Ok(series)
    }

    /// Current mid price for one coin.
    pub async fn mid_price(&self, coin: &str) -> Result<f64> {
        let mids: std::collections::HashMap<String, String> =
            serde_json::from_value(self.post(json!({"type": "allMids"})).await?)
                .context("malformed allMids response")?;
        let raw = mids
            .get(coin)
            .ok_or_else(|| anyhow!("no mid price for {coin}"))?;
        parse_price(raw, "mid")
    }

    /// Latest funding rate for one coin from the perp asset contexts.
    pub async fn funding_rate(&self, coin: &str) -> Result<f64> {
        let response = self.post(json!({"type": "metaAndAssetCtxs"})).await?;
        let universe = response
            .get(0)
            .and_then(|meta| meta.get("universe"))
            .and_then(|u| u.as_array())
            .ok_or_else(|| anyhow!("missing universe in metaAndAssetCtxs"))?;
        let index = universe
            .iter()
            .position(|asset| asset.get("name").and_then(|n| n.as_str()) == Some(coin))
            .ok_or_else(|| anyhow!("{coin} not in perp universe"))?;
        let funding = response
            .get(1)
            .and_then(|ctxs| ctxs.get(index))
            .and_then(|ctx| ctx.get("funding"))
            .and_then(|f| f.as_str())
            .ok_or_else(|| anyhow!("missing funding context for {coin}"))?;
        let rate = parse_price(funding, "funding")?;
        debug!(coin, rate, "fetched funding rate");
        Ok(rate)
    }

    /// Position of `coin` in the perp universe; order actions address
    /// assets by this index.
    pub async fn asset_index(&self, coin: &str) -> Result<u32> {
        let response = self.post(json!({"type": "meta"})).await?;
        let universe = response
            .get("universe")
            .and_then(|u| u.as_array())
            .ok_or_else(|| anyhow!("missing universe in meta"))?;
        universe
            .iter()
            .position(|asset| asset.get("name").and_then(|n| n.as_str()) == Some(coin))
            .map(|index| index as u32)
            .ok_or_else(|| anyhow!("{coin} not in perp universe"))
    }

    async fn clearinghouse_state(&self, address: &str) -> Result<ClearinghouseState> {
        let body = json!({"type": "clearinghouseState", "user": address});
        serde_json::from_value(self.post(body).await?).context("malformed clearinghouse state")
    }

    /// Margin summary for the account.
    pub async fn account_balance(&self, address: &str) -> Result<AccountBalance> {
        let state = self.clearinghouse_state(address).await?;
        Ok(AccountBalance {
            margin_used: parse_price(&state.margin_summary.total_margin_used, "margin_used")?,
            withdrawable: parse_price(&state.withdrawable, "withdrawable")?,
        })
    }

    /// Open positions for the account; flat entries are skipped.
    pub async fn positions(&self, address: &str) -> Result<Vec<Position>> {
        let state = self.clearinghouse_state(address).await?;
        let mut positions = Vec::new();
        for entry in state.asset_positions {
            let wire = entry.position;
            let signed_size = parse_price(&wire.szi, "szi")?;
            if signed_size == 0.0 {
                continue;
            }
            let entry_price = match &wire.entry_px {
                Some(raw) => parse_price(raw, "entryPx")?,
                None => 0.0,
            };
            positions.push(Position {
                coin: wire.coin,
                size: signed_size.abs(),
                entry_price,
                side: if signed_size > 0.0 {
                    OrderSide::Buy
                } else {
                    OrderSide::Sell
                },
            });
        }
        debug!(address, open = positions.len(), "fetched positions");
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_candle_parses_string_prices() {
        let raw = json!({
            "t": 1700000000000_i64,
            "T": 1700003599999_i64,
            "s": "BTC",
            "i": "1h",
            "o": "37012.0",
            "h": "37318.5",
            "l": "36988.0",
            "c": "37250.5",
            "v": "1234.567",
            "n": 4321
        });
        let wire: WireCandle = serde_json::from_value(raw).unwrap();
        let candle = wire.into_candle().unwrap();
        assert_eq!(candle.close, 37250.5);
        assert_eq!(candle.volume, 1234.567);
        assert_eq!(candle.timestamp.timestamp_millis(), 1700000000000);
    }

    #[test]
    fn wire_candle_rejects_garbage_prices() {
        let raw = json!({
            "t": 1700000000000_i64,
            "o": "x", "h": "1", "l": "1", "c": "1", "v": "1"
        });
        let wire: WireCandle = serde_json::from_value(raw).unwrap();
        assert!(wire.into_candle().is_err());
    }

    #[test]
    fn clearinghouse_state_parses_positions() {
        let raw = json!({
            "marginSummary": {
                "accountValue": "1250.0",
                "totalMarginUsed": "210.5"
            },
            "withdrawable": "1039.5",
            "assetPositions": [
                {
                    "type": "oneWay",
                    "position": {
                        "coin": "BTC",
                        "szi": "-0.01",
                        "entryPx": "37000.0"
                    }
                }
            ]
        });
        let state: ClearinghouseState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.asset_positions.len(), 1);
        let wire = &state.asset_positions[0].position;
        assert_eq!(wire.coin, "BTC");
        assert_eq!(wire.szi, "-0.01");
        assert_eq!(state.margin_summary.total_margin_used, "210.5");
    }
}
