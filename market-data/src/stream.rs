//! Live mid-price stream over the venue websocket.
//!
//! One background task writes the latest observed price into a
//! `tokio::sync::watch` channel; any number of readers take snapshots from
//! it. A stale read only delays reaction by one evaluation cycle, so no
//! further synchronization is needed on the read side.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

pub const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";
pub const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";

/// Latest observed mid price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceUpdate {
    pub price: f64,
    pub received_at: DateTime<Utc>,
}

/// Read side of the price snapshot.
pub type PriceReceiver = watch::Receiver<Option<PriceUpdate>>;

/// Websocket subscriber for one coin's mid price.
pub struct PriceStream {
    ws_url: String,
    coin: String,
    reconnect_delay_secs: u64,
}

impl PriceStream {
    pub fn new(ws_url: impl Into<String>, coin: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            coin: coin.into(),
            reconnect_delay_secs: 5,
        }
    }

    pub fn mainnet(coin: impl Into<String>) -> Self {
        Self::new(MAINNET_WS_URL, coin)
    }

    pub fn testnet(coin: impl Into<String>) -> Self {
        Self::new(TESTNET_WS_URL, coin)
    }

    /// Spawn the stream task and hand back the snapshot reader.
    pub fn spawn(self) -> PriceReceiver {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move { self.run(tx).await });
        rx
    }

    async fn run(self, tx: watch::Sender<Option<PriceUpdate>>) {
        // Reconnection loop; gives up only once every reader is gone.
        loop {
            match self.connect_and_stream(&tx).await {
                Ok(()) => info!("price stream closed normally"),
                Err(e) => error!(error = %e, "price stream failed"),
            }
            if tx.is_closed() {
                debug!("no price readers left, stopping stream");
                return;
            }
            info!(delay = self.reconnect_delay_secs, "reconnecting price stream");
            sleep(Duration::from_secs(self.reconnect_delay_secs)).await;
        }
    }

    async fn connect_and_stream(&self, tx: &watch::Sender<Option<PriceUpdate>>) -> Result<()> {
        info!(url = %self.ws_url, "connecting to venue websocket");
        let (ws_stream, _) = tokio_tungstenite::connect_async(&self.ws_url)
            .await
            .context("websocket connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe = json!({
            "method": "subscribe",
            "subscription": {"type": "allMids"},
        });
        write
            .send(Message::Text(subscribe.to_string()))
            .await
            .context("subscribe failed")?;
        info!(coin = %self.coin, "subscribed to mid prices");

        while let Some(message) = read.next().await {
            match message.context("websocket read failed")? {
                Message::Text(text) => {
                    if let Some(price) = extract_mid(&text, &self.coin) {
                        tx.send_replace(Some(PriceUpdate {
                            price,
                            received_at: Utc::now(),
                        }));
                    }
                }
                Message::Ping(payload) => {
                    write
                        .send(Message::Pong(payload))
                        .await
                        .context("pong failed")?;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }
}

/// Pull one coin's mid out of an `allMids` channel message, if that is
/// what the payload is.
fn extract_mid(text: &str, coin: &str) -> Option<f64> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if value.get("channel")?.as_str()? != "allMids" {
        return None;
    }
    value
        .get("data")?
        .get("mids")?
        .get(coin)?
        .as_str()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_subscribed_coin_mid() {
        let payload = r#"{"channel":"allMids","data":{"mids":{"BTC":"60123.5","ETH":"2987.1"}}}"#;
        assert_eq!(extract_mid(payload, "BTC"), Some(60123.5));
        assert_eq!(extract_mid(payload, "ETH"), Some(2987.1));
    }

    #[test]
    fn ignores_other_channels_and_noise() {
        assert_eq!(
            extract_mid(r#"{"channel":"subscriptionResponse","data":{}}"#, "BTC"),
            None
        );
        assert_eq!(extract_mid("not json", "BTC"), None);
        let payload = r#"{"channel":"allMids","data":{"mids":{"ETH":"2987.1"}}}"#;
        assert_eq!(extract_mid(payload, "BTC"), None);
    }

    #[tokio::test]
    async fn watch_channel_exposes_latest_snapshot() {
        let (tx, rx) = watch::channel(None);
        tx.send_replace(Some(PriceUpdate {
            price: 100.0,
            received_at: Utc::now(),
        }));
        tx.send_replace(Some(PriceUpdate {
            price: 101.5,
            received_at: Utc::now(),
        }));
        let snapshot = *rx.borrow();
        assert_eq!(snapshot.map(|u| u.price), Some(101.5));
    }
}
