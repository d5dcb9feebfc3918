//! Telegram notification channel.
//!
//! Human-readable messages only; the text format is free-form, not a wire
//! contract. Delivery failures are the caller's to log and move past.

use anyhow::{Context, Result};
use tracing::debug;

use common::Signal;

/// Telegram Bot API client for one chat.
pub struct TelegramNotifier {
    http: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        self.http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
            }))
            .send()
            .await
            .context("telegram request failed")?
            .error_for_status()
            .context("telegram rejected message")?;
        debug!("notification delivered");
        Ok(())
    }
}

/// Alert text for a placed entry order.
pub fn format_signal_alert(signal: Signal, coin: &str, size: f64, price: f64) -> String {
    let tag = if signal.is_buy_side() {
        "🟢"
    } else if signal.is_sell_side() {
        "🔴"
    } else {
        "ℹ️"
    };
    format!("{tag} {signal} {size} {coin} @ {price}")
}

/// Alert text for one placed grid level.
pub fn format_grid_alert(
    signal: Signal,
    coin: &str,
    level: usize,
    levels: usize,
    size: f64,
    price: f64,
) -> String {
    format!("🪜 {signal} level {level}/{levels}: {size} {coin} @ {price}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_alert_embeds_signal_and_price() {
        let text = format_signal_alert(Signal::StrongBuy, "BTC", 0.008, 60123.5);
        assert!(text.contains("STRONG_BUY"));
        assert!(text.contains("BTC"));
        assert!(text.contains("60123.5"));
        assert!(text.starts_with("🟢"));
    }

    #[test]
    fn sell_alert_uses_red_tag() {
        let text = format_signal_alert(Signal::Sell, "BTC", 0.008, 59000.0);
        assert!(text.starts_with("🔴"));
        assert!(text.contains("SELL"));
    }

    #[test]
    fn grid_alert_embeds_level() {
        let text = format_grid_alert(Signal::GridBuy, "BTC", 2, 3, 0.003, 60600.0);
        assert!(text.contains("GRID_BUY"));
        assert!(text.contains("2/3"));
        assert!(text.contains("60600"));
    }
}
