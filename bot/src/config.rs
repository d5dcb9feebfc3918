//! Runtime configuration.
//!
//! Defaults live in code; an optional `bot.toml` next to the binary and
//! `BOT_*` environment variables override them. Secrets (wallet key,
//! account address, Telegram and Twitter credentials) are expected from
//! the environment only.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::Deserialize;
use signal_generation::PipelineConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Coin to trade.
    pub coin: String,
    /// Candle interval, venue notation ("1m", "1h", ...).
    pub interval: String,
    /// Candle history fetched per evaluation cycle.
    pub lookback_hours: i64,
    /// Seconds between evaluation cycles.
    pub poll_interval_secs: u64,
    /// Total position size per entry, in coin units.
    pub position_size: f64,
    /// Force grid execution regardless of regime detection.
    pub grid_mode: bool,
    /// Trade against the venue testnet.
    pub testnet: bool,
    /// Attach the predictive overlay.
    pub predictor_enabled: bool,
    /// Fixed seed for the predictive model; random when unset.
    pub predictor_seed: Option<u64>,
    /// Choppiness level above which the market counts as ranging.
    pub chop_threshold: f64,
    /// Relative |close - SMA50| deviation required for grid tagging.
    pub grid_deviation: f64,
    /// Absolute sentiment needed to escalate to STRONG_* signals.
    pub sentiment_threshold: f64,
    /// JSONL trade journal path.
    pub journal_path: String,

    // Secrets, environment-only in practice.
    pub private_key: Option<String>,
    pub account_address: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub twitter_bearer_token: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            coin: "BTC".to_string(),
            interval: "1h".to_string(),
            lookback_hours: 72,
            poll_interval_secs: 300,
            position_size: 0.008,
            grid_mode: false,
            testnet: true,
            predictor_enabled: true,
            predictor_seed: None,
            chop_threshold: 50.0,
            grid_deviation: 0.02,
            sentiment_threshold: 0.3,
            journal_path: "trades.jsonl".to_string(),
            private_key: None,
            account_address: None,
            telegram_token: None,
            telegram_chat_id: None,
            twitter_bearer_token: None,
        }
    }
}

impl BotConfig {
    /// Layered load: defaults <- optional `bot.toml` <- `BOT_*` env vars.
    pub fn load() -> Result<Self> {
        let source = Config::builder()
            .add_source(File::with_name("bot").required(false))
            .add_source(Environment::with_prefix("BOT").try_parsing(true))
            .build()
            .context("configuration sources failed to load")?;
        source
            .try_deserialize()
            .context("invalid configuration values")
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            grid_mode: self.grid_mode,
            chop_threshold: self.chop_threshold,
            grid_deviation: self.grid_deviation,
            sentiment_threshold: self.sentiment_threshold,
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.coin, "BTC");
        assert!(cfg.testnet);
        assert!(!cfg.grid_mode);
        assert!(cfg.private_key.is_none());
        assert_eq!(cfg.pipeline_config().chop_threshold, 50.0);
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg: BotConfig = toml::from_str(
            r#"
            coin = "ETH"
            interval = "1m"
            grid_mode = true
            position_size = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(cfg.coin, "ETH");
        assert_eq!(cfg.interval, "1m");
        assert!(cfg.grid_mode);
        assert_eq!(cfg.position_size, 0.05);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.poll_interval_secs, 300);
        assert!(cfg.testnet);
    }

    #[test]
    fn pipeline_config_carries_overlay_settings() {
        let cfg = BotConfig {
            grid_mode: true,
            chop_threshold: 61.8,
            ..Default::default()
        };
        let pipeline = cfg.pipeline_config();
        assert!(pipeline.grid_mode);
        assert_eq!(pipeline.chop_threshold, 61.8);
        assert_eq!(pipeline.min_rows, 50);
    }
}
