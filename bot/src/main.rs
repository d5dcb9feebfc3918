//! Trading agent entry point.
//!
//! One consolidated loop: every cycle pulls a fresh candle snapshot,
//! gathers external features, evaluates the signal pipeline and dispatches
//! orders. A cycle failure is logged and the loop keeps going; nothing
//! from a single evaluation may kill the scheduler.

use anyhow::Result;
use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn, Level};

use alerts::{format_grid_alert, format_signal_alert, TelegramNotifier};
use common::{ExternalFeatures, OrderSide, Signal};
use execution::{plan_grid, ExchangeClient, OrderRequest};
use market_data::{InfoClient, PriceReceiver, PriceStream, MAINNET_WS_URL, TESTNET_WS_URL};
use sentiment::{NullSentiment, SentimentProvider, TwitterSentiment};
use signal_generation::{RecurrentPredictor, SignalPipeline};

mod config;
mod journal;

use config::BotConfig;
use journal::TradeJournal;

struct TradingAgent {
    cfg: BotConfig,
    info: InfoClient,
    exchange: Option<ExchangeClient>,
    sentiment: Box<dyn SentimentProvider>,
    notifier: Option<TelegramNotifier>,
    pipeline: SignalPipeline,
    journal: TradeJournal,
    prices: PriceReceiver,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cfg = BotConfig::load()?;
    info!(coin = %cfg.coin, testnet = cfg.testnet, "🚀 starting trading agent");

    let agent = build_agent(cfg).await?;
    agent
        .notify(&format!(
            "🚀 agent started: {} {} every {}s",
            agent.cfg.coin, agent.cfg.interval, agent.cfg.poll_interval_secs
        ))
        .await;

    let mut ticker = interval(Duration::from_secs(agent.cfg.poll_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = agent.run_cycle().await {
                    error!(error = %e, "evaluation cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("👋 shutting down gracefully...");
                agent.notify("⏹️ agent stopped").await;
                return Ok(());
            }
        }
    }
}

async fn build_agent(cfg: BotConfig) -> Result<TradingAgent> {
    let info = if cfg.testnet {
        InfoClient::testnet()
    } else {
        InfoClient::mainnet()
    };

    let exchange = match &cfg.private_key {
        Some(key) => Some(ExchangeClient::new(key, info.clone())?),
        None => {
            warn!("no private key configured, running signal-only");
            None
        }
    };

    let sentiment: Box<dyn SentimentProvider> = match &cfg.twitter_bearer_token {
        Some(token) => Box::new(TwitterSentiment::new(token.clone())),
        None => Box::new(NullSentiment),
    };

    let notifier = match (&cfg.telegram_token, &cfg.telegram_chat_id) {
        (Some(token), Some(chat_id)) => Some(TelegramNotifier::new(token.clone(), chat_id.clone())),
        _ => {
            warn!("telegram not configured, alerts disabled");
            None
        }
    };

    let mut pipeline = SignalPipeline::new(cfg.pipeline_config());
    if cfg.predictor_enabled {
        let model = match cfg.predictor_seed {
            Some(seed) => RecurrentPredictor::seeded(seed),
            None => RecurrentPredictor::new(),
        };
        pipeline = pipeline.with_predictor(Box::new(model));
    }

    let ws_url = if cfg.testnet {
        TESTNET_WS_URL
    } else {
        MAINNET_WS_URL
    };
    let prices = PriceStream::new(ws_url, cfg.coin.clone()).spawn();

    let journal = TradeJournal::new(&cfg.journal_path);

    Ok(TradingAgent {
        cfg,
        info,
        exchange,
        sentiment,
        notifier,
        pipeline,
        journal,
        prices,
    })
}

impl TradingAgent {
    async fn run_cycle(&self) -> Result<()> {
        let end = Utc::now().timestamp_millis();
        let start = end - self.cfg.lookback_hours * 3_600_000;

        let series = match self
            .info
            .candles(&self.cfg.coin, &self.cfg.interval, start, end)
            .await
        {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                warn!("empty candle snapshot, skipping cycle");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "candle fetch failed, skipping cycle");
                return Ok(());
            }
        };

        let funding_rate = match self.info.funding_rate(&self.cfg.coin).await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(error = %e, "funding unavailable, defaulting to 0");
                0.0
            }
        };
        let sentiment = self.sentiment.score(&self.cfg.coin).await;
        let features = ExternalFeatures {
            sentiment,
            funding_rate,
        };

        let signal = self.pipeline.evaluate(&series, &features);
        info!(%signal, sentiment, funding_rate, rows = series.len(), "cycle evaluated");

        let Some(price) = self.last_price().await else {
            warn!("no current price available, skipping execution");
            return Ok(());
        };
        self.dispatch(signal, price).await;
        Ok(())
    }

    /// Latest price snapshot from the stream, falling back to a direct
    /// read while the stream is still warming up.
    async fn last_price(&self) -> Option<f64> {
        if let Some(update) = *self.prices.borrow() {
            return Some(update.price);
        }
        match self.info.mid_price(&self.cfg.coin).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(error = %e, "mid price fetch failed");
                None
            }
        }
    }

    async fn dispatch(&self, signal: Signal, price: f64) {
        let Some(exchange) = &self.exchange else {
            debug!(%signal, "signal-only mode, no execution");
            return;
        };

        match signal {
            Signal::GridBuy | Signal::GridSell => {
                let orders = plan_grid(signal, &self.cfg.coin, price, self.cfg.position_size);
                for (index, order) in orders.iter().enumerate() {
                    let level = index + 1;
                    match exchange.place_order(order).await {
                        Ok(receipt) => {
                            info!(level, oid = ?receipt.order_id, "grid order placed");
                            self.journal.record(signal, order, &receipt);
                            self.notify(&format_grid_alert(
                                signal,
                                &self.cfg.coin,
                                level,
                                orders.len(),
                                order.size,
                                order.limit_price.unwrap_or(price),
                            ))
                            .await;
                        }
                        Err(e) => warn!(level, error = %e, "grid order failed"),
                    }
                }
            }
            Signal::Buy | Signal::StrongBuy | Signal::Sell | Signal::StrongSell => {
                let side = if signal.is_buy_side() {
                    OrderSide::Buy
                } else {
                    OrderSide::Sell
                };
                if self.has_open_position(side).await {
                    info!(%signal, "open position on the same side, not adding");
                    return;
                }
                let order = OrderRequest {
                    coin: self.cfg.coin.clone(),
                    side,
                    size: self.cfg.position_size,
                    limit_price: None,
                };
                match exchange.place_order(&order).await {
                    Ok(receipt) => {
                        info!(%signal, oid = ?receipt.order_id, "order placed");
                        self.journal.record(signal, &order, &receipt);
                        self.notify(&format_signal_alert(
                            signal,
                            &self.cfg.coin,
                            order.size,
                            price,
                        ))
                        .await;
                    }
                    Err(e) => warn!(%signal, error = %e, "order failed"),
                }
            }
            Signal::Hold | Signal::GridHold => {
                debug!("holding, no orders");
            }
        }
    }

    async fn has_open_position(&self, side: OrderSide) -> bool {
        let Some(address) = &self.cfg.account_address else {
            return false;
        };
        match self.info.positions(address).await {
            Ok(positions) => positions
                .iter()
                .any(|p| p.coin == self.cfg.coin && p.side == side),
            Err(e) => {
                warn!(error = %e, "position query failed");
                false
            }
        }
    }

    async fn notify(&self, text: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(text).await {
                warn!(error = %e, "alert delivery failed");
            }
        }
    }
}
