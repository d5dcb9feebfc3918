//! Wallet-signed venue client.
//!
//! Orders go out as signed actions against `{base}/exchange`. Market
//! orders are expressed as aggressive IOC limits priced through the mid;
//! resting orders are plain GTC limits. The client owns serialization,
//! signing and receipt parsing, nothing else.

use std::collections::HashMap;

use chrono::Utc;
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use rust_decimal::prelude::*;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::OrderSide;
use market_data::InfoClient;

use crate::error::ExecutionError;

/// Slippage allowance applied when crossing the book for a market order.
const MARKET_SLIPPAGE: f64 = 0.005;

/// One order to place.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub coin: String,
    pub side: OrderSide,
    /// Size in coin units.
    pub size: f64,
    /// Limit price; `None` means cross the book at the current mid.
    pub limit_price: Option<f64>,
}

/// Venue acknowledgement for one placed order.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    /// Venue order id, when the order rested or filled.
    pub order_id: Option<u64>,
    /// Client order id we attached.
    pub client_id: String,
    /// "resting" or "filled".
    pub status: String,
}

/// Write-side venue client.
pub struct ExchangeClient {
    http: reqwest::Client,
    base_url: String,
    wallet: LocalWallet,
    info: InfoClient,
    asset_indices: RwLock<HashMap<String, u32>>,
}

impl ExchangeClient {
    /// Build a client signing with `private_key` against the same venue
    /// environment as `info`.
    pub fn new(private_key: &str, info: InfoClient) -> Result<Self, ExecutionError> {
        let wallet: LocalWallet = private_key
            .trim_start_matches("0x")
            .parse()
            .map_err(ExecutionError::Wallet)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: info.base_url().to_string(),
            wallet,
            info,
            asset_indices: RwLock::new(HashMap::new()),
        })
    }

    /// Place one order and parse the venue receipt.
    pub async fn place_order(&self, request: &OrderRequest) -> Result<OrderReceipt, ExecutionError> {
        if !(request.size > 0.0) {
            return Err(ExecutionError::InvalidOrder(format!(
                "non-positive size {}",
                request.size
            )));
        }

        let asset = self.asset_index(&request.coin).await?;
        let is_buy = request.side == OrderSide::Buy;

        let (limit_price, tif) = match request.limit_price {
            Some(px) if px > 0.0 => (px, "Gtc"),
            Some(px) => {
                return Err(ExecutionError::InvalidOrder(format!(
                    "non-positive limit price {px}"
                )))
            }
            None => {
                let mid = self
                    .info
                    .mid_price(&request.coin)
                    .await
                    .map_err(|e| ExecutionError::MarketData(e.to_string()))?;
                let crossing = if is_buy {
                    mid * (1.0 + MARKET_SLIPPAGE)
                } else {
                    mid * (1.0 - MARKET_SLIPPAGE)
                };
                (crossing, "Ioc")
            }
        };

        let client_id = format!("0x{}", Uuid::new_v4().simple());
        let action = json!({
            "type": "order",
            "orders": [{
                "a": asset,
                "b": is_buy,
                "p": format_price(limit_price),
                "s": format_size(request.size),
                "r": false,
                "t": {"limit": {"tif": tif}},
                "c": client_id,
            }],
            "grouping": "na",
        });

        info!(
            coin = %request.coin,
            side = ?request.side,
            size = request.size,
            price = limit_price,
            tif,
            "placing order"
        );
        let response = self.post_signed(action).await?;
        let receipt = parse_order_receipt(&response, client_id)?;
        info!(oid = ?receipt.order_id, status = %receipt.status, "order acknowledged");
        Ok(receipt)
    }

    /// Cancel a resting order by venue id.
    pub async fn cancel_order(&self, coin: &str, order_id: u64) -> Result<(), ExecutionError> {
        let asset = self.asset_index(coin).await?;
        let action = json!({
            "type": "cancel",
            "cancels": [{"a": asset, "o": order_id}],
        });
        let response = self.post_signed(action).await?;
        if response.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(ExecutionError::Rejected(response.to_string()));
        }
        info!(coin, order_id, "order cancelled");
        Ok(())
    }

    async fn asset_index(&self, coin: &str) -> Result<u32, ExecutionError> {
        if let Some(index) = self.asset_indices.read().await.get(coin) {
            return Ok(*index);
        }
        let index = self
            .info
            .asset_index(coin)
            .await
            .map_err(|e| ExecutionError::UnknownAsset(format!("{coin}: {e}")))?;
        self.asset_indices
            .write()
            .await
            .insert(coin.to_string(), index);
        debug!(coin, index, "cached asset index");
        Ok(index)
    }

    async fn post_signed(&self, action: Value) -> Result<Value, ExecutionError> {
        let nonce = Utc::now().timestamp_millis() as u64;
        let signature = self.sign_action(&action, nonce).await?;
        let body = json!({
            "action": action,
            "nonce": nonce,
            "signature": signature,
        });
        let response = self
            .http
            .post(format!("{}/exchange", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Sign the keccak digest of the serialized action plus nonce.
    async fn sign_action(&self, action: &Value, nonce: u64) -> Result<Value, ExecutionError> {
        let mut payload = serde_json::to_vec(action)?;
        payload.extend_from_slice(&nonce.to_be_bytes());
        let digest = keccak256(&payload);
        let signature = self.wallet.sign_message(digest).await?;
        Ok(json!({
            "r": format!("0x{:064x}", signature.r),
            "s": format!("0x{:064x}", signature.s),
            "v": signature.v,
        }))
    }
}

/// Price strings are capped at five significant figures.
fn format_price(price: f64) -> String {
    match Decimal::from_f64(price).and_then(|d| d.round_sf(5)) {
        Some(d) => d.normalize().to_string(),
        None => price.to_string(),
    }
}

/// Size strings are capped at six decimals.
fn format_size(size: f64) -> String {
    match Decimal::from_f64(size) {
        Some(d) => d.round_dp(6).normalize().to_string(),
        None => size.to_string(),
    }
}

fn parse_order_receipt(response: &Value, client_id: String) -> Result<OrderReceipt, ExecutionError> {
    if response.get("status").and_then(Value::as_str) != Some("ok") {
        return Err(ExecutionError::Rejected(response.to_string()));
    }

    let status = response
        .pointer("/response/data/statuses/0")
        .ok_or_else(|| ExecutionError::Rejected(format!("no order status in {response}")))?;

    if let Some(error) = status.get("error").and_then(Value::as_str) {
        return Err(ExecutionError::Rejected(error.to_string()));
    }
    for state in ["resting", "filled"] {
        if let Some(ack) = status.get(state) {
            return Ok(OrderReceipt {
                order_id: ack.get("oid").and_then(Value::as_u64),
                client_id,
                status: state.to_string(),
            });
        }
    }
    warn!(%status, "unrecognized order status");
    Ok(OrderReceipt {
        order_id: None,
        client_id,
        status: status.to_string(),
    })
}
