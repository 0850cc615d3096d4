//! 3Commas public API v2 adapter.
//!
//! Orders are placed as smart trades (`POST /public/api/v2/smart_trades`).
//! `buy` opens a long position; `sell` and `close` both submit a market sell,
//! with `close` tagged in the trade note. Account status and trade history are
//! plain signed GETs whose bodies are passed through untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use url::Url;

use crate::config::{AccountCredentials, RelayConfig};
use crate::error::UpstreamError;
use crate::exchange::signing::{sign, signing_path};
use crate::exchange::TradingAccount;
use crate::types::{OrderAck, OrderRequest, TradeAction, TradeId};

const API_PREFIX: &str = "/public/api/v2";

#[derive(Clone)]
pub struct ThreeCommasClient {
    http: Client,
    base_url: Url,
    credentials: AccountCredentials,
}

impl ThreeCommasClient {
    pub fn new(
        base_url: Url,
        credentials: AccountCredentials,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn from_config(cfg: &RelayConfig) -> Result<Self, UpstreamError> {
        Self::new(
            cfg.base_url.clone(),
            cfg.credentials.clone(),
            cfg.upstream_timeout,
        )
    }

    /// Smart trade body for one order. Percentages are sent as strings, as the API expects.
    pub fn smart_trade_body(&self, order: &OrderRequest) -> Value {
        let position_type = match order.action {
            TradeAction::Buy => "buy",
            TradeAction::Sell | TradeAction::Close => "sell",
        };

        let take_profit = match order.take_profit_pct {
            Some(pct) => json!({
                "enabled": true,
                "steps": [{
                    "order_type": "market",
                    "price": { "value": percent_string(pct), "type": "bid" },
                    "volume": 100
                }]
            }),
            None => json!({ "enabled": false }),
        };

        let stop_loss = match order.stop_loss_pct {
            Some(pct) => json!({
                "enabled": true,
                "order_type": "market",
                "conditional": {
                    "price": { "value": percent_string(pct), "type": "ask" }
                }
            }),
            None => json!({ "enabled": false }),
        };

        json!({
            "account_id": self.credentials.account_id(),
            "pair": order.symbol.0,
            "position": {
                "type": position_type,
                "order_type": "market",
                "units": { "value": order.units.to_string() }
            },
            "take_profit": take_profit,
            "stop_loss": stop_loss,
            "note": format!("tradingview {} signal", order.action),
        })
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let path = signing_path(&format!("{API_PREFIX}{endpoint}"), query);
        let url = self
            .base_url
            .join(&path)
            .map_err(|err| UpstreamError::InvalidUrl(format!("{path}: {err}")))?;
        let signed = sign(
            self.credentials.api_secret(),
            chrono::Utc::now().timestamp_millis(),
            method.as_str(),
            &path,
        );

        let mut req = self
            .http
            .request(method.clone(), url)
            .header("APIKEY", self.credentials.api_key())
            .header("Signature", signed.signature)
            .header("Timestamp", signed.timestamp);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|err| {
            tracing::error!(%method, endpoint, error = %err, "3commas request failed");
            UpstreamError::Transport(err)
        })?;
        let status = resp.status();
        tracing::info!(%method, endpoint, status = status.as_u16(), "3commas api call");

        let text = resp.text().await?;
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), body = %text, "3commas rejected request");
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|err| UpstreamError::MalformedResponse(format!("{endpoint}: {err}")))?;
        if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
            let detail = value
                .get("error_description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| display_value(err));
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body: detail,
            });
        }
        Ok(value)
    }
}

#[async_trait]
impl TradingAccount for ThreeCommasClient {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck, UpstreamError> {
        tracing::info!(
            pair = %order.symbol,
            action = %order.action,
            units = order.units,
            "submitting smart trade"
        );
        let body = self.smart_trade_body(&order);
        let resp = self
            .request(Method::POST, "/smart_trades", &[], Some(&body))
            .await?;
        let trade_id = resp
            .get("id")
            .and_then(id_string)
            .and_then(TradeId::from_upstream)
            .ok_or(UpstreamError::MissingTradeId)?;
        tracing::info!(%trade_id, pair = %order.symbol, "smart trade created");
        Ok(OrderAck { trade_id })
    }

    async fn get_account_status(&self) -> Result<Value, UpstreamError> {
        let resp = self.request(Method::GET, "/accounts", &[], None).await?;
        let wanted = self.credentials.account_id().to_string();
        let accounts = match resp {
            Value::Array(items) => items,
            other => vec![other],
        };
        accounts
            .into_iter()
            .find(|account| account.get("id").and_then(id_string).as_deref() == Some(wanted.as_str()))
            .ok_or(UpstreamError::AccountNotFound(wanted))
    }

    async fn recent_trades(&self, limit: u32) -> Result<Value, UpstreamError> {
        let query = [
            ("account_id", self.credentials.account_id().to_string()),
            ("limit", limit.to_string()),
        ];
        self.request(Method::GET, "/smart_trades", &query, None).await
    }
}

/// Ids come back as JSON numbers or strings depending on endpoint.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Fixed 6-decimal rendering with trailing zeros dropped: `30.0` → `"30"`.
fn percent_string(pct: f64) -> String {
    let fixed = format!("{pct:.6}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
