use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pair as sent by the alert, e.g. `BTCUSDT` or `BTC/USDT`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Close,
}

impl TradeAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(TradeAction::Buy),
            "sell" => Some(TradeAction::Sell),
            "close" => Some(TradeAction::Close),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::Close => "close",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated inbound signal. Build one through [`crate::signal::SignalPolicy`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TradeSignal {
    pub symbol: Symbol,
    pub action: TradeAction,
    pub quantity: Option<f64>,
    /// Fraction of entry price, e.g. `0.30` for +30%.
    pub take_profit: Option<f64>,
    /// Fraction of entry price, e.g. `0.15` for -15%.
    pub stop_loss: Option<f64>,
}

/// Identifier assigned by the trading API. Only the exchange layer creates these.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    /// Returns `None` for blank ids so an empty upstream value never reads as success.
    pub fn from_upstream(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order handed to a [`crate::exchange::TradingAccount`]; one per valid signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub action: TradeAction,
    pub units: f64,
    /// Percent, already scaled (30.0 means 30%).
    pub take_profit_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
}

impl OrderRequest {
    pub fn from_signal(signal: &TradeSignal, default_units: f64) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            action: signal.action,
            units: signal.quantity.unwrap_or(default_units),
            take_profit_pct: signal.take_profit.map(percent),
            stop_loss_pct: signal.stop_loss.map(percent),
        }
    }
}

/// Fraction to percent, rounded to 1e-6 so `0.3` becomes exactly `30.0`.
fn percent(fraction: f64) -> f64 {
    (fraction * 100_000_000.0).round() / 1_000_000.0
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderAck {
    pub trade_id: TradeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// Normalized outcome returned to the webhook caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TradeResult {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<TradeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TradeResult {
    pub fn success(ack: OrderAck) -> Self {
        Self {
            status: ResultStatus::Success,
            trade_id: Some(ack.trade_id),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            trade_id: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}
