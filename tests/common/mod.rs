#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tv_signal_relay::error::UpstreamError;
use tv_signal_relay::exchange::TradingAccount;
use tv_signal_relay::signal::SignalPolicy;
use tv_signal_relay::types::{OrderAck, OrderRequest, TradeId};
use tv_signal_relay::SignalRelay;

#[derive(Clone, Debug)]
pub enum Outcome {
    Accept(&'static str),
    Reject { status: u16, body: &'static str },
    NoId,
}

/// Test double that records every call and answers with a scripted outcome.
pub struct RecordingAccount {
    outcome: Outcome,
    account_up: bool,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub status_calls: AtomicUsize,
    pub trades_limits: Mutex<Vec<u32>>,
}

impl RecordingAccount {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            account_up: true,
            orders: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            trades_limits: Mutex::new(Vec::new()),
        })
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self {
            outcome: Outcome::Reject {
                status: 503,
                body: "service unavailable",
            },
            account_up: false,
            orders: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            trades_limits: Mutex::new(Vec::new()),
        })
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.order_count()
            + self.status_calls.load(Ordering::SeqCst)
            + self.trades_limits.lock().unwrap().len()
    }

    fn unavailable() -> UpstreamError {
        UpstreamError::Rejected {
            status: 503,
            body: "service unavailable".into(),
        }
    }
}

#[async_trait]
impl TradingAccount for RecordingAccount {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck, UpstreamError> {
        self.orders.lock().unwrap().push(order);
        match &self.outcome {
            Outcome::Accept(id) => Ok(OrderAck {
                trade_id: TradeId::from_upstream(*id).ok_or(UpstreamError::MissingTradeId)?,
            }),
            Outcome::Reject { status, body } => Err(UpstreamError::Rejected {
                status: *status,
                body: body.to_string(),
            }),
            Outcome::NoId => Err(UpstreamError::MissingTradeId),
        }
    }

    async fn get_account_status(&self) -> Result<Value, UpstreamError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.account_up {
            return Err(Self::unavailable());
        }
        Ok(json!({ "id": 42, "name": "Binance", "market_code": "binance" }))
    }

    async fn recent_trades(&self, limit: u32) -> Result<Value, UpstreamError> {
        self.trades_limits.lock().unwrap().push(limit);
        if !self.account_up {
            return Err(Self::unavailable());
        }
        Ok(json!([{ "id": 1, "pair": "USDT_BTC" }]))
    }
}

pub fn relay_over(account: Arc<RecordingAccount>) -> SignalRelay {
    SignalRelay::new(account, SignalPolicy::default(), 50.0)
}
