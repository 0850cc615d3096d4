use std::sync::Arc;

use serde_json::Value;

use crate::error::{RelayResult, UpstreamError};
use crate::exchange::TradingAccount;
use crate::signal::SignalPolicy;
use crate::types::{OrderAck, OrderRequest, TradeResult, TradeSignal};

pub const DEFAULT_TRADES_LIMIT: u32 = 10;
pub const MAX_TRADES_LIMIT: u32 = 100;

/// Turns validated signals into a single order against the trading account.
///
/// Holds no mutable state: one relay is shared by every request handler.
#[derive(Clone)]
pub struct SignalRelay {
    account: Arc<dyn TradingAccount>,
    policy: SignalPolicy,
    default_units: f64,
}

impl SignalRelay {
    pub fn new(account: Arc<dyn TradingAccount>, policy: SignalPolicy, default_units: f64) -> Self {
        Self {
            account,
            policy,
            default_units,
        }
    }

    pub fn policy(&self) -> &SignalPolicy {
        &self.policy
    }

    /// Decode, validate and execute a raw webhook body.
    pub async fn relay_payload(&self, body: &[u8]) -> RelayResult<OrderAck> {
        let signal = self.policy.decode(body).inspect_err(|err| {
            tracing::warn!(error = %err, "rejected trade signal");
        })?;
        Ok(self.execute(&signal).await?)
    }

    /// Execute an already-built signal. It is checked against the policy first,
    /// and a rejected signal never reaches the account.
    pub async fn handle_signal(&self, signal: TradeSignal) -> TradeResult {
        if let Err(err) = self.policy.check(&signal) {
            tracing::warn!(error = %err, "rejected trade signal");
            return TradeResult::error(err.to_string());
        }
        match self.execute(&signal).await {
            Ok(ack) => TradeResult::success(ack),
            Err(err) => TradeResult::error(err.to_string()),
        }
    }

    async fn execute(&self, signal: &TradeSignal) -> Result<OrderAck, UpstreamError> {
        tracing::info!(
            symbol = %signal.symbol,
            action = %signal.action,
            quantity = ?signal.quantity,
            "relaying trade signal"
        );
        let order = OrderRequest::from_signal(signal, self.default_units);
        match self.account.place_order(order).await {
            Ok(ack) => {
                tracing::info!(symbol = %signal.symbol, trade_id = %ack.trade_id, "trade placed");
                Ok(ack)
            }
            Err(err) => {
                tracing::error!(symbol = %signal.symbol, error = %err, "trade failed");
                Err(err)
            }
        }
    }

    pub async fn account_status(&self) -> Result<Value, UpstreamError> {
        self.account.get_account_status().await.inspect_err(|err| {
            tracing::error!(error = %err, "account status unavailable");
        })
    }

    /// `limit` defaults to [`DEFAULT_TRADES_LIMIT`] and is clamped to `1..=MAX_TRADES_LIMIT`.
    pub async fn recent_trades(&self, limit: Option<u32>) -> Result<Value, UpstreamError> {
        let limit = limit
            .unwrap_or(DEFAULT_TRADES_LIMIT)
            .clamp(1, MAX_TRADES_LIMIT);
        self.account.recent_trades(limit).await.inspect_err(|err| {
            tracing::error!(error = %err, "trade history unavailable");
        })
    }
}
