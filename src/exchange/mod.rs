use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::types::{OrderAck, OrderRequest};

pub mod signing;
pub mod three_commas;

/// The slice of a trading account the relay needs.
///
/// Each method maps to exactly one request against the venue. Implementations
/// must not retry and must not invent identifiers: an [`OrderAck`] carries the
/// id the venue returned.
#[async_trait]
pub trait TradingAccount: Send + Sync {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderAck, UpstreamError>;

    /// Read-only snapshot of the configured account, passed through as the venue reports it.
    async fn get_account_status(&self) -> Result<Value, UpstreamError>;

    async fn recent_trades(&self, limit: u32) -> Result<Value, UpstreamError>;
}
