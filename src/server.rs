//! HTTP surface for TradingView webhooks.
//!
//! | route | purpose |
//! |---|---|
//! | `GET /health` | liveness, never touches the trading API |
//! | `GET /status` | configured account as reported by the trading API |
//! | `POST /tv_signal` | relay one trade signal |
//! | `GET /trades` | recent smart trades, `?limit=N` |
//!
//! Every failure is answered with `{"status":"error","message":..}`.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::error::{RelayError, UpstreamError, ValidationError};
use crate::relay::SignalRelay;
use crate::types::TradeResult;

pub fn router(relay: Arc<SignalRelay>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/tv_signal", post(tv_signal))
        .route("/trades", get(trades))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        )
        .with_state(relay)
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(listener: TcpListener, relay: Arc<SignalRelay>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn status(State(relay): State<Arc<SignalRelay>>) -> Response {
    match relay.account_status().await {
        Ok(account) => Json(json!({
            "status": "ok",
            "account": account,
            "supported_pairs": relay.policy().supported_pairs(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(err) => upstream_failure(err),
    }
}

async fn tv_signal(State(relay): State<Arc<SignalRelay>>, body: Bytes) -> Response {
    match relay.relay_payload(&body).await {
        Ok(ack) => (StatusCode::OK, Json(TradeResult::success(ack))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct TradesQuery {
    limit: Option<u32>,
}

async fn trades(
    State(relay): State<Arc<SignalRelay>>,
    query: Result<Query<TradesQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(rejection) => {
            return RelayError::from(ValidationError::Malformed(rejection.body_text()))
                .into_response()
        }
    };
    match relay.recent_trades(q.limit).await {
        Ok(trades) => Json(json!({ "status": "ok", "trades": trades })).into_response(),
        Err(err) => upstream_failure(err),
    }
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(TradeResult::error("endpoint not found")),
    )
        .into_response()
}

fn upstream_failure(err: UpstreamError) -> Response {
    RelayError::from(err).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(TradeResult::error(self.to_string()))).into_response()
    }
}
