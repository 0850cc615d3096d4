use thiserror::Error;

/// Inbound request problems. Never reach the trading API.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("unsupported action: {0}")]
    UnknownAction(String),
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be a fraction between 0 and 1, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("unsupported trading pair: {0}")]
    UnsupportedPair(String),
}

/// Failures talking to the trading API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot build trading api url: {0}")]
    InvalidUrl(String),
    #[error("trading api unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("trading api rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected trading api response: {0}")]
    MalformedResponse(String),
    #[error("trading api response carried no order id")]
    MissingTradeId,
    #[error("account {0} not found on trading api")]
    AccountNotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("ACCOUNT_ID must be numeric, got {0:?}")]
    InvalidAccountId(String),
    #[error("invalid trading api base url {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("configuration invalid: {0}")]
    Validation(String),
}

/// Everything a single webhook request can fail with.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub type RelayResult<T> = Result<T, RelayError>;
