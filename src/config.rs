use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, ValueEnum};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.3commas.io";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Command-line surface; every flag falls back to an environment variable.
#[derive(Args, Clone)]
pub struct RelayArgs {
    /// 3Commas API key.
    #[arg(long, env = "THREE_COMMAS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// 3Commas API secret used to sign requests.
    #[arg(long, env = "THREE_COMMAS_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,
    /// Numeric 3Commas exchange account id.
    #[arg(long, env = "ACCOUNT_ID")]
    pub account_id: Option<String>,
    /// Address the webhook server listens on.
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,
    #[arg(long, env = "THREE_COMMAS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Per-request timeout for calls to the trading API.
    #[arg(long, env = "THREE_COMMAS_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,
    /// Order size used when a signal carries no quantity.
    #[arg(long, env = "DEFAULT_ORDER_UNITS", default_value_t = 50.0)]
    pub default_units: f64,
    /// Comma separated allow-list of pairs; empty accepts any pair.
    #[arg(long, env = "SUPPORTED_PAIRS", value_delimiter = ',')]
    pub supported_pairs: Vec<String>,
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl fmt::Debug for RelayArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayArgs")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("account_id", &self.account_id.as_ref().map(|_| "<redacted>"))
            .field("bind", &self.bind)
            .field("base_url", &self.base_url)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("default_units", &self.default_units)
            .field("supported_pairs", &self.supported_pairs)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Trading account credentials, loaded once and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    api_key: String,
    api_secret: String,
    account_id: u64,
}

impl AccountCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, account_id: u64) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            account_id,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn account_id(&self) -> u64 {
        self.account_id
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("account_id", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub base_url: Url,
    pub upstream_timeout: Duration,
    pub default_units: f64,
    pub supported_pairs: Vec<String>,
    pub log_format: LogFormat,
    pub credentials: AccountCredentials,
}

impl RelayConfig {
    pub fn from_args(args: RelayArgs) -> Result<Self, ConfigError> {
        let api_key = non_blank(args.api_key);
        let api_secret = non_blank(args.api_secret);
        let account_id = non_blank(args.account_id);

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push("THREE_COMMAS_API_KEY");
        }
        if api_secret.is_none() {
            missing.push("THREE_COMMAS_SECRET");
        }
        if account_id.is_none() {
            missing.push("ACCOUNT_ID");
        }
        let (Some(api_key), Some(api_secret), Some(account_id)) = (api_key, api_secret, account_id)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let account_id = account_id
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidAccountId(account_id.clone()))?;

        let base_url = Url::parse(&args.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: args.base_url.clone(),
            source,
        })?;

        let config = Self {
            bind: args.bind,
            base_url,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            default_units: args.default_units,
            supported_pairs: args
                .supported_pairs
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            log_format: args.log_format,
            credentials: AccountCredentials::new(api_key, api_secret, account_id),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.default_units.is_finite() && self.default_units > 0.0) {
            return Err(ConfigError::Validation(
                "default order units must be greater than zero".into(),
            ));
        }
        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "upstream timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
