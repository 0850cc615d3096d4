use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tv_signal_relay::config::{LogFormat, RelayArgs, RelayConfig};
use tv_signal_relay::exchange::three_commas::ThreeCommasClient;
use tv_signal_relay::exchange::TradingAccount;
use tv_signal_relay::server;
use tv_signal_relay::signal::SignalPolicy;
use tv_signal_relay::SignalRelay;

#[derive(Parser, Debug)]
#[command(name = "relay", version, about = "Relay TradingView alerts to 3Commas")]
struct Cli {
    #[command(flatten)]
    relay: RelayArgs,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.relay.log_format);

    let config = match RelayConfig::from_args(cli.relay) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    let account: Arc<dyn TradingAccount> = Arc::new(
        ThreeCommasClient::from_config(&config).context("building 3commas client")?,
    );
    let policy = SignalPolicy::new(&config.supported_pairs);
    let relay = Arc::new(SignalRelay::new(account, policy, config.default_units));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;

    tracing::info!(
        bind = %config.bind,
        supported_pairs = ?config.supported_pairs,
        "tv signal relay starting"
    );

    server::serve(listener, relay, shutdown_signal()).await?;
    Ok(())
}
