//! PlayHub Player - headless realtime client.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playhub_player::application::ToastCenter;
use playhub_player::config::RealtimeConfig;
use playhub_player::infrastructure::websocket::TungsteniteConnector;
use playhub_player::runner::{self, RunnerDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playhub_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PlayHub Player");

    let config = RealtimeConfig::from_env().context("Invalid PLAYHUB_* configuration")?;
    tracing::info!(
        base_url = %config.endpoints.base(),
        max_attempts = config.reconnect.max_attempts,
        caro_room = config.caro_room.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    let deps = RunnerDeps {
        config,
        connector: Arc::new(TungsteniteConnector),
        notifier: Arc::new(ToastCenter::new()),
    };

    runner::run(deps, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await?;

    tracing::info!("PlayHub Player stopped");
    Ok(())
}
