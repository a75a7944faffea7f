mod bot;
mod config;
mod server;
#[cfg(test)]
mod testutil;
mod wake;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::BotClient;
use crate::config::Config;
use crate::server::AppState;
use crate::wake::WakeGuard;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tgbridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded");
    info!("  Public URL: {}", config.telegram.public_url);
    info!("  Bind: {}:{}", config.server.host, config.server.port);
    info!(
        "  Wake: threshold {}s, delay {}ms",
        config.wake.idle_threshold_secs, config.wake.wake_delay_ms
    );

    // Startup sequence: any failure here aborts before the server binds.
    let mut client = BotClient::new(&config.telegram.bot_token);
    client.register_command("start", bot::start);
    client.register_webhook(&config.telegram.public_url).await?;

    let state = Arc::new(AppState {
        bot: Some(Arc::new(client)),
        wake: WakeGuard::new(config.wake.idle_threshold(), config.wake.wake_delay()),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Bridge is serving on {addr}");
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Dropping the state tears down the bot client and its connections.
    info!("Bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
