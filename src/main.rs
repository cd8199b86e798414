//! Tubecast bot entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubecast::cli::{preflight, Cli};
use tubecast::config::Settings;
use tubecast::orchestrator::Orchestrator;
use tubecast::telegram::{Dispatcher, TelegramClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env become visible to clap's `env` lookups.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    }
    .with_overrides(cli.token.clone(), cli.cookies.clone());

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| cli.log_directive(&settings.general.log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    preflight::check(&settings).context("Startup checks failed")?;

    let settings = Arc::new(settings);
    let client = Arc::new(TelegramClient::from_settings(&settings)?);

    let me = client
        .get_me()
        .await
        .context("Could not reach the Telegram Bot API with the configured token")?;
    info!(
        "Running as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    let orchestrator = Arc::new(Orchestrator::new(settings.clone(), client.clone())?);
    let dispatcher = Dispatcher::new(client, orchestrator, &settings);

    dispatcher.run().await?;

    info!("Stopped");
    Ok(())
}
