//! Application state and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use gitrelay_core::AppConfig;
use gitrelay_webhook::{ChatClient, RelayState, TelegramClient};

use crate::cli::Args;
use crate::server::Server;

/// Loads the configuration and lets command-line arguments override it.
pub fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(&path.to_string_lossy())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load configuration from environment")?,
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    Ok(config)
}

/// Main application
pub struct App {
    config: AppConfig,
    state: Arc<RelayState>,
}

impl App {
    /// Build the application with all dependencies
    pub fn build(args: Args) -> Result<Self> {
        let config = load_config(&args)?;

        let client: Arc<dyn ChatClient> = Arc::new(
            TelegramClient::new(&config.telegram).context("Failed to create Telegram client")?,
        );
        let state = Arc::new(RelayState::new(client).with_debug(config.debug));

        Ok(Self { config, state })
    }

    /// Run the application until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        info!(
            address = %self.config.server.address(),
            debug = self.config.debug,
            "Starting server"
        );

        let server = Server::new(self.config.server, self.state);
        server.run().await
    }
}
