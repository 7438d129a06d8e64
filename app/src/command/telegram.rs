use crate::command::CommandStrategy;
use crate::keepalive;
use kai_config::Config;
use kai_storage::StateManager;
use kai_telegram::TelegramBot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Connect to the state database with exponential backoff retry.
///
/// # Retry Behavior
/// - First retry: 1s
/// - Second retry: 2s
/// - Third and beyond: 3s (capped)
/// - Retries indefinitely until connection succeeds
async fn connect_storage_with_retry(config: &Config) -> StateManager {
    const MAX_DELAY: Duration = Duration::from_secs(3);
    const INITIAL_DELAY: Duration = Duration::from_secs(1);

    let mut attempt = 0u32;
    let mut delay = INITIAL_DELAY;

    loop {
        attempt += 1;
        match super::open_storage(config).await {
            Ok(manager) => {
                info!("State storage connected on attempt {attempt}");
                return manager;
            }
            Err(e) => {
                warn!(
                    "Failed to connect to database (attempt {attempt}): {e}. Retrying in {}s...",
                    delay.as_secs()
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Input for the `run` command.
pub struct TelegramInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
    /// Optional allowed chat IDs (overrides config)
    pub allow_from: Option<Vec<String>>,
    /// Start the keepalive HTTP server alongside the bot
    pub keepalive: bool,
}

/// Strategy for running the Telegram bot.
pub struct TelegramStrategy;

impl CommandStrategy for TelegramStrategy {
    type Input = TelegramInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        let token = match input.token {
            Some(t) => t,
            None if !config.telegram.token.is_empty() => config.telegram.token.clone(),
            None => anyhow::bail!(
                "Telegram bot token not configured. Set \"telegram.token\" in config or TELEGRAM_TOKEN"
            ),
        };

        if config.providers.openai.api_key.is_empty() {
            warn!("OpenAI API key is empty; coaching replies will use fallback texts");
        }

        let allow_from = input
            .allow_from
            .unwrap_or_else(|| config.telegram.allow_from.clone());

        if input.keepalive && config.keepalive.enabled {
            let host = config.keepalive.host.clone();
            let port = config.keepalive.port;
            tokio::spawn(async move {
                if let Err(e) = keepalive::serve(&host, port).await {
                    error!("Keepalive server stopped: {e}");
                }
            });
        }

        info!("Starting Telegram bot...");

        let storage = Arc::new(connect_storage_with_retry(&config).await);
        let mentor = Arc::new(super::build_mentor(&config, storage));

        let bot = TelegramBot::new(token, mentor, &allow_from)?;

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
