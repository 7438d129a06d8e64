//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use kai_coach::Mentor;
use kai_config::Config;
use kai_core::{MistakeLog, StateStore};
use kai_providers::{OpenAiProvider, RetryPolicy};
use kai_storage::StateManager;
use std::sync::Arc;
use tracing::info;

mod chat;
mod info;
mod init;
mod mistakes;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use mistakes::{MistakesInput, MistakesStrategy};
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// OpenAI-compatible client configured from `providers.openai`.
fn build_provider(config: &Config) -> OpenAiProvider {
    let openai = &config.providers.openai;
    let retry = RetryPolicy::from_secs(
        &openai.retry.base_delays,
        openai.retry.final_retries,
        openai.retry.final_delay,
    );

    OpenAiProvider::new(openai.api_key.clone())
        .with_base_url(openai.base_url.clone())
        .with_default_model(config.coach.model.clone())
        .with_retry(retry)
}

fn build_mentor<S>(config: &Config, storage: Arc<S>) -> Mentor<OpenAiProvider>
where
    S: StateStore + MistakeLog + 'static,
{
    Mentor::new(
        build_provider(config),
        storage.clone(),
        storage,
        config.coach.clone(),
    )
}

/// Open the configured database, creating the default sqlite directory.
async fn open_storage(config: &Config) -> anyhow::Result<StateManager> {
    if config.database.url.starts_with("sqlite:") {
        Config::ensure_config_dir()?;
    }
    info!("Connecting to database");
    StateManager::new(&config.database.url).await
}

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
