use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

const CONFIG_DIR: &str = "kai";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub coach: CoachConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    /// Chat ids allowed to talk to the bot. Empty means everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            retry: RetryConfig::default(),
        }
    }
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }
}

/// Backoff schedule for completion requests, in seconds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "RetryConfig::default_base_delays")]
    pub base_delays: Vec<u64>,
    #[serde(default = "RetryConfig::default_final_retries")]
    pub final_retries: usize,
    #[serde(default = "RetryConfig::default_final_delay")]
    pub final_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delays: Self::default_base_delays(),
            final_retries: Self::default_final_retries(),
            final_delay: Self::default_final_delay(),
        }
    }
}

impl RetryConfig {
    fn default_base_delays() -> Vec<u64> {
        vec![1, 2]
    }

    const fn default_final_retries() -> usize {
        1
    }

    const fn default_final_delay() -> u64 {
        4
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoachConfig {
    #[serde(default = "CoachConfig::default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(default = "CoachConfig::default_explore_temperature")]
    pub explore_temperature: f32,
    #[serde(default = "CoachConfig::default_summarize_temperature")]
    pub summarize_temperature: f32,
    /// Messages of history sent with each completion.
    #[serde(default = "CoachConfig::default_history_window")]
    pub history_window: usize,
    /// Messages of history kept in the stored state.
    #[serde(default = "CoachConfig::default_history_limit")]
    pub history_limit: usize,
    /// Free-form answers collected before a summary is proposed.
    #[serde(default = "CoachConfig::default_free_rounds")]
    pub free_rounds: u32,
    #[serde(default = "CoachConfig::default_max_notes")]
    pub max_notes: usize,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            max_tokens: None,
            explore_temperature: Self::default_explore_temperature(),
            summarize_temperature: Self::default_summarize_temperature(),
            history_window: Self::default_history_window(),
            history_limit: Self::default_history_limit(),
            free_rounds: Self::default_free_rounds(),
            max_notes: Self::default_max_notes(),
        }
    }
}

impl CoachConfig {
    fn default_model() -> String {
        "gpt-4o-mini".to_string()
    }

    const fn default_explore_temperature() -> f32 {
        0.4
    }

    const fn default_summarize_temperature() -> f32 {
        0.3
    }

    const fn default_history_window() -> usize {
        16
    }

    const fn default_history_limit() -> usize {
        40
    }

    const fn default_free_rounds() -> u32 {
        3
    }

    const fn default_max_notes() -> usize {
        8
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        dirs::home_dir().map_or_else(
            || "sqlite://kai.db?mode=rwc".to_string(),
            |home| {
                format!(
                    "sqlite://{}?mode=rwc",
                    home.join(CONFIG_DIR).join("kai.db").display()
                )
            },
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeepaliveConfig {
    #[serde(default = "KeepaliveConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "KeepaliveConfig::default_host")]
    pub host: String,
    #[serde(default = "KeepaliveConfig::default_port")]
    pub port: u16,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl KeepaliveConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    const fn default_port() -> u16 {
        8080
    }
}

impl Config {
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR)
            .join(CONFIG_FILE))
    }

    /// Load `~/kai/config.json` if present, then apply environment overrides.
    ///
    /// A missing file is not an error: hosted deployments usually configure
    /// everything through the environment.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            info!("Loaded config from {}", config_path.display());
            serde_json::from_str(&content)?
        } else {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment-style variables.
    ///
    /// Recognised keys: `TELEGRAM_TOKEN`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`,
    /// `OPENAI_MODEL`, `DATABASE_URL`, `PORT`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.providers.openai.api_key = key;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.providers.openai.base_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.coach.model = model;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(port) = get("PORT").and_then(|p| p.trim().parse().ok()) {
            self.keepalive.port = port;
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR);

        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let mut template = Self::default();
        template.telegram.token = "your-telegram-bot-token".to_string();
        template.providers.openai.api_key = "your-openai-api-key".to_string();

        std::fs::write(&config_path, serde_json::to_string_pretty(&template)?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your Telegram bot token and OpenAI API key");
        println!("   2. Optionally point database.url at PostgreSQL");
        println!("   3. Run 'kai run' to start the bot");
        println!();
        println!("🔧 Environment overrides:");
        println!("   TELEGRAM_TOKEN, OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL,");
        println!("   DATABASE_URL, PORT");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn minimal_document_fills_defaults() -> anyhow::Result<()> {
        let config: Config = serde_json::from_str(r#"{"telegram": {"token": "abc"}}"#)?;
        assert_eq!(config.telegram.token, "abc");
        assert!(config.telegram.allow_from.is_empty());
        assert_eq!(config.coach.history_window, 16);
        assert_eq!(config.coach.free_rounds, 3);
        assert_eq!(config.coach.max_notes, 8);
        assert!((config.coach.explore_temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.providers.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.keepalive.port, 8080);
        assert!(config.keepalive.enabled);
        Ok(())
    }

    #[test]
    fn mistyped_document_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"keepalive": {"port": "eighty"}}"#).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_TOKEN", "tg-token"),
            ("OPENAI_API_KEY", "sk-test"),
            ("DATABASE_URL", "postgres://kai@localhost/kai"),
            ("PORT", "10000"),
        ]);

        let mut config = Config::default();
        config.telegram.token = "from-file".to_string();
        config.apply_env(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.telegram.token, "tg-token");
        assert_eq!(config.providers.openai.api_key, "sk-test");
        assert_eq!(config.database.url, "postgres://kai@localhost/kai");
        assert_eq!(config.keepalive.port, 10000);
    }

    #[test]
    fn blank_or_invalid_env_values_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([("TELEGRAM_TOKEN", "  "), ("PORT", "http")]);

        let mut config = Config::default();
        config.telegram.token = "keep".to_string();
        config.apply_env(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.telegram.token, "keep");
        assert_eq!(config.keepalive.port, 8080);
    }
}
