mod schema;

pub use schema::{
    CoachConfig, Config, DatabaseConfig, KeepaliveConfig, ProviderConfig, ProvidersConfig,
    RetryConfig, TelegramConfig,
};
