#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod keepalive;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy, MistakesInput,
    MistakesStrategy, TelegramInput, TelegramStrategy, VersionStrategy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "kai")]
#[command(about = "Kai: trading mentor bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Run the Telegram bot
    Run {
        /// Bot token (overrides config)
        #[arg(short, long)]
        token: Option<String>,

        /// Allowed chat IDs (overrides config)
        #[arg(short, long, num_args = 1..)]
        allow_from: Option<Vec<String>>,

        /// Do not start the keepalive HTTP server
        #[arg(long)]
        no_keepalive: bool,
    },
    /// Talk to the mentor in the terminal
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// User id whose state is used
        #[arg(short, long, default_value_t = 0)]
        user: i64,

        /// Keep state in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Print the mistake log of a user
    Mistakes {
        #[arg(short, long, default_value_t = 0)]
        user: i64,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Run {
            token,
            allow_from,
            no_keepalive,
        } => {
            TelegramStrategy
                .execute(TelegramInput {
                    token,
                    allow_from,
                    keepalive: !no_keepalive,
                })
                .await
        }
        Commands::Chat {
            message,
            user,
            ephemeral,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    message,
                    user_id: user,
                    ephemeral,
                })
                .await
        }
        Commands::Mistakes { user } => {
            MistakesStrategy
                .execute(MistakesInput { user_id: user })
                .await
        }
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
