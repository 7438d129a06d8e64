//! Console conversation with the mentor, sharing state with the bot.
//!
//! Inline buttons are typed as `/yes`, `/no` and `/go`; menu items are typed
//! as their button labels.

use kai_coach::menu::{self, Action};
use kai_coach::{Markup, Mentor, Outgoing};
use kai_config::Config;
use kai_providers::OpenAiProvider;
use kai_storage::EphemeralStore;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    pub user_id: i64,
    /// Keep state in memory instead of the database
    pub ephemeral: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

fn console_action(input: &str) -> Option<Action> {
    match input {
        "/yes" => Some(Action::ConfirmSummary),
        "/no" => Some(Action::RejectSummary),
        "/go" => Some(Action::StartStructure),
        _ => None,
    }
}

fn print_replies(replies: &[Outgoing]) {
    for reply in replies {
        println!("\n{}", reply.text);
        match reply.markup {
            Markup::ConfirmSummary => println!(
                "  [/yes: {}] [/no: {}]",
                menu::CONFIRM_LABEL,
                menu::REJECT_LABEL
            ),
            Markup::StartStructure => println!("  [/go: {}]", menu::START_STRUCTURE_LABEL),
            Markup::MainMenu | Markup::None => {}
        }
    }
    println!();
}

async fn turn(mentor: &Mentor<OpenAiProvider>, user_id: i64, input: &str) -> anyhow::Result<()> {
    let replies = match console_action(input) {
        Some(action) => mentor.handle_action(user_id, action).await?,
        None => mentor.handle_text(user_id, input).await?,
    };
    print_replies(&replies);
    Ok(())
}

async fn run_interactive(mentor: &Mentor<OpenAiProvider>, user_id: i64) -> anyhow::Result<()> {
    println!("Kai console started. Type 'exit' to quit.");
    println!(
        "Menu: {} | {} | {}\n",
        menu::REPORT_MISTAKE,
        menu::MISTAKE_LOG,
        menu::RESET_CONTEXT
    );

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        if let Err(e) = turn(mentor, user_id, input).await {
            eprintln!("Error: {e}");
        }
    }

    Ok(())
}

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        let mentor = if input.ephemeral {
            info!("Using in-memory state");
            super::build_mentor(&config, Arc::new(EphemeralStore::new()))
        } else {
            let storage = Arc::new(super::open_storage(&config).await?);
            super::build_mentor(&config, storage)
        };

        match input.message {
            Some(msg) => turn(&mentor, input.user_id, msg.trim()).await,
            None => run_interactive(&mentor, input.user_id).await,
        }
    }
}
