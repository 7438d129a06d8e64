use crate::{Command, Error, Result, keyboard};
use kai_coach::{Mentor, Outgoing};
use kai_providers::OpenAiProvider;
use std::{sync::Arc, time::Duration};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::time::sleep;
use tracing::{info, warn};

/// Chat IDs from the allow-list; entries that are not integers are skipped.
fn parse_allowed(entries: &[String]) -> Vec<i64> {
    entries
        .iter()
        .filter_map(|s| match s.trim().parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Skipping invalid allow_from entry: {s:?}");
                None
            }
        })
        .collect()
}

/// An empty allow-list admits every chat.
fn chat_allowed(allowed: &[i64], chat_id: i64) -> bool {
    allowed.is_empty() || allowed.contains(&chat_id)
}

/// Telegram front end of the mentor.
#[derive(Clone)]
pub struct TelegramBot {
    /// Teloxide bot instance
    pub bot: Bot,
    /// Dialogue brain shared by all chats
    pub mentor: Arc<Mentor<OpenAiProvider>>,
    /// Allowed chat IDs
    allowed_chats: Vec<i64>,
}

impl TelegramBot {
    /// Create a new Telegram bot
    pub fn new(
        token: String,
        mentor: Arc<Mentor<OpenAiProvider>>,
        allowed_chats: &[String],
    ) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("Telegram bot token is empty".into()));
        }

        Ok(Self {
            bot: Bot::new(token),
            mentor,
            allowed_chats: parse_allowed(allowed_chats),
        })
    }

    /// Check if a chat is allowed
    #[must_use]
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        chat_allowed(&self.allowed_chats, chat_id)
    }

    /// Send mentor replies to a chat.
    ///
    /// A reply flagged as replacing the origin edits `origin` (the message
    /// carrying the pressed button); if the edit fails it is sent anew.
    pub async fn deliver(
        &self,
        chat_id: ChatId,
        origin: Option<MessageId>,
        replies: Vec<Outgoing>,
    ) -> Result<()> {
        for reply in replies {
            if reply.replaces_origin {
                if let Some(message_id) = origin {
                    match self
                        .bot
                        .edit_message_text(chat_id, message_id, &reply.text)
                        .await
                    {
                        Ok(_) => continue,
                        Err(e) => warn!("Failed to edit message {message_id} in {chat_id}: {e}"),
                    }
                }
            }

            let request = self.bot.send_message(chat_id, reply.text);
            match keyboard::render(reply.markup) {
                Some(markup) => request.reply_markup(markup).await?,
                None => request.await?,
            };
        }
        Ok(())
    }

    /// Test connection to Telegram API with linear backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) -> Result<()> {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(me) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        me.user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        me.user.id
                    );
                    return Ok(());
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);
                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    if attempt == 1 {
                        warn!("Check network access to api.telegram.org and the bot token");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::{CallbackQuery, Message, Update};

        self.test_connection().await?;

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {e}");
        }

        let bot = self.bot.clone();

        let schema = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let this = self.clone();
                move |msg: Message| {
                    let this = this.clone();
                    async move { crate::handler::handle_message(this, msg).await }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let this = self.clone();
                move |q: CallbackQuery| {
                    let this = this.clone();
                    async move { crate::handler::handle_callback(this, q).await }
                }
            }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_skips_invalid_entries() {
        let entries = vec![" 42 ".to_string(), "@someone".to_string(), "-100".to_string()];
        assert_eq!(parse_allowed(&entries), vec![42, -100]);
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(chat_allowed(&[], 42));
        assert!(chat_allowed(&parse_allowed(&["x".to_string()]), 42));
    }

    #[test]
    fn allow_list_rejects_other_chats() {
        let allowed = parse_allowed(&["42".to_string()]);
        assert!(chat_allowed(&allowed, 42));
        assert!(!chat_allowed(&allowed, 43));
    }
}
