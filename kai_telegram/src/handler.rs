use crate::{Command, Error, Result, TelegramBot, keyboard};
use kai_coach::{Action, Outgoing};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction, Message, User};
use tracing::{info, warn};

const FAILURE_REPLY: &str = "Что-то пошло не так. Попробуй ещё раз чуть позже.";

/// Mentor replies, or a fixed apology when the mentor failed.
fn replies_or_apology(result: anyhow::Result<Vec<Outgoing>>, user_id: i64) -> Vec<Outgoing> {
    result.unwrap_or_else(|e| {
        warn!("Mentor failed for user {user_id}: {e}");
        vec![Outgoing::menu(FAILURE_REPLY)]
    })
}

/// State is keyed by the Telegram user, falling back to the chat.
fn user_key(user: Option<&User>, chat_id: ChatId) -> i64 {
    user.and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or(chat_id.0)
}

fn username(user: Option<&User>) -> &str {
    user.and_then(|u| u.username.as_deref())
        .unwrap_or("unknown")
}

/// Handle bot commands
pub async fn handle_command(bot: TelegramBot, msg: Message, cmd: Command) -> Result<()> {
    let user_id = user_key(msg.from.as_ref(), msg.chat.id);
    info!("[@{}] Command: {cmd:?}", username(msg.from.as_ref()));

    match cmd {
        Command::Start => {
            bot.bot
                .send_message(msg.chat.id, Command::welcome_text())
                .reply_markup(keyboard::main_menu())
                .await?;
        }
        Command::Help => {
            bot.bot
                .send_message(msg.chat.id, Command::help_text())
                .reply_markup(keyboard::main_menu())
                .await?;
        }
        Command::Reset => {
            let replies = bot.mentor.reset(user_id).await.map_err(Error::Storage)?;
            bot.deliver(msg.chat.id, None, replies).await?;
        }
        Command::Mistakes => {
            let replies = bot.mentor.mistakes(user_id).await.map_err(Error::Storage)?;
            bot.deliver(msg.chat.id, None, replies).await?;
        }
    }

    Ok(())
}

/// Handle any message (commands or regular text)
pub async fn handle_message(bot: TelegramBot, msg: Message) -> Result<()> {
    let chat_id = msg.chat.id;
    if !bot.is_allowed(chat_id.0) {
        warn!("Ignoring message from chat {chat_id}");
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(cmd) = Command::parse_from_text(text) {
        return handle_command(bot, msg, cmd).await;
    }

    let user_id = user_key(msg.from.as_ref(), chat_id);
    info!("[@{}] Message: {text}", username(msg.from.as_ref()));

    bot.bot.send_chat_action(chat_id, ChatAction::Typing).await?;

    let replies = replies_or_apology(bot.mentor.handle_text(user_id, text).await, user_id);

    bot.deliver(chat_id, None, replies).await
}

/// Handle an inline-button press
pub async fn handle_callback(bot: TelegramBot, q: CallbackQuery) -> Result<()> {
    bot.bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    if !bot.is_allowed(chat_id.0) {
        warn!("Ignoring callback from chat {chat_id}");
        return Ok(());
    }

    let Some(action) = q.data.as_deref().and_then(Action::from_callback_data) else {
        warn!("Unknown callback data: {:?}", q.data);
        return Ok(());
    };

    let user_id = user_key(Some(&q.from), chat_id);
    info!("[@{}] Action: {action:?}", username(Some(&q.from)));

    let replies = replies_or_apology(bot.mentor.handle_action(user_id, action).await, user_id);

    bot.deliver(chat_id, Some(message.id()), replies).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use kai_coach::Markup;

    #[test]
    fn mentor_replies_pass_through() {
        let replies = replies_or_apology(Ok(vec![Outgoing::replacing("Принято")]), 7);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "Принято");
        assert!(replies[0].replaces_origin);
    }

    #[test]
    fn mentor_failure_becomes_apology() {
        let replies = replies_or_apology(Err(anyhow::anyhow!("storage offline")), 7);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, FAILURE_REPLY);
        assert_eq!(replies[0].markup, Markup::MainMenu);
        assert!(!replies[0].replaces_origin);
    }
}
