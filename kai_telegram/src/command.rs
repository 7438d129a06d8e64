use teloxide::types::BotCommand;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Help,
    Mistakes,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        [
            ("start", "Начать и показать меню"),
            ("reset", "Сбросить контекст диалога"),
            ("mistakes", "Показать журнал ошибок"),
            ("help", "Что умеет бот"),
        ]
        .into_iter()
        .map(|(command, description)| BotCommand {
            command: command.to_string(),
            description: description.to_string(),
        })
        .collect()
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    /// Parse a slash command, ignoring a trailing `@bot_name` mention and
    /// any arguments.
    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let word = text.split_whitespace().next()?;
        let word = word.split('@').next().unwrap_or(word);

        match word {
            "/start" => Some(Self::Start),
            "/reset" => Some(Self::Reset),
            "/help" => Some(Self::Help),
            "/mistakes" => Some(Self::Mistakes),
            _ => None,
        }
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
🧭 Кай — наставник по трейдингу

Команды:
/start    - начать и показать меню
/reset    - сбросить контекст диалога
/mistakes - журнал ошибок
/help     - эта справка

Кнопки меню:
🚑 У меня ошибка - разобрать ошибку по шагам (MERCEDES)
📓 Журнал ошибок - последние разборы
🔄 Сбросить контекст - начать разговор заново

Или просто напиши, что происходит в торговле.
"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        r"
👋 Привет! Я Кай, наставник по трейдингу.

Помогу:
• разобраться, что на самом деле мешает в сделках
• разложить ошибку по шагам
• вести журнал ошибок

Расскажи, что случилось, или выбери пункт меню.
"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(Command::parse_from_text("/start"), Some(Command::Start));
        assert_eq!(Command::parse_from_text(" /RESET "), Some(Command::Reset));
        assert_eq!(Command::parse_from_text("/mistakes"), Some(Command::Mistakes));
        assert_eq!(Command::parse_from_text("/help"), Some(Command::Help));
    }

    #[test]
    fn strips_mention_and_arguments() {
        assert_eq!(
            Command::parse_from_text("/start@kai_mentor_bot"),
            Some(Command::Start)
        );
        assert_eq!(Command::parse_from_text("/help please"), Some(Command::Help));
    }

    #[test]
    fn ignores_regular_text() {
        assert_eq!(Command::parse_from_text("привет"), None);
        assert_eq!(Command::parse_from_text("/unknown"), None);
        assert_eq!(Command::parse_from_text(""), None);
    }

    #[test]
    fn registers_every_command() {
        let names: Vec<_> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(names, ["start", "reset", "mistakes", "help"]);
    }
}
