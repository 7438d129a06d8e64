//! Main-menu buttons and inline actions.

pub const REPORT_MISTAKE: &str = "🚑 У меня ошибка";
pub const MISTAKE_LOG: &str = "📓 Журнал ошибок";
pub const RESET_CONTEXT: &str = "🔄 Сбросить контекст";

pub const CONFIRM_LABEL: &str = "Да, верно";
pub const REJECT_LABEL: &str = "Не совсем";
pub const START_STRUCTURE_LABEL: &str = "Разобрать по шагам";

/// Rows of the persistent reply keyboard.
pub const MAIN_MENU: &[&[&str]] = &[&[REPORT_MISTAKE, MISTAKE_LOG], &[RESET_CONTEXT]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ReportMistake,
    MistakeLog,
    ResetContext,
}

impl MenuChoice {
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            REPORT_MISTAKE => Some(Self::ReportMistake),
            MISTAKE_LOG => Some(Self::MistakeLog),
            RESET_CONTEXT => Some(Self::ResetContext),
            _ => None,
        }
    }
}

/// Inline-button actions carried in callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ConfirmSummary,
    RejectSummary,
    StartStructure,
}

impl Action {
    #[must_use]
    pub const fn callback_data(self) -> &'static str {
        match self {
            Self::ConfirmSummary => "sum_yes",
            Self::RejectSummary => "sum_no",
            Self::StartStructure => "struct_go",
        }
    }

    #[must_use]
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "sum_yes" => Some(Self::ConfirmSummary),
            "sum_no" => Some(Self::RejectSummary),
            "struct_go" => Some(Self::StartStructure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_round_trips() {
        for action in [
            Action::ConfirmSummary,
            Action::RejectSummary,
            Action::StartStructure,
        ] {
            assert_eq!(Action::from_callback_data(action.callback_data()), Some(action));
        }
        assert_eq!(Action::from_callback_data("other"), None);
    }

    #[test]
    fn menu_text_is_matched_exactly() {
        assert_eq!(
            MenuChoice::from_text(" 🚑 У меня ошибка "),
            Some(MenuChoice::ReportMistake)
        );
        assert_eq!(MenuChoice::from_text("У меня ошибка"), None);
    }
}
