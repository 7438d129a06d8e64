use kai_coach::Markup;
use kai_coach::menu::{self, Action};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup,
};

/// Persistent reply keyboard with the main menu.
pub fn main_menu() -> KeyboardMarkup {
    let rows = menu::MAIN_MENU
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect())
        .collect::<Vec<Vec<_>>>();
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn action_button(label: &str, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.callback_data())
}

pub fn confirm_summary() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        action_button(menu::CONFIRM_LABEL, Action::ConfirmSummary),
        action_button(menu::REJECT_LABEL, Action::RejectSummary),
    ]])
}

pub fn start_structure() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[action_button(
        menu::START_STRUCTURE_LABEL,
        Action::StartStructure,
    )]])
}

/// Telegram markup for a reply, if any.
pub fn render(markup: Markup) -> Option<ReplyMarkup> {
    match markup {
        Markup::None => None,
        Markup::MainMenu => Some(main_menu().into()),
        Markup::ConfirmSummary => Some(confirm_summary().into()),
        Markup::StartStructure => Some(start_structure().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callbacks(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn main_menu_has_two_rows() {
        let kb = main_menu();
        assert!(kb.resize_keyboard);
        let labels: Vec<Vec<&str>> = kb
            .keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();
        assert_eq!(
            labels,
            vec![
                vec![menu::REPORT_MISTAKE, menu::MISTAKE_LOG],
                vec![menu::RESET_CONTEXT]
            ]
        );
    }

    #[test]
    fn confirmation_buttons_carry_actions() {
        assert_eq!(callbacks(&confirm_summary()), ["sum_yes", "sum_no"]);
        assert_eq!(callbacks(&start_structure()), ["struct_go"]);
    }

    #[test]
    fn plain_replies_have_no_markup() {
        assert!(render(Markup::None).is_none());
        assert!(matches!(
            render(Markup::MainMenu),
            Some(ReplyMarkup::Keyboard(_))
        ));
        assert!(matches!(
            render(Markup::ConfirmSummary),
            Some(ReplyMarkup::InlineKeyboard(_))
        ));
    }
}
