//! How concrete the user's story is so far.

use kai_core::{ChatMessage, Role};

/// Only the tail of the user's text is considered.
const WINDOW_CHARS: usize = 1200;
/// Signal count at which clarity saturates at 1.0.
const SATURATION: f32 = 12.0;

const SIGNALS: &[&str] = &[
    // time anchors
    "вчера",
    "сегодня",
    "на днях",
    "на прошлой неделе",
    "на выходных",
    "когда",
    "тогда",
    "в момент",
    "после входа",
    "после открытия",
    "в сделке",
    // trade mechanics
    "стоп",
    "тейк",
    "объём",
    "позиция",
    "вошёл",
    "закрыл",
    "открыл",
    "план",
    "сетап",
    "лонг",
    "шорт",
    "перенёс",
    "изменил",
    "поставил",
    "снял",
];

/// Fraction of signal keywords found in recent user messages, in `0.0..=1.0`.
#[must_use]
pub fn measure(history: &[ChatMessage]) -> f32 {
    let joined = history
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let skip = joined.chars().count().saturating_sub(WINDOW_CHARS);
    let tail: String = joined.chars().skip(skip).collect::<String>().to_lowercase();

    let signals = SIGNALS.iter().filter(|kw| tail.contains(*kw)).count();

    #[expect(clippy::cast_precision_loss, reason = "signal count is tiny")]
    let ratio = signals as f32 / SATURATION;
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_zero_clarity() {
        assert!(measure(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn counts_distinct_signals_in_user_messages() {
        let history = vec![
            ChatMessage::user("Вчера вошёл в лонг"),
            ChatMessage::assistant("вчера когда стоп тейк план"),
            ChatMessage::user("и снял стоп"),
        ];
        // вчера, стоп, вошёл, лонг, снял
        assert!((measure(&history) - 5.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn saturates_at_one() {
        let text = SIGNALS.join(" ");
        let history = vec![ChatMessage::user(text)];
        assert!((measure(&history) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn only_recent_text_counts() {
        let mut old = "вчера ".to_string();
        old.push_str(&"х".repeat(WINDOW_CHARS + 10));
        let history = vec![ChatMessage::user(old)];
        assert!(measure(&history).abs() < f32::EPSILON);
    }
}
