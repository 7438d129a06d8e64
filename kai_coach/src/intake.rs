//! Free-form collection of a mistake description.
//!
//! The user describes the mistake in their own words over a few rounds. Each
//! answer is checked for vagueness and for a concrete behaviour; once enough
//! rounds are collected a one-line summary is proposed for confirmation.

use kai_core::StateData;
use once_cell::sync::Lazy;
use regex::Regex;

pub const START_PROMPT: &str = "Опиши основную ошибку 1–2 предложениями на уровне поведения/навыка.\n\
Примеры: «вхожу до формирования сигнала», «двигаю стоп после входа», «закрываю по первой коррекции».";

pub const ASK_CONCRETE: &str = "Понял. Давай чуть конкретнее: в какие именно дни/условиях это случается? \
(например: «после серии стопов», «перед закрытием дня», «после новостей»)";

pub const ASK_BEHAVIOR: &str = "Уточни, пожалуйста, что именно ты делаешь в эти моменты (глаголами): \
«вхожу раньше», «двигаю стоп», «усредняю» и т.п.";

pub const FOLLOW_UPS: [&str; 3] = [
    "Где по времени это чаще случается? (утро/конец дня/после убыточной серии)",
    "Какие чувства всплывают сильнее всего в этот момент? (тревога/спешка/страх упустить и т.п.)",
    "Что предшествует ошибке? (нет сетапов долго, новости, желание «вырваться»)",
];

const VAGUE_WORDS: &[&str] = &[
    "определенн",
    "иногда",
    "бывает",
    "какие-то",
    "как-то",
    "периодически",
    "редко",
    "часто",
];

const BEHAVIOR_VERBS: &[&str] = &[
    "вхожу",
    "войти",
    "закрываю",
    "закрыть",
    "двигаю",
    "двигать",
    "переношу",
    "усредняю",
    "усреднить",
    "пересиживаю",
    "пересидеть",
    "добавляю",
    "добавить",
    "снижаю",
    "снизить",
    "повышаю",
    "повысить",
    "удваиваю",
    "удвоить",
    "фиксирую",
    "зафиксировать",
    "не ставлю",
    "ставлю",
    "меняю",
    "менять",
    "прыгаю",
    "прыгать",
    "ломаю",
    "ломать",
];

/// Notes considered when composing a summary.
const SUMMARY_NOTES: usize = 5;

#[expect(clippy::expect_used, reason = "Static regex pattern")]
static CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(когда|в дни|после|перед|в ситуац)[^.]{5,80}").expect("context regex")
});

#[expect(clippy::expect_used, reason = "Static regex pattern")]
static EMOTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(тревог|страх|азарт|напряжен|паник|давлен)[^.]{0,40}").expect("emotion regex")
});

#[expect(clippy::expect_used, reason = "Static regex pattern")]
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// What to ask next after a free-form answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep {
    AskConcrete,
    AskBehavior,
    /// Enough material: propose this summary for confirmation.
    Propose(String),
    FollowUp(&'static str),
}

#[must_use]
pub fn has_behavior(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BEHAVIOR_VERBS.iter().any(|v| lowered.contains(v))
}

#[must_use]
pub fn has_vague(text: &str) -> bool {
    let lowered = text.to_lowercase();
    VAGUE_WORDS.iter().any(|v| lowered.contains(v))
}

/// Record one free-form answer and decide the next question.
///
/// Vagueness is challenged before a missing behaviour, and both before the
/// round threshold is checked.
pub fn advance(data: &mut StateData, text: &str, free_rounds: u32, max_notes: usize) -> IntakeStep {
    let text = text.trim();
    data.push_note(text, max_notes);
    data.round += 1;

    if has_vague(text) {
        return IntakeStep::AskConcrete;
    }
    if !has_behavior(text) {
        return IntakeStep::AskBehavior;
    }
    if data.round >= free_rounds {
        let summary = propose_summary(&data.free_notes);
        data.summary = Some(summary.clone());
        return IntakeStep::Propose(summary);
    }

    let idx = usize::try_from(data.round.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .min(FOLLOW_UPS.len() - 1);
    IntakeStep::FollowUp(FOLLOW_UPS[idx])
}

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

fn clean_part(part: &str) -> &str {
    part.trim().trim_end_matches('.')
}

/// Compose "context → behaviour → (emotions)" from the latest notes.
#[must_use]
pub fn propose_summary(notes: &[String]) -> String {
    let start = notes.len().saturating_sub(SUMMARY_NOTES);
    let joined = notes[start..].join(" ");
    let lowered = joined.to_lowercase();

    let context = CONTEXT.find(&joined).map(|m| m.as_str().to_string());
    let emotions = EMOTION.find(&joined).map(|m| m.as_str().to_string());

    let behavior = BEHAVIOR_VERBS
        .iter()
        .find(|v| lowered.contains(*v))
        .and_then(|v| {
            Regex::new(&format!(r"(?i).{{0,60}}{}.{{0,60}}", regex::escape(v)))
                .ok()?
                .find(&joined)
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| take_chars(&joined, 120));

    let mut parts = Vec::new();
    if let Some(context) = &context {
        let context = clean_part(context);
        let context = context
            .strip_prefix("когда")
            .or_else(|| context.strip_prefix("Когда"))
            .unwrap_or(context)
            .trim_start();
        parts.push(format!("Когда {context}"));
    }
    if !clean_part(&behavior).is_empty() {
        parts.push(format!("я {}", clean_part(&behavior)));
    }
    if let Some(emotions) = &emotions {
        parts.push(format!("(обычно чувства: {})", clean_part(emotions)));
    }

    let summary = if parts.is_empty() {
        take_chars(&joined, 160)
    } else {
        parts.join(" → ")
    };

    WHITESPACE.replace_all(&summary, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn detects_vague_and_behavior_words() {
        assert!(has_vague("Иногда так бывает"));
        assert!(!has_vague("после серии стопов"));
        assert!(has_behavior("Двигаю стоп после входа"));
        assert!(!has_behavior("мне грустно"));
    }

    #[test]
    fn vague_answer_is_challenged_first() {
        let mut data = StateData::default();
        let step = advance(&mut data, "иногда двигаю стоп", 3, 8);
        assert_eq!(step, IntakeStep::AskConcrete);
        assert_eq!(data.round, 1);
        assert_eq!(data.free_notes, vec!["иногда двигаю стоп"]);
    }

    #[test]
    fn missing_behavior_is_challenged() {
        let mut data = StateData::default();
        assert_eq!(
            advance(&mut data, "после серии стопов", 3, 8),
            IntakeStep::AskBehavior
        );
    }

    #[test]
    fn follow_ups_then_proposal() {
        let mut data = StateData::default();
        assert_eq!(
            advance(&mut data, "двигаю стоп после входа", 3, 8),
            IntakeStep::FollowUp(FOLLOW_UPS[0])
        );
        assert_eq!(
            advance(&mut data, "вхожу раньше сигнала", 3, 8),
            IntakeStep::FollowUp(FOLLOW_UPS[1])
        );
        let step = advance(&mut data, "когда проторговал утро, закрываю в ноль", 3, 8);
        let IntakeStep::Propose(summary) = step else {
            panic!("expected a proposal, got {step:?}");
        };
        assert_eq!(data.summary.as_deref(), Some(summary.as_str()));
        assert!(summary.starts_with("Когда "));
    }

    #[test]
    fn summary_combines_context_behavior_and_emotion() {
        let summary = propose_summary(&notes(&[
            "после серии стопов",
            "двигаю стоп",
            "чувствую тревогу",
        ]));
        assert_eq!(
            summary,
            "Когда после серии стопов двигаю стоп чувствую тревогу → \
             я после серии стопов двигаю стоп чувствую тревогу → \
             (обычно чувства: тревогу)"
        );
    }

    #[test]
    fn leading_kogda_is_not_doubled() {
        let summary = propose_summary(&notes(&["когда рынок стоит, вхожу без сигнала"]));
        assert!(summary.starts_with("Когда рынок стоит"));
        assert!(!summary.to_lowercase().starts_with("когда когда"));
    }

    #[test]
    fn summary_falls_back_to_raw_text() {
        let summary = propose_summary(&notes(&["просто   плохая сделка"]));
        assert_eq!(summary, "я просто плохая сделка");
    }

    #[test]
    fn only_last_five_notes_are_used() {
        let mut items = vec!["усредняю против тренда"];
        items.extend(["нет"; 5]);
        let summary = propose_summary(&notes(&items));
        assert_eq!(summary, "я нет нет нет нет нет");
    }
}
