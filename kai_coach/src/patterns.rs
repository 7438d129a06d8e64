//! Keyword detection of risky trading behaviour and emotional states.

use kai_core::{ChatMessage, Role};
use std::collections::BTreeSet;

/// A behaviour or emotion recognised in user text.
///
/// Variant order is the reporting order of [`detect`]: risk patterns first,
/// then emotional ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TradingPattern {
    RemoveStop,
    MoveStop,
    EarlyClose,
    Averaging,
    Fomo,
    RuleBreaking,
    SelfDoubt,
    FearOfLoss,
    Chaos,
}

impl TradingPattern {
    pub const ALL: [Self; 9] = [
        Self::RemoveStop,
        Self::MoveStop,
        Self::EarlyClose,
        Self::Averaging,
        Self::Fomo,
        Self::RuleBreaking,
        Self::SelfDoubt,
        Self::FearOfLoss,
        Self::Chaos,
    ];

    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::RemoveStop => &["убираю стоп", "снял стоп", "без стопа"],
            Self::MoveStop => &["двигаю стоп", "отодвинул стоп", "переставил стоп"],
            Self::EarlyClose => &["закрыл рано", "вышел в ноль", "мизерный плюс", "ранний выход"],
            Self::Averaging => &["усреднение", "доливался против", "докупал против"],
            Self::Fomo => &["поезд уедет", "упустил", "уйдёт без меня", "страх упустить"],
            Self::RuleBreaking => &["нарушил план", "отошёл от плана", "игнорировал план"],
            Self::SelfDoubt => &["сомневаюсь", "не уверен", "стресс", "паника", "волнение"],
            Self::FearOfLoss => &["страх потерь", "боюсь стопа", "не хочу быть обманутым"],
            Self::Chaos => &["хаос", "суета", "путаюсь"],
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RemoveStop => "remove_stop",
            Self::MoveStop => "move_stop",
            Self::EarlyClose => "early_close",
            Self::Averaging => "averaging",
            Self::Fomo => "fomo",
            Self::RuleBreaking => "rule_breaking",
            Self::SelfDoubt => "self_doubt",
            Self::FearOfLoss => "fear_of_loss",
            Self::Chaos => "chaos",
        }
    }

    #[must_use]
    pub const fn is_risk(self) -> bool {
        matches!(
            self,
            Self::RemoveStop
                | Self::MoveStop
                | Self::EarlyClose
                | Self::Averaging
                | Self::Fomo
                | Self::RuleBreaking
        )
    }
}

/// Every pattern whose keywords occur in `text` (case-insensitive).
#[must_use]
pub fn detect(text: &str) -> Vec<TradingPattern> {
    let lowered = text.to_lowercase();
    TradingPattern::ALL
        .into_iter()
        .filter(|p| p.keywords().iter().any(|k| lowered.contains(k)))
        .collect()
}

/// Whether the text shows enough risk or distress to stop calibrating.
#[must_use]
pub fn should_force_structural(text: &str) -> bool {
    detect(text).into_iter().any(|p| {
        p.is_risk() || matches!(p, TradingPattern::FearOfLoss | TradingPattern::SelfDoubt)
    })
}

/// One-line trigger list built from everything the user has said.
#[must_use]
pub fn problem_summary(history: &[ChatMessage]) -> String {
    let found: BTreeSet<TradingPattern> = history
        .iter()
        .filter(|m| m.role == Role::User)
        .flat_map(|m| detect(&m.content))
        .collect();

    let has = |p: TradingPattern| found.contains(&p);

    let mut parts = Vec::new();
    if has(TradingPattern::Fomo) {
        parts.push("FOMO (страх упустить)");
    }
    if has(TradingPattern::RemoveStop) || has(TradingPattern::MoveStop) {
        parts.push("трогаешь/снимаешь стоп");
    }
    if has(TradingPattern::EarlyClose) {
        parts.push("ранний выход/«в ноль»");
    }
    if has(TradingPattern::Averaging) {
        parts.push("усреднение против позиции");
    }
    if has(TradingPattern::FearOfLoss) {
        parts.push("страх стопа/потерь");
    }
    if has(TradingPattern::SelfDoubt) {
        parts.push("сомнения после входа");
    }

    if parts.is_empty() {
        "Триггеры: нужен пример".to_string()
    } else {
        format!("Триггеры: {}", parts.join(", "))
    }
}
