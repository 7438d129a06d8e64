//! MERCEDES: the step-by-step breakdown of a confirmed mistake.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Key under which the answer is stored.
    pub key: &'static str,
    pub title: &'static str,
    pub question: &'static str,
}

pub const STEPS: [Step; 6] = [
    Step {
        key: "context",
        title: "Контекст",
        question: "КОНТЕКСТ. В какой ситуации это обычно происходит? Что предшествует? (1–2 предложения)",
    },
    Step {
        key: "emotions",
        title: "Эмоции",
        question: "ЭМОЦИИ. Что ты чувствуешь в этот момент? Где это ощущается в теле?",
    },
    Step {
        key: "thoughts",
        title: "Мысли",
        question: "МЫСЛИ. Какие мысли проносятся прямо перед ошибкой? Запиши дословно.",
    },
    Step {
        key: "behavior",
        title: "Поведение",
        question: "ПОВЕДЕНИЕ. Что именно ты делаешь руками в терминале? По шагам.",
    },
    Step {
        key: "beliefs",
        title: "Убеждения",
        question: "УБЕЖДЕНИЯ. Во что ты веришь в этот момент о рынке или о себе?",
    },
    Step {
        key: "state",
        title: "Состояние",
        question: "СОСТОЯНИЕ. В каком состоянии ты обычно торгуешь, когда это случается (усталость, азарт, спешка)?",
    },
];

#[must_use]
pub fn step(index: usize) -> Option<&'static Step> {
    STEPS.get(index)
}

#[must_use]
pub const fn is_last(index: usize) -> bool {
    index + 1 >= STEPS.len()
}

#[must_use]
pub fn title_for(key: &str) -> &str {
    STEPS
        .iter()
        .find(|s| s.key == key)
        .map_or(key, |s| s.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_have_unique_keys() {
        let mut keys: Vec<_> = STEPS.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), STEPS.len());
    }

    #[test]
    fn first_step_is_context() {
        assert_eq!(step(0).map(|s| s.key), Some("context"));
        assert!(step(STEPS.len()).is_none());
        assert!(is_last(STEPS.len() - 1));
        assert!(!is_last(0));
    }

    #[test]
    fn unknown_keys_render_as_is() {
        assert_eq!(title_for("thoughts"), "Мысли");
        assert_eq!(title_for("custom"), "custom");
    }
}
