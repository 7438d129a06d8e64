//! Removal of boilerplate coaching phrases from model output.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_REPLY_CHARS: usize = 1200;

/// Openers that turn a reply into generic advice.
pub const BANNED_PHRASES: &[&str] = &[
    "понимаю",
    "это может быть",
    "важно понять",
    "давай рассмотрим",
    "было бы полезно",
    "попробуй",
    "используй",
    "придерживайся",
    "установи",
    "сфокусируйся",
    "следуй",
    "пересмотри",
];

/// One sentence pattern per banned phrase, in `BANNED_PHRASES` order.
#[expect(
    clippy::expect_used,
    reason = "Static regex patterns built from escaped constants"
)]
static BANNED_SENTENCES: Lazy<Vec<Regex>> = Lazy::new(|| {
    BANNED_PHRASES
        .iter()
        .map(|p| {
            Regex::new(&format!(r"(?i)\b{}[^.!?]*[.!?]", regex::escape(p)))
                .expect("banned phrase regex")
        })
        .collect()
});

#[expect(clippy::expect_used, reason = "Static regex pattern")]
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Drop every sentence that starts with a banned phrase, normalise spacing
/// and cap the length.
///
/// Phrases are removed one after another, so a sentence exposed by an
/// earlier removal is still caught by a later phrase.
#[must_use]
pub fn strip_templates(text: &str) -> String {
    let without = BANNED_SENTENCES
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, " ").into_owned());
    let collapsed = WHITESPACE.replace_all(&without, " ");
    collapsed
        .trim_matches(|c| matches!(c, ' ' | ',' | '.' | '!' | '?'))
        .chars()
        .take(MAX_REPLY_CHARS)
        .collect()
}
