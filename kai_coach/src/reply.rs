/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    None,
    MainMenu,
    ConfirmSummary,
    StartStructure,
}

/// A message the transport should deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub text: String,
    pub markup: Markup,
    /// Replace the message whose button triggered this reply instead of
    /// sending a new one.
    pub replaces_origin: bool,
}

impl Outgoing {
    #[must_use]
    pub fn new(text: impl Into<String>, markup: Markup) -> Self {
        Self {
            text: text.into(),
            markup,
            replaces_origin: false,
        }
    }

    #[must_use]
    pub fn menu(text: impl Into<String>) -> Self {
        Self::new(text, Markup::MainMenu)
    }

    #[must_use]
    pub fn replacing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::None,
            replaces_origin: true,
        }
    }
}
