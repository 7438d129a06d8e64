#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod mistake;
pub mod state;

pub use mistake::MistakeEntry;
pub use state::{CoachLoop, CoachState, IntakePhase, Intent, StateData, UserState};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    /// Ask the provider to return a JSON object.
    pub json_mode: bool,
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LLMResponse>;
    fn get_default_model(&self) -> &str;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for std::sync::Arc<T> {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LLMResponse> {
        (**self).chat(request).await
    }

    fn get_default_model(&self) -> &str {
        (**self).get_default_model()
    }
}

/// Persistence for per-user dialogue state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the state for a user, returning an idle state when none is stored.
    async fn load(&self, user_id: i64) -> anyhow::Result<UserState>;
    async fn save(&self, state: &UserState) -> anyhow::Result<()>;
    /// Drop everything stored for a user.
    async fn reset(&self, user_id: i64) -> anyhow::Result<()>;
}

/// Persistence for confirmed mistake breakdowns.
#[async_trait]
pub trait MistakeLog: Send + Sync {
    async fn record(&self, entry: &MistakeEntry) -> anyhow::Result<()>;
    /// Most recent entries first.
    async fn recent(&self, user_id: i64, limit: u64) -> anyhow::Result<Vec<MistakeEntry>>;
}
