//! Per-user dialogue state.
//!
//! A user is always in exactly one [`Intent`]. The [`StateData`] payload is
//! persisted as a single JSON document next to the intent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ChatMessage;

pub const DEFAULT_STYLE: &str = "ты";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Free coaching conversation.
    #[default]
    Idle,
    /// Collecting a mistake description.
    Error,
    /// Walking through the MERCEDES breakdown of a confirmed mistake.
    ErrorMercedes,
}

impl Intent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Error => "error",
            Self::ErrorMercedes => "error_mercedes",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "error" => Ok(Self::Error),
            "error_mercedes" => Ok(Self::ErrorMercedes),
            other => Err(anyhow::anyhow!("unknown intent: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoachLoop {
    #[default]
    Explore,
    Summarize,
    Structure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoachState {
    #[serde(default)]
    pub clarity: f32,
    #[serde(default)]
    pub turns: u32,
    #[serde(default, rename = "loop")]
    pub stage: CoachLoop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakePhase {
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateData {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub coach: CoachState,
    #[serde(default)]
    pub problem_confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<IntakePhase>,
    #[serde(default)]
    pub free_notes: Vec<String>,
    #[serde(default)]
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub step: usize,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    /// Facts the model asked us to remember.
    #[serde(default)]
    pub store: Map<String, Value>,
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl Default for StateData {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            style: default_style(),
            coach: CoachState::default(),
            problem_confirmed: false,
            phase: None,
            free_notes: Vec::new(),
            round: 0,
            summary: None,
            step: 0,
            answers: BTreeMap::new(),
            store: Map::new(),
        }
    }
}

impl StateData {
    /// Append a message and keep only the `limit` most recent ones.
    pub fn push_history(&mut self, message: ChatMessage, limit: usize) {
        self.history.push(message);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    /// Append a trimmed note and keep only the `limit` most recent ones.
    pub fn push_note(&mut self, note: &str, limit: usize) {
        self.free_notes.push(note.trim().to_string());
        if self.free_notes.len() > limit {
            let excess = self.free_notes.len() - limit;
            self.free_notes.drain(..excess);
        }
    }

    /// Clear everything belonging to the intake and breakdown flows.
    pub fn clear_flow(&mut self) {
        self.phase = None;
        self.free_notes.clear();
        self.round = 0;
        self.summary = None;
        self.step = 0;
        self.answers.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub user_id: i64,
    pub intent: Intent,
    pub data: StateData,
}

impl UserState {
    #[must_use]
    pub fn idle(user_id: i64) -> Self {
        Self {
            user_id,
            intent: Intent::Idle,
            data: StateData::default(),
        }
    }
}
