use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One confirmed mistake with its step-by-step breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MistakeEntry {
    pub id: Uuid,
    pub user_id: i64,
    pub summary: String,
    pub triggers: String,
    pub answers: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl MistakeEntry {
    #[must_use]
    pub fn new(
        user_id: i64,
        summary: String,
        triggers: String,
        answers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            summary,
            triggers,
            answers,
            created_at: Utc::now(),
        }
    }
}
