use async_trait::async_trait;
use kai_core::{MistakeEntry, MistakeLog, StateStore, UserState};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-process store; everything is lost when the process exits.
#[derive(Default)]
pub struct EphemeralStore {
    states: Mutex<HashMap<i64, UserState>>,
    mistakes: Mutex<Vec<MistakeEntry>>,
}

impl EphemeralStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for EphemeralStore {
    async fn load(&self, user_id: i64) -> anyhow::Result<UserState> {
        let states = self.states.lock().await;
        Ok(states
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserState::idle(user_id)))
    }

    async fn save(&self, state: &UserState) -> anyhow::Result<()> {
        self.states
            .lock()
            .await
            .insert(state.user_id, state.clone());
        Ok(())
    }

    async fn reset(&self, user_id: i64) -> anyhow::Result<()> {
        self.states.lock().await.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl MistakeLog for EphemeralStore {
    async fn record(&self, entry: &MistakeEntry) -> anyhow::Result<()> {
        self.mistakes.lock().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, user_id: i64, limit: u64) -> anyhow::Result<Vec<MistakeEntry>> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mistakes = self.mistakes.lock().await;
        let mut entries: Vec<MistakeEntry> = mistakes
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        Ok(entries)
    }
}
