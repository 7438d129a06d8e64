//! Conversions between database rows and core types.

use kai_core::{Intent, MistakeEntry, StateData, UserState};
use kai_entities::{mistakes, user_states};
use sea_orm::Set;
use tracing::warn;

pub fn state_from_model(model: user_states::Model) -> anyhow::Result<UserState> {
    let intent = model.intent.parse().unwrap_or_else(|e| {
        warn!("User {}: {e}, falling back to idle", model.user_id);
        Intent::Idle
    });
    let data: StateData = serde_json::from_str(&model.data)?;

    Ok(UserState {
        user_id: model.user_id,
        intent,
        data,
    })
}

pub fn state_to_active(state: &UserState) -> anyhow::Result<user_states::ActiveModel> {
    Ok(user_states::ActiveModel {
        user_id: Set(state.user_id),
        intent: Set(state.intent.as_str().to_string()),
        data: Set(serde_json::to_string(&state.data)?),
        updated_at: Set(chrono::Utc::now().naive_utc()),
    })
}

pub fn mistake_from_model(model: mistakes::Model) -> anyhow::Result<MistakeEntry> {
    Ok(MistakeEntry {
        id: model.id,
        user_id: model.user_id,
        summary: model.summary,
        triggers: model.triggers,
        answers: serde_json::from_str(&model.answers)?,
        created_at: model.created_at.and_utc(),
    })
}

pub fn mistake_to_active(entry: &MistakeEntry) -> anyhow::Result<mistakes::ActiveModel> {
    Ok(mistakes::ActiveModel {
        id: Set(entry.id),
        user_id: Set(entry.user_id),
        summary: Set(entry.summary.clone()),
        triggers: Set(entry.triggers.clone()),
        answers: Set(serde_json::to_string(&entry.answers)?),
        created_at: Set(entry.created_at.naive_utc()),
    })
}
