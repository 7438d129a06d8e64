//! Integration tests for the database-backed store.
//!
//! These tests verify that:
//! - Missing users load as idle
//! - Saved state survives a round trip, including updates
//! - Reset removes stored state
//! - The mistake log is filtered per user, newest first, and limited

use chrono::{Duration, Utc};
use kai_core::{ChatMessage, CoachLoop, IntakePhase, Intent, MistakeEntry, UserState};
use kai_storage::{MistakeLog, StateManager, StateStore};
use std::collections::BTreeMap;
use tempfile::TempDir;

async fn open_store() -> anyhow::Result<(TempDir, StateManager)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("kai.db").display());
    let manager = StateManager::new(&url).await?;
    Ok((dir, manager))
}

#[tokio::test]
async fn test_missing_user_is_idle() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    let state = store.load(42).await?;
    assert_eq!(state.user_id, 42);
    assert_eq!(state.intent, Intent::Idle);
    assert!(state.data.history.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_state_round_trip_and_update() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    let mut state = UserState::idle(7);
    state.intent = Intent::Error;
    state.data.phase = Some(IntakePhase::Free);
    state.data.push_note("двигаю стоп после входа", 8);
    state.data.push_history(ChatMessage::user("привет"), 40);
    store.save(&state).await?;

    let loaded = store.load(7).await?;
    assert_eq!(loaded, state);

    state.intent = Intent::Idle;
    state.data.coach.stage = CoachLoop::Summarize;
    state.data.coach.turns = 3;
    store.save(&state).await?;

    let loaded = store.load(7).await?;
    assert_eq!(loaded.intent, Intent::Idle);
    assert_eq!(loaded.data.coach.stage, CoachLoop::Summarize);
    assert_eq!(loaded.data.coach.turns, 3);
    assert_eq!(store.list_users().await?, vec![7]);
    Ok(())
}

#[tokio::test]
async fn test_reset_removes_state() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    let mut state = UserState::idle(9);
    state.intent = Intent::ErrorMercedes;
    state.data.summary = Some("двигаю стоп".to_string());
    store.save(&state).await?;

    store.reset(9).await?;

    let loaded = store.load(9).await?;
    assert_eq!(loaded.intent, Intent::Idle);
    assert!(loaded.data.summary.is_none());
    Ok(())
}

#[tokio::test]
async fn test_reopen_keeps_tables() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("kai.db").display());

    {
        let store = StateManager::new(&url).await?;
        let mut state = UserState::idle(3);
        state.data.style = "вы".to_string();
        store.save(&state).await?;
    }

    let store = StateManager::new(&url).await?;
    assert_eq!(store.load(3).await?.data.style, "вы");
    Ok(())
}

#[tokio::test]
async fn test_mistake_log_order_and_limit() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;
    let base = Utc::now();

    for i in 0..4 {
        let mut answers = BTreeMap::new();
        answers.insert("context".to_string(), format!("ctx {i}"));
        let mut entry = MistakeEntry::new(
            1,
            format!("ошибка {i}"),
            "Триггеры: FOMO (страх упустить)".to_string(),
            answers,
        );
        entry.created_at = base + Duration::seconds(i);
        store.record(&entry).await?;
    }
    let other = MistakeEntry::new(2, "чужая".to_string(), String::new(), BTreeMap::new());
    store.record(&other).await?;

    let recent = store.recent(1, 3).await?;
    let summaries: Vec<_> = recent.iter().map(|m| m.summary.as_str()).collect();
    assert_eq!(summaries, ["ошибка 3", "ошибка 2", "ошибка 1"]);
    assert_eq!(recent[0].answers.get("context").map(String::as_str), Some("ctx 3"));

    assert_eq!(store.recent(2, 10).await?.len(), 1);
    assert!(store.recent(3, 10).await?.is_empty());
    Ok(())
}
