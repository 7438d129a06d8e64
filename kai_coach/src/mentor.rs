//! Dialogue orchestration: routes each user input to the right flow and
//! persists the resulting state.

use kai_config::CoachConfig;
use kai_core::{
    ChatMessage, CoachLoop, CoachState, IntakePhase, Intent, LLMProvider, MistakeEntry,
    MistakeLog, StateStore, UserState,
};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::{CoachEngine, STRUCTURE_REPLY};
use crate::intake::{self, IntakeStep};
use crate::menu::{Action, MenuChoice};
use crate::reply::{Markup, Outgoing};
use crate::{mercedes, patterns};

const RECENT_MISTAKES: u64 = 10;

const RESET_DONE: &str = "Контекст сброшен. Начнём с чистого листа.";
const EMPTY_LOG: &str = "Журнал ошибок пока пуст. Нажми «🚑 У меня ошибка», чтобы разобрать первую.";
const REPHRASE: &str = "Ок, поправим формулировку. Что бы ты добавил/изменил, чтобы было точнее?";
const BREAKDOWN_RUNNING: &str = "Разбор уже идёт — ответь, пожалуйста, на последний вопрос.";

fn confirm_prompt(summary: &str) -> String {
    format!("Зафиксирую так:\n\n— {summary}\n\nВерно сформулировал?")
}

fn accepted(summary: &str) -> String {
    format!("Принято ✅\n\n— {summary}")
}

/// The bot's conversational brain, independent of the chat transport.
pub struct Mentor<P> {
    engine: CoachEngine<P>,
    store: Arc<dyn StateStore>,
    log: Arc<dyn MistakeLog>,
}

impl<P: LLMProvider> Mentor<P> {
    pub fn new(
        provider: P,
        store: Arc<dyn StateStore>,
        log: Arc<dyn MistakeLog>,
        config: CoachConfig,
    ) -> Self {
        Self {
            engine: CoachEngine::new(provider, config),
            store,
            log,
        }
    }

    fn config(&self) -> &CoachConfig {
        self.engine.config()
    }

    /// Handle a plain text message.
    pub async fn handle_text(&self, user_id: i64, text: &str) -> anyhow::Result<Vec<Outgoing>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(choice) = MenuChoice::from_text(text) {
            debug!("User {user_id} picked menu item {choice:?}");
            return match choice {
                MenuChoice::ReportMistake => self.start_intake(user_id).await,
                MenuChoice::MistakeLog => self.mistakes(user_id).await,
                MenuChoice::ResetContext => self.reset(user_id).await,
            };
        }

        let mut state = self.store.load(user_id).await?;
        let replies = match (state.intent, state.data.phase) {
            (Intent::Error, Some(IntakePhase::Free)) => self.intake_turn(&mut state, text),
            (Intent::ErrorMercedes, _) => self.breakdown_turn(&mut state, text).await?,
            _ => self.coach_turn(&mut state, text).await,
        };
        self.store.save(&state).await?;

        Ok(replies)
    }

    /// Handle an inline-button press.
    pub async fn handle_action(
        &self,
        user_id: i64,
        action: Action,
    ) -> anyhow::Result<Vec<Outgoing>> {
        let mut state = self.store.load(user_id).await?;
        info!(
            "User {user_id} action {:?} in intent {}",
            action, state.intent
        );

        let summary = state
            .data
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty());

        let replies = match (action, summary) {
            (_, _) if state.intent == Intent::ErrorMercedes => {
                vec![Outgoing::new(BREAKDOWN_RUNNING, Markup::MainMenu)]
            }
            (Action::ConfirmSummary, Some(summary)) => {
                if state.intent == Intent::Error {
                    Self::begin_breakdown(&mut state, &summary)
                } else {
                    state.data.problem_confirmed = true;
                    vec![
                        Outgoing::replacing(accepted(&summary)),
                        Outgoing::new(STRUCTURE_REPLY, Markup::StartStructure),
                    ]
                }
            }
            (Action::StartStructure, Some(summary)) => Self::begin_breakdown(&mut state, &summary),
            (Action::StartStructure, None) => {
                Self::open_intake(&mut state);
                vec![Outgoing::replacing(intake::START_PROMPT)]
            }
            (Action::ConfirmSummary | Action::RejectSummary, _) => {
                Self::reject_summary(&mut state);
                vec![Outgoing::replacing(REPHRASE)]
            }
        };

        self.store.save(&state).await?;
        Ok(replies)
    }

    /// Begin collecting a mistake description.
    pub async fn start_intake(&self, user_id: i64) -> anyhow::Result<Vec<Outgoing>> {
        let mut state = self.store.load(user_id).await?;
        Self::open_intake(&mut state);
        self.store.save(&state).await?;

        info!("User {user_id} started mistake intake");
        Ok(vec![Outgoing::menu(intake::START_PROMPT)])
    }

    /// Forget the user's dialogue context.
    pub async fn reset(&self, user_id: i64) -> anyhow::Result<Vec<Outgoing>> {
        self.store.reset(user_id).await?;
        Ok(vec![Outgoing::menu(RESET_DONE)])
    }

    /// Render the most recent mistake-log entries.
    pub async fn mistakes(&self, user_id: i64) -> anyhow::Result<Vec<Outgoing>> {
        let entries = self.log.recent(user_id, RECENT_MISTAKES).await?;
        if entries.is_empty() {
            return Ok(vec![Outgoing::menu(EMPTY_LOG)]);
        }

        let mut text = String::from("📓 Журнал ошибок:\n");
        for (i, entry) in entries.iter().enumerate() {
            let _ = write!(
                text,
                "\n{}. {} — {}\n   {}",
                i + 1,
                entry.created_at.format("%d.%m.%Y"),
                entry.summary,
                entry.triggers
            );
        }
        Ok(vec![Outgoing::menu(text)])
    }

    fn open_intake(state: &mut UserState) {
        state.intent = Intent::Error;
        state.data.clear_flow();
        state.data.phase = Some(IntakePhase::Free);
    }

    fn reject_summary(state: &mut UserState) {
        state.data.summary = None;
        state.data.round = 0;
        if state.intent == Intent::Error {
            state.data.phase = Some(IntakePhase::Free);
        } else {
            state.data.problem_confirmed = false;
            state.data.coach.stage = CoachLoop::Explore;
        }
    }

    fn begin_breakdown(state: &mut UserState, summary: &str) -> Vec<Outgoing> {
        state.intent = Intent::ErrorMercedes;
        state.data.phase = None;
        state.data.step = 0;
        state.data.answers.clear();
        state.data.summary = Some(summary.to_string());

        let mut replies = vec![Outgoing::replacing(format!(
            "{}\n\nПойдём коротко по MERCEDES, чтобы увидеть паттерн.",
            accepted(summary)
        ))];
        if let Some(step) = mercedes::step(0) {
            replies.push(Outgoing::menu(step.question));
        }
        replies
    }

    fn intake_turn(&self, state: &mut UserState, text: &str) -> Vec<Outgoing> {
        let step = intake::advance(
            &mut state.data,
            text,
            self.config().free_rounds,
            self.config().max_notes,
        );
        debug!(
            "User {} intake round {}: {step:?}",
            state.user_id, state.data.round
        );

        match step {
            IntakeStep::AskConcrete => vec![Outgoing::menu(intake::ASK_CONCRETE)],
            IntakeStep::AskBehavior => vec![Outgoing::menu(intake::ASK_BEHAVIOR)],
            IntakeStep::FollowUp(question) => vec![Outgoing::menu(question)],
            IntakeStep::Propose(summary) => {
                vec![Outgoing::new(confirm_prompt(&summary), Markup::ConfirmSummary)]
            }
        }
    }

    async fn breakdown_turn(
        &self,
        state: &mut UserState,
        text: &str,
    ) -> anyhow::Result<Vec<Outgoing>> {
        let index = state.data.step;
        if let Some(step) = mercedes::step(index) {
            state.data.answers.insert(step.key.to_string(), text.to_string());
        }

        if !mercedes::is_last(index) {
            state.data.step = index + 1;
            if let Some(next) = mercedes::step(state.data.step) {
                return Ok(vec![Outgoing::menu(next.question)]);
            }
        }

        self.finish_breakdown(state).await
    }

    async fn finish_breakdown(&self, state: &mut UserState) -> anyhow::Result<Vec<Outgoing>> {
        let summary = state
            .data
            .summary
            .clone()
            .unwrap_or_else(|| "—".to_string());

        let mut evidence = state.data.history.clone();
        evidence.extend(state.data.answers.values().map(ChatMessage::user));
        let triggers = patterns::problem_summary(&evidence);

        let entry = MistakeEntry::new(
            state.user_id,
            summary.clone(),
            triggers.clone(),
            state.data.answers.clone(),
        );
        self.log.record(&entry).await?;

        let mut recap = format!("Готово ✅ Записал в журнал ошибок.\n\n— {summary}\n{triggers}\n");
        for step in &mercedes::STEPS {
            if let Some(answer) = entry.answers.get(step.key) {
                let _ = write!(recap, "\n{}: {answer}", step.title);
            }
        }

        state.intent = Intent::Idle;
        state.data.clear_flow();
        state.data.problem_confirmed = false;
        state.data.coach = CoachState::default();

        info!("User {} completed breakdown {}", state.user_id, entry.id);
        Ok(vec![Outgoing::menu(recap)])
    }

    async fn coach_turn(&self, state: &mut UserState, text: &str) -> Vec<Outgoing> {
        let outcome = self.engine.process_turn(&state.data, text).await;
        let limit = self.config().history_limit;
        let data = &mut state.data;

        data.coach = outcome.coach;
        for (key, value) in outcome.store {
            if key == "style" {
                if let Value::String(style) = &value {
                    if !style.trim().is_empty() {
                        data.style = style.trim().to_string();
                        continue;
                    }
                }
            }
            data.store.insert(key, value);
        }
        data.push_history(ChatMessage::user(text), limit);
        data.push_history(ChatMessage::assistant(outcome.reply.clone()), limit);

        if outcome.ask_confirm && !outcome.propose_summary.is_empty() {
            data.summary = Some(outcome.propose_summary.clone());
            return vec![
                Outgoing::menu(outcome.reply),
                Outgoing::new(
                    confirm_prompt(&outcome.propose_summary),
                    Markup::ConfirmSummary,
                ),
            ];
        }

        if outcome.suggest_struct {
            return vec![Outgoing::new(outcome.reply, Markup::StartStructure)];
        }

        vec![Outgoing::menu(outcome.reply)]
    }
}
