//! The coaching conversation loop.
//!
//! A conversation moves through three loops:
//! - `explore`: calibration questions, no advice;
//! - `summarize`: restate the problem and ask the user to confirm it;
//! - `structure`: the problem is confirmed, offer the step-by-step breakdown.

use kai_config::CoachConfig;
use kai_core::{ChatMessage, ChatRequest, CoachLoop, CoachState, LLMProvider, Role, StateData};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{clarity, patterns, templates};

const EXPLORE_EMPTY_REPLY: &str = "Давай на примере: где/когда это было и что именно сделал?";
const EXPLORE_FALLBACK: &str = "Окей, уточню: когда именно в последний раз это случилось и что сделал?";
const SUMMARIZE_EMPTY_REPLY: &str = "Похоже, мы близко — сформулирую одной строкой и сверимся.";
const SUMMARIZE_FALLBACK: &str = "Соберу в одну строку и сверимся, окей?";
pub const STRUCTURE_REPLY: &str = "Готов пройтись по шагам и собрать краткий план изменений?";

/// Turns after which calibration may end on clarity alone.
const MIN_EXPLORE_TURNS: u32 = 3;
const CLARITY_THRESHOLD: f32 = 0.55;

fn explore_prompt(style: &str) -> String {
    format!(
        "Ты — Кай, коуч-наставник по трейдингу. Общайся живо, обращайся на «{style}».\n\
         Фаза — калибровка: уточняй контекст, эмоции и мысли; без советов и техник.\n\
         Короткие вопросы, отражение смысла.\n\
         Ответ — JSON-объект с полями response_text (строка) и store (объект с фактами о пользователе)."
    )
}

fn summarize_prompt(style: &str) -> String {
    format!(
        "Ты — Кай, коуч-наставник по трейдингу, обращайся на «{style}».\n\
         Сформулируй проблему словами пользователя одной строкой и попроси подтвердить.\n\
         Без советов и техник.\n\
         Ответ — JSON-объект с полями response_text (строка), propose_summary (строка), ask_confirm (bool)."
    )
}

/// Result of one coaching turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Coach progress to store for the next turn.
    pub coach: CoachState,
    /// Facts to merge into the user's store.
    pub store: Map<String, Value>,
    pub ask_confirm: bool,
    pub propose_summary: String,
    pub suggest_struct: bool,
}

struct ExploreReply {
    text: String,
    store: Map<String, Value>,
}

struct SummarizeReply {
    text: String,
    propose_summary: String,
    ask_confirm: bool,
}

fn parse_object(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected a JSON object, got {other}"),
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "да"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// Runs coaching turns against an LLM provider.
pub struct CoachEngine<P> {
    provider: P,
    config: CoachConfig,
}

impl<P: LLMProvider> CoachEngine<P> {
    pub const fn new(provider: P, config: CoachConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Process one user message against the stored state.
    ///
    /// Provider failures are logged and answered with a fixed follow-up, so
    /// this never fails.
    pub async fn process_turn(&self, data: &StateData, user_text: &str) -> TurnOutcome {
        let clarity = clarity::measure(&data.history);
        let turns = data.coach.turns + 1;
        let mut stage = data.coach.stage;
        if data.problem_confirmed {
            stage = CoachLoop::Structure;
        }

        let mut outcome = TurnOutcome {
            reply: String::new(),
            coach: CoachState {
                clarity: (clarity * 100.0).round() / 100.0,
                turns,
                stage,
            },
            store: Map::new(),
            ask_confirm: false,
            propose_summary: String::new(),
            suggest_struct: false,
        };

        debug!("Coach turn {turns}: loop={stage:?}, clarity={clarity:.2}");

        match stage {
            CoachLoop::Explore => {
                let reply = self.explore(data, user_text).await;
                outcome.reply = reply.text;
                outcome.store = reply.store;

                let forced = patterns::should_force_structural(user_text);
                if forced || (turns >= MIN_EXPLORE_TURNS && clarity >= CLARITY_THRESHOLD) {
                    info!("Calibration complete (forced={forced}), moving to summarize");
                    outcome.coach.stage = CoachLoop::Summarize;
                }
            }
            CoachLoop::Summarize => {
                let reply = self.summarize(data, user_text).await;
                outcome.reply = reply.text;
                outcome.ask_confirm = reply.ask_confirm;
                outcome.propose_summary = reply.propose_summary;

                if !outcome.ask_confirm || outcome.propose_summary.is_empty() {
                    outcome.coach.stage = CoachLoop::Explore;
                }
            }
            CoachLoop::Structure => {
                outcome.reply = STRUCTURE_REPLY.to_string();
                outcome.suggest_struct = true;
            }
        }

        outcome
    }

    fn build_request(
        &self,
        system: String,
        history: &[ChatMessage],
        user_text: &str,
        temperature: f32,
    ) -> ChatRequest {
        let start = history.len().saturating_sub(self.config.history_window);
        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(
            history[start..]
                .iter()
                .filter(|m| matches!(m.role, Role::User | Role::Assistant))
                .cloned(),
        );
        messages.push(ChatMessage::user(user_text));

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
            max_tokens: self.config.max_tokens,
            json_mode: true,
        }
    }

    async fn complete_object(&self, request: &ChatRequest) -> anyhow::Result<Map<String, Value>> {
        let response = self.provider.chat(request).await?;
        let raw = if response.content.trim().is_empty() {
            "{}"
        } else {
            response.content.as_str()
        };
        parse_object(raw)
    }

    async fn explore(&self, data: &StateData, user_text: &str) -> ExploreReply {
        let request = self.build_request(
            explore_prompt(&data.style),
            &data.history,
            user_text,
            self.config.explore_temperature,
        );

        match self.complete_object(&request).await {
            Ok(mut map) => {
                let text = templates::strip_templates(str_field(&map, "response_text"));
                let store = match map.remove("store") {
                    Some(Value::Object(store)) => store,
                    _ => Map::new(),
                };
                ExploreReply {
                    text: if text.is_empty() {
                        EXPLORE_EMPTY_REPLY.to_string()
                    } else {
                        text
                    },
                    store,
                }
            }
            Err(e) => {
                warn!("Explore completion failed: {e}");
                ExploreReply {
                    text: EXPLORE_FALLBACK.to_string(),
                    store: Map::new(),
                }
            }
        }
    }

    async fn summarize(&self, data: &StateData, user_text: &str) -> SummarizeReply {
        let request = self.build_request(
            summarize_prompt(&data.style),
            &data.history,
            user_text,
            self.config.summarize_temperature,
        );

        match self.complete_object(&request).await {
            Ok(map) => {
                let text = templates::strip_templates(str_field(&map, "response_text"));
                let propose_summary = str_field(&map, "propose_summary").trim().to_string();
                let ask_confirm = !propose_summary.is_empty() && truthy(map.get("ask_confirm"));
                SummarizeReply {
                    text: if text.is_empty() {
                        SUMMARIZE_EMPTY_REPLY.to_string()
                    } else {
                        text
                    },
                    propose_summary,
                    ask_confirm,
                }
            }
            Err(e) => {
                warn!("Summarize completion failed: {e}");
                SummarizeReply {
                    text: SUMMARIZE_FALLBACK.to_string(),
                    propose_summary: String::new(),
                    ask_confirm: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use serde_json::json;

    fn engine(provider: &ScriptedProvider) -> CoachEngine<ScriptedProvider> {
        CoachEngine::new(provider.clone(), CoachConfig::default())
    }

    #[tokio::test]
    async fn explore_strips_templates_and_returns_store() {
        let provider = ScriptedProvider::new([Ok(json!({
            "response_text": "Понимаю тебя. Что ты сделал после входа?",
            "store": {"market": "crypto"}
        })
        .to_string())]);
        let outcome = engine(&provider)
            .process_turn(&StateData::default(), "привет")
            .await;

        assert_eq!(outcome.reply, "Что ты сделал после входа");
        assert_eq!(outcome.store.get("market"), Some(&json!("crypto")));
        assert_eq!(outcome.coach.turns, 1);
        assert_eq!(outcome.coach.stage, CoachLoop::Explore);
        assert!(!outcome.suggest_struct);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_mode);
        assert!((requests[0].temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages.last().map(|m| m.content.as_str()), Some("привет"));
    }

    #[tokio::test]
    async fn risk_pattern_forces_summarize() {
        let provider = ScriptedProvider::new([Ok(json!({"response_text": "Когда это было?"}).to_string())]);
        let outcome = engine(&provider)
            .process_turn(&StateData::default(), "опять снял стоп")
            .await;
        assert_eq!(outcome.coach.stage, CoachLoop::Summarize);
        assert!(outcome.store.is_empty());
    }

    #[tokio::test]
    async fn clarity_moves_to_summarize_after_three_turns() {
        let mut data = StateData::default();
        data.coach.turns = 2;
        data.history = vec![ChatMessage::user(
            "вчера на прошлой неделе когда тогда в момент после входа в сделке стоп тейк план сетап лонг",
        )];
        let provider = ScriptedProvider::new([Ok(json!({"response_text": "Дальше?"}).to_string())]);
        let outcome = engine(&provider).process_turn(&data, "ну вот так").await;
        assert_eq!(outcome.coach.turns, 3);
        assert!((outcome.coach.clarity - 1.0).abs() < f32::EPSILON);
        assert_eq!(outcome.coach.stage, CoachLoop::Summarize);
    }

    #[tokio::test]
    async fn explore_falls_back_on_provider_error() {
        let provider = ScriptedProvider::new([Err("timeout".to_string())]);
        let outcome = engine(&provider)
            .process_turn(&StateData::default(), "привет")
            .await;
        assert_eq!(outcome.reply, EXPLORE_FALLBACK);
        assert!(outcome.store.is_empty());
    }

    #[tokio::test]
    async fn explore_falls_back_on_non_object_json() {
        let provider = ScriptedProvider::new([Ok("[1, 2]".to_string())]);
        let outcome = engine(&provider)
            .process_turn(&StateData::default(), "привет")
            .await;
        assert_eq!(outcome.reply, EXPLORE_FALLBACK);
    }

    #[tokio::test]
    async fn empty_explore_reply_uses_default_question() {
        let provider = ScriptedProvider::new([Ok(json!({"response_text": "Попробуй дышать."}).to_string())]);
        let outcome = engine(&provider)
            .process_turn(&StateData::default(), "привет")
            .await;
        assert_eq!(outcome.reply, EXPLORE_EMPTY_REPLY);
    }

    #[tokio::test]
    async fn summarize_with_confirmation_stays() {
        let mut data = StateData::default();
        data.coach.stage = CoachLoop::Summarize;
        let provider = ScriptedProvider::new([Ok(json!({
            "response_text": "Сверимся?",
            "propose_summary": " двигаю стоп из страха потерь ",
            "ask_confirm": true
        })
        .to_string())]);
        let outcome = engine(&provider).process_turn(&data, "да").await;
        assert!(outcome.ask_confirm);
        assert_eq!(outcome.propose_summary, "двигаю стоп из страха потерь");
        assert_eq!(outcome.coach.stage, CoachLoop::Summarize);
        assert!((provider.requests()[0].temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn summarize_without_summary_returns_to_explore() {
        let mut data = StateData::default();
        data.coach.stage = CoachLoop::Summarize;
        let provider = ScriptedProvider::new([Ok(json!({
            "response_text": "",
            "propose_summary": "",
            "ask_confirm": true
        })
        .to_string())]);
        let outcome = engine(&provider).process_turn(&data, "да").await;
        assert!(!outcome.ask_confirm);
        assert_eq!(outcome.reply, SUMMARIZE_EMPTY_REPLY);
        assert_eq!(outcome.coach.stage, CoachLoop::Explore);
    }

    #[tokio::test]
    async fn summarize_falls_back_on_error() {
        let mut data = StateData::default();
        data.coach.stage = CoachLoop::Summarize;
        let provider = ScriptedProvider::new([Ok("not json".to_string())]);
        let outcome = engine(&provider).process_turn(&data, "да").await;
        assert_eq!(outcome.reply, SUMMARIZE_FALLBACK);
        assert!(outcome.propose_summary.is_empty());
        assert_eq!(outcome.coach.stage, CoachLoop::Explore);
    }

    #[tokio::test]
    async fn confirmed_problem_enters_structure_without_llm() {
        let mut data = StateData::default();
        data.problem_confirmed = true;
        let provider = ScriptedProvider::new([]);
        let outcome = engine(&provider).process_turn(&data, "что дальше").await;
        assert_eq!(outcome.reply, STRUCTURE_REPLY);
        assert!(outcome.suggest_struct);
        assert_eq!(outcome.coach.stage, CoachLoop::Structure);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn request_uses_history_window() {
        let mut data = StateData::default();
        for i in 0..20 {
            data.history.push(ChatMessage::user(format!("u{i}")));
        }
        let provider = ScriptedProvider::new([Ok(json!({"response_text": "Ок, где?"}).to_string())]);
        engine(&provider).process_turn(&data, "now").await;

        let messages = &provider.requests()[0].messages;
        // system + 16 history + current
        assert_eq!(messages.len(), 18);
        assert_eq!(messages[1].content, "u4");
        assert!(messages[0].content.contains("«ты»"));
    }

    #[test]
    fn truthy_accepts_common_encodings() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!("true"))));
        assert!(truthy(Some(&json!(1))));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(None));
    }
}
