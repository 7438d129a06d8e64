use async_trait::async_trait;
use kai_core::{ChatRequest, LLMProvider, LLMResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Provider answering from a fixed script and recording every request.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedProvider {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            script: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LLMResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        next.map(|content| LLMResponse {
            content,
            usage: None,
        })
        .map_err(|e| anyhow::anyhow!(e))
    }

    fn get_default_model(&self) -> &str {
        "scripted"
    }
}
