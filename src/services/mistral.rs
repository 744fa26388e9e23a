// src/services/mistral.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::generator::{GenerateError, Generator};
use super::thread_memory::{ThreadMemory, TurnRole};
use crate::config::MistralConfig;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint
/// (Mistral by default). Context is the thread's recent history.
#[derive(Debug, Clone)]
pub struct MistralGenerator {
    client: Client,
    config: MistralConfig,
    memory: ThreadMemory,
}

impl MistralGenerator {
    pub fn new(config: MistralConfig, memory: ThreadMemory) -> Self {
        Self {
            client: Client::new(),
            config,
            memory,
        }
    }

    fn completions_url(&self) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/chat/completions")
        }
    }

    async fn build_messages(&self, message: &str, thread_id: &str) -> Vec<CompletionMessage> {
        let history = self
            .memory
            .history(thread_id, Some(self.config.history_limit))
            .await;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(CompletionMessage {
            role: "system",
            content: self.config.system_prompt.clone(),
        });
        // The window must open on a user turn.
        let history = history
            .into_iter()
            .skip_while(|turn| turn.role == TurnRole::Assistant);
        messages.extend(history.map(|turn| CompletionMessage {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            },
            content: turn.content,
        }));
        messages.push(CompletionMessage {
            role: "user",
            content: message.to_string(),
        });
        messages
    }
}

#[async_trait]
impl Generator for MistralGenerator {
    async fn generate(&self, message: &str, thread_id: &str) -> Result<String, GenerateError> {
        let messages = self.build_messages(message, thread_id).await;
        debug!(thread_id, turns = messages.len(), model = %self.config.model, "calling completions");

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerateError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Upstream(format!("{status}: {body}")));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Decode(e.to_string()))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerateError::Decode("no choices in reply".to_string()))?
            .message
            .content
            .unwrap_or_default();

        self.memory.append_exchange(thread_id, message, reply.clone()).await;
        Ok(reply)
    }
}
