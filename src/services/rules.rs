// src/services/rules.rs
use async_trait::async_trait;

use super::generator::{GenerateError, Generator};
use super::thread_memory::{ThreadMemory, TurnRole};

#[derive(Debug, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    WebsiteRequest,
    Help,
    Unknown,
}

pub fn detect_intent(msg: &str) -> Intent {
    let msg_lower = msg.to_lowercase();
    let has_word = |w: &str| {
        msg_lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == w)
    };

    if has_word("hello") || has_word("hi") || has_word("hey") {
        Intent::Greeting
    } else if msg_lower.contains("web site") || msg_lower.contains("website") || msg_lower.contains("e-commerce") {
        Intent::WebsiteRequest
    } else if has_word("help") {
        Intent::Help
    } else {
        Intent::Unknown
    }
}

/// Template reply for `user_msg`. `earlier` holds the thread's previous
/// user messages, oldest first.
pub fn reply_for(earlier: &[String], user_msg: &str) -> String {
    use Intent::*;

    match detect_intent(user_msg) {
        Greeting => {
            if earlier.is_empty() {
                "Hi, how can I help you?".to_string()
            } else {
                "Hi again, what else can I help you with?".to_string()
            }
        }

        WebsiteRequest => {
            let asked_before = earlier.iter().any(|m| detect_intent(m) == WebsiteRequest);
            if asked_before {
                "Do you have any suggestions about your project?".to_string()
            } else {
                "Do you have a specific idea of your project and your budget?".to_string()
            }
        }

        Help => "I can answer questions and help you plan a website project. Just ask.".to_string(),

        Unknown => {
            if earlier.is_empty() {
                format!("Welcome! You said: {}", user_msg)
            } else {
                format!("I didn't quite understand: {}", user_msg)
            }
        }
    }
}

/// Offline generator answering from fixed templates.
#[derive(Debug, Clone, Default)]
pub struct RuleGenerator {
    memory: ThreadMemory,
}

impl RuleGenerator {
    pub fn new(memory: ThreadMemory) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Generator for RuleGenerator {
    async fn generate(&self, message: &str, thread_id: &str) -> Result<String, GenerateError> {
        let earlier: Vec<String> = self
            .memory
            .history(thread_id, None)
            .await
            .into_iter()
            .filter(|t| t.role == TurnRole::User)
            .map(|t| t.content)
            .collect();

        let reply = reply_for(&earlier, message);
        self.memory.append_exchange(thread_id, message, reply.clone()).await;
        Ok(reply)
    }
}
