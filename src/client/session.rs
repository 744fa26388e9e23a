// src/client/session.rs
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use super::transport::ClientError;
use crate::message::ChatRequest;

pub const NO_RESPONSE: &str = "No response from server";
pub const FAILED_TURN: &str = "Something went wrong. Please try again.";
pub const PENDING_INDICATOR: &str = "Thinking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Millisecond timestamp, strictly increasing within a session.
    pub id: u64,
    pub role: Role,
    pub content: String,
    /// Bot entry standing in for a turn that failed.
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Pending,
}

/// How an outbound request settled.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The relay answered; `None` when the body carried no message.
    Reply(Option<String>),
    Failed(ClientError),
}

/// Ordered snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub entries: Vec<Message>,
    pub pending: bool,
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let who = match entry.role {
                Role::User => "you",
                Role::Bot => "bot",
            };
            writeln!(f, "{who}> {}", entry.content)?;
        }
        if self.pending {
            writeln!(f, "bot> {PENDING_INDICATOR}")?;
        }
        Ok(())
    }
}

/// One browser-session worth of conversation: the thread id, the message
/// log and the idle/pending request gate.
#[derive(Debug, Clone)]
pub struct ChatSession {
    thread_id: String,
    messages: Vec<Message>,
    phase: RequestPhase,
    draft: String,
    last_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_thread_id(Uuid::new_v4().to_string())
    }

    pub fn with_thread_id(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            phase: RequestPhase::Idle,
            draft: String::new(),
            last_id: 0,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == RequestPhase::Pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Submit the input buffer. The buffer is kept when the submission is refused.
    pub fn submit_draft(&mut self) -> Option<ChatRequest> {
        let text = self.draft.clone();
        self.begin_submit(&text)
    }

    /// `idle --submit--> pending`. Appends the user message and returns the
    /// request to send, or `None` (nothing changed) when the text is blank
    /// or a request is already outstanding.
    pub fn begin_submit(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || self.is_pending() {
            return None;
        }

        self.push(Role::User, text.to_string(), false);
        self.draft.clear();
        self.phase = RequestPhase::Pending;
        Some(ChatRequest::new(self.thread_id.clone(), text))
    }

    /// `pending --settle--> idle`. Returns the appended bot entry; settling
    /// an idle session does nothing.
    pub fn settle(&mut self, outcome: TurnOutcome) -> Option<&Message> {
        if !self.is_pending() {
            return None;
        }
        self.phase = RequestPhase::Idle;

        match outcome {
            TurnOutcome::Reply(reply) => {
                let content = reply
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| NO_RESPONSE.to_string());
                self.push(Role::Bot, content, false);
            }
            TurnOutcome::Failed(_) => self.push(Role::Bot, FAILED_TURN.to_string(), true),
        }
        self.messages.last()
    }

    pub fn render(&self) -> Transcript {
        Transcript {
            entries: self.messages.clone(),
            pending: self.is_pending(),
        }
    }

    fn push(&mut self, role: Role, content: String, is_error: bool) {
        let id = now_millis().max(self.last_id + 1);
        self.last_id = id;
        self.messages.push(Message {
            id,
            role,
            content,
            is_error,
        });
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
