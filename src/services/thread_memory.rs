// src/services/thread_memory.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

#[derive(Clone, Debug)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Clone, Debug)]
struct Thread {
    turns: Vec<Turn>,
    last_active: Instant,
}

impl Thread {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_active: Instant::now(),
        }
    }
}

impl Thread {
    fn push(&mut self, role: TurnRole, content: String, now: Instant) {
        self.turns.push(Turn {
            role,
            content,
            timestamp: now,
        });
        self.last_active = now;
    }

    fn trim_to(&mut self, max_turns: usize) {
        let excess = self.turns.len().saturating_sub(max_turns);
        if excess > 0 {
            self.turns.drain(..excess);
        }
    }
}

pub const DEFAULT_MAX_TURNS: usize = 200;

/// Per-thread conversation history kept by generators, keyed by the
/// client's opaque thread id. Each thread keeps at most `max_turns` turns.
#[derive(Clone)]
pub struct ThreadMemory {
    inner: Arc<RwLock<HashMap<String, Thread>>>,
    max_turns: usize,
}

impl Default for ThreadMemory {
    fn default() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }
}

impl Debug for ThreadMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadMemory")
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}

impl ThreadMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_turns: max_turns.max(2),
        }
    }

    /// Append a turn, creating the thread on first use. Returns the new length.
    pub async fn append(&self, thread_id: &str, role: TurnRole, content: impl Into<String>) -> usize {
        let mut guard = self.inner.write().await;
        let thread = guard
            .entry(thread_id.to_string())
            .or_insert_with(Thread::new);
        thread.push(role, content.into(), Instant::now());
        thread.trim_to(self.max_turns);
        thread.turns.len()
    }

    /// Record a user message and its reply as adjacent turns under one lock,
    /// so concurrent exchanges on a thread never interleave.
    pub async fn append_exchange(
        &self,
        thread_id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> usize {
        let mut guard = self.inner.write().await;
        let thread = guard
            .entry(thread_id.to_string())
            .or_insert_with(Thread::new);
        let now = Instant::now();
        thread.push(TurnRole::User, user.into(), now);
        thread.push(TurnRole::Assistant, assistant.into(), now);
        thread.trim_to(self.max_turns);
        thread.turns.len()
    }

    /// Copy of the thread's turns, oldest first. `limit` keeps only the most recent ones.
    pub async fn history(&self, thread_id: &str, limit: Option<usize>) -> Vec<Turn> {
        let guard = self.inner.read().await;
        let Some(thread) = guard.get(thread_id) else {
            return Vec::new();
        };
        let skip = match limit {
            Some(n) => thread.turns.len().saturating_sub(n),
            None => 0,
        };
        thread.turns[skip..].to_vec()
    }

    pub async fn remove(&self, thread_id: &str) -> bool {
        self.inner.write().await.remove(thread_id).is_some()
    }

    /// Drop threads idle for at least `ttl`. Returns how many were removed.
    pub async fn purge_expired(&self, ttl: Duration) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, t| now.duration_since(t.last_active) < ttl);
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
