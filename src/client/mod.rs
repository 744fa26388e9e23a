//! Conversation client: owns a [`ChatSession`] and drives one request at a
//! time through a [`ChatTransport`].

pub mod session;
pub mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

pub use session::{ChatSession, Message, RequestPhase, Role, Transcript, TurnOutcome};
pub use transport::{ChatTransport, ClientError, HttpTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Blank input, or a request was already in flight. Nothing changed.
    Ignored,
    /// Content of the bot entry that was appended.
    Replied(String),
    Failed(ClientError),
}

pub struct ChatClient<T> {
    session: Mutex<ChatSession>,
    transport: T,
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_session(ChatSession::new(), transport)
    }

    pub fn with_session(session: ChatSession, transport: T) -> Self {
        Self {
            session: Mutex::new(session),
            transport,
        }
    }

    pub fn thread_id(&self) -> String {
        self.session().thread_id().to_string()
    }

    pub fn is_pending(&self) -> bool {
        self.session().is_pending()
    }

    pub fn render(&self) -> Transcript {
        self.session().render()
    }

    /// Send `text` as the next turn. The user message is appended before the
    /// request goes out; a call made while another is pending is dropped.
    pub async fn submit(&self, text: &str) -> SubmitResult {
        let request = self.session().begin_submit(text);
        let Some(request) = request else {
            debug!("submission ignored");
            return SubmitResult::Ignored;
        };

        // Settles the turn as cancelled if this future is dropped mid-flight.
        let mut in_flight = InFlight {
            session: &self.session,
            thread_id: &request.thread_id,
            armed: true,
        };

        let outcome = match self.transport.send(&request).await {
            Ok(response) => TurnOutcome::Reply(response.message),
            Err(e) => {
                warn!(thread_id = %request.thread_id, error = %e, "chat request failed");
                TurnOutcome::Failed(e)
            }
        };
        in_flight.armed = false;

        let failure = match &outcome {
            TurnOutcome::Failed(e) => Some(e.clone()),
            TurnOutcome::Reply(_) => None,
        };

        let mut session = self.session();
        let appended = session.settle(outcome).map(|m| m.content.clone());
        match (failure, appended) {
            (Some(e), _) => SubmitResult::Failed(e),
            (None, Some(content)) => SubmitResult::Replied(content),
            (None, None) => SubmitResult::Ignored,
        }
    }

    fn session(&self) -> MutexGuard<'_, ChatSession> {
        lock(&self.session)
    }
}

struct InFlight<'a> {
    session: &'a Mutex<ChatSession>,
    thread_id: &'a str,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(thread_id = %self.thread_id, "chat request cancelled");
            lock(self.session).settle(TurnOutcome::Failed(ClientError::Cancelled));
        }
    }
}

fn lock(session: &Mutex<ChatSession>) -> MutexGuard<'_, ChatSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}
