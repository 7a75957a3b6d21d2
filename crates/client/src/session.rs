//! One client-side conversation and its streaming send loop.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use parking_lot::Mutex;

use wf_domain::text::Utf8Decoder;
use wf_domain::turn::{ChatApiRequest, HistoryEntry, Turn, TurnId, TurnIdGen, TurnKind, UserProfile};

use crate::error::ClientError;
use crate::transport::ChatTransport;

#[derive(Debug, Default)]
struct SessionState {
    ids: TurnIdGen,
    turns: Vec<Turn>,
    error: Option<String>,
}

/// A conversation bound to one transport.
///
/// At most one send is in flight at a time. The response turn of that send
/// is updated through the id returned when it was created, so concurrent
/// reads of [`turns`](Self::turns) always see a consistent list.
pub struct ChatSession<T> {
    transport: T,
    profile: Option<UserProfile>,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a send ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            profile: None,
            state: Mutex::new(SessionState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Attach the profile sent with every request.
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = (!profile.is_empty()).then_some(profile);
        self
    }

    /// Send `text` and wait for the full response.
    ///
    /// Returns the id of the response turn.
    pub async fn send(&self, text: &str) -> Result<TurnId, ClientError> {
        self.send_with(text, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `on_update` with the response turn
    /// each time its content grows.
    pub async fn send_with<F>(&self, text: &str, mut on_update: F) -> Result<TurnId, ClientError>
    where
        F: FnMut(&Turn) + Send,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        let request = {
            let mut st = self.state.lock();
            st.error = None;
            let conversation_history = st
                .turns
                .iter()
                .filter(|t| !t.is_error() && !t.content.is_empty())
                .map(HistoryEntry::from)
                .collect();
            let id = st.ids.next(TurnKind::User);
            st.turns.push(Turn::new(id, text));
            ChatApiRequest {
                message: text.to_string(),
                user_answers: self.profile.clone(),
                conversation_history,
            }
        };

        let mut body = match self.transport.open(&request).await {
            Ok(body) => body,
            Err(e) => {
                self.record_error(&e);
                return Err(e);
            }
        };

        let reply_id = {
            let mut st = self.state.lock();
            let id = st.ids.next(TurnKind::Ai);
            st.turns.push(Turn::new(id, ""));
            id
        };

        let mut decoder = Utf8Decoder::new();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    let decoded = decoder.push(&bytes);
                    if let Some(turn) = self.append(reply_id, &decoded) {
                        on_update(&turn);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, turn = %reply_id, "response stream failed");
                    self.record_error(&e);
                    return Err(e);
                }
            }
        }

        let rest = decoder.finish();
        if let Some(turn) = self.append(reply_id, &rest) {
            on_update(&turn);
        }

        Ok(reply_id)
    }

    /// Append `text` to the turn `id`. Returns a snapshot when it changed.
    fn append(&self, id: TurnId, text: &str) -> Option<Turn> {
        if text.is_empty() {
            return None;
        }
        let mut st = self.state.lock();
        // Gone after a reset; nothing left to update.
        let turn = st.turns.iter_mut().find(|t| t.id == id)?;
        turn.content.push_str(text);
        Some(turn.clone())
    }

    fn record_error(&self, err: &ClientError) {
        let mut st = self.state.lock();
        let id = st.ids.next(TurnKind::Error);
        st.turns.push(Turn::new(id, format!("❌ {err}")));
        st.error = Some(err.to_string());
    }

    /// Snapshot of every turn, oldest first.
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().turns.clone()
    }

    pub fn turn(&self, id: TurnId) -> Option<Turn> {
        self.state.lock().turns.iter().find(|t| t.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The last failure, until cleared or the next send starts.
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    /// Drop the conversation and restart turn ids.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        st.turns.clear();
        st.ids.reset();
        st.error = None;
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }
}
