//! Session transcript controller.
//!
//! Owns the message history of the single active session and mediates
//! the send/receive protocol: optimistic local append, then wholesale
//! replacement with the re-fetched authoritative transcript. Replacing
//! instead of merging means speculative state can never duplicate or
//! lose messages.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::Message;

/// Two-phase exchange state for the active session. Exactly one
/// exchange may be outstanding at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    /// A send is outstanding; further sends are rejected until it
    /// settles.
    Pending,
    /// The last exchange failed. The optimistic user message is kept
    /// visible rather than rolled back; the reason is recorded here
    /// and cleared by the next send or selection change.
    Failed(String),
}

/// What a [`TranscriptController::send_message`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The exchange completed and the transcript was reconciled (or
    /// the result was discarded as stale after navigation).
    Sent,
    /// Empty text or no active session; nothing happened.
    Ignored,
    /// An exchange is already pending; the call was rejected.
    Busy,
}

#[derive(Debug, Default)]
struct TranscriptState {
    active: Option<i64>,
    messages: Vec<Message>,
    exchange: ExchangeState,
    /// Bumped on every selection change or reset. In-flight
    /// continuations compare against it after each await and drop
    /// stale results instead of applying them.
    generation: u64,
}

/// Controller for the active session's transcript.
pub struct TranscriptController {
    gateway: Arc<dyn Gateway>,
    state: Mutex<TranscriptState>,
}

impl TranscriptController {
    /// Create a controller over the given gateway.
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            state: Mutex::new(TranscriptState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TranscriptState> {
        self.state.lock().expect("transcript state poisoned")
    }

    /// Get the active session id, if any.
    pub fn active_session(&self) -> Option<i64> {
        self.lock().active
    }

    /// Snapshot the current transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Whether an exchange is outstanding.
    pub fn is_loading(&self) -> bool {
        self.lock().exchange == ExchangeState::Pending
    }

    /// The last exchange failure, if the controller is in that state.
    pub fn last_error(&self) -> Option<String> {
        match &self.lock().exchange {
            ExchangeState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Drop the selection, transcript, and any in-flight effect
    /// (sign-out and active-session deletion).
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.active = None;
        state.messages.clear();
        state.exchange = ExchangeState::Idle;
    }

    /// Make `session_id` the active selection and replace the local
    /// transcript with a full authoritative fetch. Any exchange still
    /// in flight for the previous selection is invalidated: its result
    /// will be dropped on arrival.
    #[instrument(skip(self))]
    pub async fn select_session(&self, session_id: i64) -> Result<()> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.active = Some(session_id);
            state.messages.clear();
            state.exchange = ExchangeState::Idle;
            state.generation
        };

        match self.gateway.fetch_transcript(session_id).await {
            Ok(transcript) => {
                let mut state = self.lock();
                if state.generation == generation {
                    state.messages = transcript;
                } else {
                    debug!(session_id, "dropping transcript for superseded selection");
                }
                Ok(())
            }
            Err(err) => {
                let stale = self.lock().generation != generation;
                if stale {
                    debug!(session_id, "ignoring fetch failure for superseded selection");
                    Ok(())
                } else {
                    warn!(session_id, %err, "transcript fetch failed");
                    Err(err)
                }
            }
        }
    }

    /// Submit a user message to the active session.
    ///
    /// The message is appended locally before the network confirms
    /// anything; on success the transcript is replaced wholesale with
    /// the re-fetched authoritative copy, which both confirms the
    /// optimistic message and surfaces the reply. Empty text or a
    /// missing selection is a no-op, and a second call while one
    /// exchange is pending is rejected rather than interleaved.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        let (session_id, generation) = {
            let mut state = self.lock();
            let Some(session_id) = state.active else {
                return Ok(SendOutcome::Ignored);
            };
            if text.is_empty() {
                return Ok(SendOutcome::Ignored);
            }
            if state.exchange == ExchangeState::Pending {
                debug!(session_id, "rejecting send while an exchange is pending");
                return Ok(SendOutcome::Busy);
            }
            state.messages.push(Message::user(text));
            state.exchange = ExchangeState::Pending;
            (session_id, state.generation)
        };

        let result = match self.gateway.exchange(session_id, text).await {
            Ok(()) => self.gateway.fetch_transcript(session_id).await,
            Err(err) => Err(err),
        };

        let mut state = self.lock();
        if state.generation != generation {
            // The user navigated away while the exchange was in
            // flight; the response must not touch the current state.
            debug!(session_id, "dropping stale exchange result");
            return Ok(SendOutcome::Sent);
        }
        match result {
            Ok(transcript) => {
                state.messages = transcript;
                state.exchange = ExchangeState::Idle;
                Ok(SendOutcome::Sent)
            }
            Err(err) => {
                warn!(session_id, %err, "exchange failed");
                state.exchange = ExchangeState::Failed(err.to_string());
                Err(err)
            }
        }
    }
}
