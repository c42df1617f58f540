//! Shared in-memory gateway for controller tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use parley::error::{ClientError, Result};
use parley::gateway::Gateway;
use parley::model::{Identity, Message, SessionHandle};

/// Programmable gateway with the same semantics as the real backend:
/// an exchange appends the user message and a generated reply to the
/// persisted transcript.
pub struct MockGateway {
    /// username -> (password, user id)
    users: Mutex<HashMap<String, (String, i64)>>,
    /// (user id, session id), in creation order
    sessions: Mutex<Vec<(i64, i64)>>,
    transcripts: Mutex<HashMap<i64, Vec<Message>>>,
    next_id: AtomicI64,
    reply: Mutex<String>,
    exchange_calls: AtomicUsize,
    fail_next_exchange: Mutex<Option<String>>,
    fail_next_create: Mutex<Option<String>>,
    /// When set, exchanges block until a permit is released; lets
    /// tests interleave navigation with an in-flight exchange.
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            sessions: Mutex::new(Vec::new()),
            transcripts: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            reply: Mutex::new("hello!".to_string()),
            exchange_calls: AtomicUsize::new(0),
            fail_next_exchange: Mutex::new(None),
            fail_next_create: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn add_user(&self, username: &str, password: &str) -> i64 {
        let id = self.allocate_id();
        self.users
            .lock()
            .unwrap()
            .insert(username.to_string(), (password.to_string(), id));
        id
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_exchange(&self, reason: &str) {
        *self.fail_next_exchange.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_next_create(&self, reason: &str) {
        *self.fail_next_create.lock().unwrap() = Some(reason.to_string());
    }

    /// Block exchanges until [`release_exchange`](Self::release_exchange)
    /// grants a permit.
    pub fn pause_exchanges(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_exchange(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Server-side view of a session's transcript.
    pub fn server_transcript(&self, session_id: i64) -> Vec<Message> {
        self.transcripts
            .lock()
            .unwrap()
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let users = self.users.lock().unwrap();
        match users.get(username) {
            Some((stored, id)) if stored == password => Ok(Identity {
                id: *id,
                username: username.to_string(),
            }),
            _ => Err(ClientError::auth("Invalid username or password")),
        }
    }

    async fn register(&self, username: &str, password: &str) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(username) {
            return Err(ClientError::auth("Username already taken"));
        }
        let id = self.allocate_id();
        users.insert(username.to_string(), (password.to_string(), id));
        Ok(())
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionHandle>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, id)| SessionHandle { id: *id })
            .collect())
    }

    async fn create_session(&self, user_id: i64) -> Result<SessionHandle> {
        if let Some(reason) = self.fail_next_create.lock().unwrap().take() {
            return Err(ClientError::Transport(reason));
        }
        let id = self.allocate_id();
        self.sessions.lock().unwrap().push((user_id, id));
        Ok(SessionHandle { id })
    }

    async fn delete_session(&self, session_id: i64) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|(_, id)| *id != session_id);
        if sessions.len() == before {
            return Err(ClientError::NotFound("Not found".to_string()));
        }
        self.transcripts.lock().unwrap().remove(&session_id);
        Ok(())
    }

    async fn fetch_transcript(&self, session_id: i64) -> Result<Vec<Message>> {
        Ok(self.server_transcript(session_id))
    }

    async fn exchange(&self, session_id: i64, text: &str) -> Result<()> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(reason) = self.fail_next_exchange.lock().unwrap().take() {
            return Err(ClientError::Transport(reason));
        }

        let reply = self.reply.lock().unwrap().clone();
        let mut transcripts = self.transcripts.lock().unwrap();
        let transcript = transcripts.entry(session_id).or_default();
        transcript.push(Message::user(text));
        transcript.push(Message::assistant(reply));
        Ok(())
    }
}

/// Poll a condition until it holds or the test times out.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}
