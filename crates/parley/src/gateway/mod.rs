//! Remote gateway boundary.
//!
//! Everything the client knows about the backend goes through the
//! [`Gateway`] trait; [`HttpGateway`] is the production implementation.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Identity, Message, SessionHandle};

/// Operations the backend exposes to the client.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchange credentials for an identity.
    async fn login(&self, username: &str, password: &str) -> Result<Identity>;

    /// Create an account. Success is a confirmation only; the caller
    /// must still sign in.
    async fn register(&self, username: &str, password: &str) -> Result<()>;

    /// List the identity's sessions in server order.
    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionHandle>>;

    /// Allocate a new session for the identity.
    async fn create_session(&self, user_id: i64) -> Result<SessionHandle>;

    /// Remove a session and its history.
    async fn delete_session(&self, session_id: i64) -> Result<()>;

    /// Fetch the full authoritative transcript for a session.
    async fn fetch_transcript(&self, session_id: i64) -> Result<Vec<Message>>;

    /// Submit a user message. The backend appends it and the generated
    /// reply to the persisted transcript; callers re-fetch the
    /// transcript to observe both.
    async fn exchange(&self, session_id: i64, text: &str) -> Result<()>;
}
