//! Chat client facade.
//!
//! Composes the three controllers around one shared gateway and wires
//! the cross-controller transitions: sign-out resets everything,
//! creating a session selects it, and deleting the active session
//! clears the selection.

use std::sync::Arc;

use crate::auth::AuthController;
use crate::error::{ClientError, Result};
use crate::gateway::Gateway;
use crate::identity::IdentityStore;
use crate::model::{Identity, SessionHandle};
use crate::registry::ConversationRegistry;
use crate::transcript::TranscriptController;

/// The client core: one identity, one session list, one active
/// transcript, each owned by its controller.
pub struct ChatClient {
    pub auth: AuthController,
    pub registry: ConversationRegistry,
    pub transcript: TranscriptController,
}

impl ChatClient {
    /// Build a client over the given gateway and identity store.
    pub fn new(gateway: Arc<dyn Gateway>, store: IdentityStore) -> Self {
        Self {
            auth: AuthController::new(gateway.clone(), store),
            registry: ConversationRegistry::new(gateway.clone()),
            transcript: TranscriptController::new(gateway),
        }
    }

    /// Restore a previous sign-in and load its session list. Returns
    /// `None` (signed out) when nothing usable is stored.
    pub async fn start(&self) -> Result<Option<Identity>> {
        let Some(identity) = self.auth.restore().await else {
            return Ok(None);
        };
        self.registry.refresh(identity.id).await?;
        Ok(Some(identity))
    }

    /// Sign in and load the identity's session list.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.sign_in(username, password).await?;
        self.registry.refresh(identity.id).await?;
        Ok(identity)
    }

    /// Sign out and reset the session list and transcript.
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.registry.clear();
        self.transcript.clear();
        Ok(())
    }

    /// Start a new session and make it the active selection.
    pub async fn new_session(&self) -> Result<SessionHandle> {
        let identity = self.require_identity()?;
        let session = self.registry.create(identity.id).await?;
        self.transcript.select_session(session.id).await?;
        Ok(session)
    }

    /// Delete a session. If it was the active selection, the selection
    /// becomes empty and the transcript is cleared.
    pub async fn delete_session(&self, session_id: i64) -> Result<()> {
        let identity = self.require_identity()?;
        let was_active = self.transcript.active_session() == Some(session_id);
        self.registry.delete(identity.id, session_id).await?;
        if was_active {
            self.transcript.clear();
        }
        Ok(())
    }

    fn require_identity(&self) -> Result<Identity> {
        self.auth
            .current()
            .ok_or_else(|| ClientError::auth("not signed in"))
    }
}
