//! Conversation registry: the signed-in identity's session list.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, instrument};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::SessionHandle;

/// Caches the identity's session list in server order. Mutations
/// re-fetch the list rather than editing it locally, so the cache
/// cannot drift from server truth.
pub struct ConversationRegistry {
    gateway: Arc<dyn Gateway>,
    sessions: Mutex<Vec<SessionHandle>>,
}

impl ConversationRegistry {
    /// Create a registry over the given gateway.
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            sessions: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionHandle>> {
        self.sessions.lock().expect("session list poisoned")
    }

    /// Get the cached session list.
    pub fn sessions(&self) -> Vec<SessionHandle> {
        self.lock().clone()
    }

    /// Drop the cached list (sign-out reset).
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Re-fetch the session list from the gateway. An empty list is a
    /// valid result, distinct from a fetch failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: i64) -> Result<Vec<SessionHandle>> {
        let sessions = self.gateway.list_sessions(user_id).await?;
        *self.lock() = sessions.clone();
        Ok(sessions)
    }

    /// Allocate a new session, then refresh so it is visible in the
    /// cached list. A failed create leaves the cache untouched.
    #[instrument(skip(self))]
    pub async fn create(&self, user_id: i64) -> Result<SessionHandle> {
        let session = self.gateway.create_session(user_id).await?;
        self.refresh(user_id).await?;
        info!(session_id = session.id, "created session");
        Ok(session)
    }

    /// Delete a session remotely, then refresh the cached list.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, session_id: i64) -> Result<()> {
        self.gateway.delete_session(session_id).await?;
        self.refresh(user_id).await?;
        info!(session_id, "deleted session");
        Ok(())
    }
}
