//! Auth controller: sign-in/sign-out transitions and identity restore.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument};

use crate::error::{ClientError, Result};
use crate::gateway::Gateway;
use crate::identity::IdentityStore;
use crate::model::Identity;

/// Owns the signed-in identity. At most one identity is active at a
/// time; sign-out is a local reset with no network call.
pub struct AuthController {
    gateway: Arc<dyn Gateway>,
    store: IdentityStore,
    current: Mutex<Option<Identity>>,
}

impl AuthController {
    /// Create a controller over the given gateway and store.
    pub fn new(gateway: Arc<dyn Gateway>, store: IdentityStore) -> Self {
        Self {
            gateway,
            store,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Identity>> {
        self.current.lock().expect("identity state poisoned")
    }

    /// Get the signed-in identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.lock().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.lock().is_some()
    }

    /// Best-effort restore from the store at startup. Absent or
    /// corrupt data yields signed out, never an error.
    pub async fn restore(&self) -> Option<Identity> {
        let identity = self.store.load().await;
        if let Some(identity) = &identity {
            debug!(user_id = identity.id, "restored identity from store");
            *self.lock() = Some(identity.clone());
        }
        identity
    }

    /// Submit credentials; on success the identity is persisted and
    /// becomes current.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Identity> {
        require_credentials(username, password)?;
        let identity = self.gateway.login(username, password).await?;
        self.store.save(&identity).await?;
        *self.lock() = Some(identity.clone());
        info!(user_id = identity.id, username = %identity.username, "signed in");
        Ok(identity)
    }

    /// Create an account. Does not change the sign-in state; the user
    /// must sign in afterwards.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        require_credentials(username, password)?;
        self.gateway.register(username, password).await?;
        info!(username, "registered; sign-in still required");
        Ok(())
    }

    /// Clear the persisted and in-memory identity.
    pub async fn sign_out(&self) -> Result<()> {
        self.store.clear().await?;
        *self.lock() = None;
        info!("signed out");
        Ok(())
    }
}

fn require_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return Err(ClientError::Validation("username required".to_string()));
    }
    if password.is_empty() {
        return Err(ClientError::Validation("password required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_credentials() {
        assert!(require_credentials("alice", "pw1").is_ok());
        assert!(matches!(
            require_credentials("", "pw1"),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            require_credentials("alice", ""),
            Err(ClientError::Validation(_))
        ));
    }
}
