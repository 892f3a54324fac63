//! Shared handle to the (possibly not yet negotiated) authorization key.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mtcore_crypto::AuthKey;
use tokio::sync::watch;

use crate::errors::{Error, Result};

#[derive(Clone)]
enum KeyState {
    Pending,
    Ready(AuthKey),
    Closed,
}

/// Where the authorization key will appear once the key exchange finishes.
///
/// Cloning shares the slot: the connection sets the key, the protocol state
/// reads or awaits it.
#[derive(Clone)]
pub struct AuthKeySlot {
    state: Arc<watch::Sender<KeyState>>,
}

impl AuthKeySlot {
    /// An empty slot awaiting a key.
    pub fn pending() -> Self {
        let (tx, _) = watch::channel(KeyState::Pending);
        Self { state: Arc::new(tx) }
    }

    /// A slot that already holds `key`.
    pub fn ready(key: AuthKey) -> Self {
        let (tx, _) = watch::channel(KeyState::Ready(key));
        Self { state: Arc::new(tx) }
    }

    /// Publish the negotiated key, waking every waiter.
    pub fn set(&self, key: AuthKey) {
        self.state.send_replace(KeyState::Ready(key));
    }

    /// Give up on the key; current and future waiters fail with
    /// [`Error::AuthKeyUnset`] until a key is set again.
    pub fn close(&self) {
        self.state.send_replace(KeyState::Closed);
    }

    /// The key, if available right now.
    pub fn get(&self) -> Option<AuthKey> {
        match &*self.state.borrow() {
            KeyState::Ready(key) => Some(key.clone()),
            _ => None,
        }
    }

    /// The key identifier, if a key is available.
    pub fn key_id(&self) -> Option<[u8; 8]> {
        match &*self.state.borrow() {
            KeyState::Ready(key) => Some(key.key_id()),
            _ => None,
        }
    }

    /// Wait until the key is available.
    ///
    /// Fails with [`Error::AuthKeyUnset`] if the slot is closed or `timeout`
    /// elapses first. Dropping the future cancels the wait.
    pub async fn wait_until_ready(&self, timeout: Option<Duration>) -> Result<AuthKey> {
        let mut rx = self.state.subscribe();
        let wait = async move {
            let state = rx
                .wait_for(|s| !matches!(s, KeyState::Pending))
                .await
                .map_err(|_| Error::AuthKeyUnset)?;
            match &*state {
                KeyState::Ready(key) => Ok(key.clone()),
                _ => Err(Error::AuthKeyUnset),
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                log::debug!("[mtcore] Gave up waiting for auth key after {limit:?}");
                Error::AuthKeyUnset
            })?,
            None => wait.await,
        }
    }
}

impl Default for AuthKeySlot {
    fn default() -> Self { Self::pending() }
}

impl fmt::Debug for AuthKeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            KeyState::Pending    => write!(f, "AuthKeySlot(pending)"),
            KeyState::Ready(key) => write!(f, "AuthKeySlot({key:?})"),
            KeyState::Closed     => write!(f, "AuthKeySlot(closed)"),
        }
    }
}
