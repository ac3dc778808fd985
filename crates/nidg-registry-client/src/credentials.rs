//! Bearer credential cache for the registry session.
//!
//! The registry issues an opaque access token from its login endpoint
//! and never reports how long the token remains valid. The cache assumes
//! a configurable lifetime, refreshes shortly before that window closes,
//! and treats an upstream 401 (surfaced via
//! [`CredentialCache::invalidate`]) as authoritative proof of expiry no
//! matter how much of the assumed window remains.
//!
//! ## Single-flight refresh
//!
//! The credential slot is guarded by an async mutex that stays held
//! across the login exchange. Concurrent callers that observe a stale
//! credential queue behind the one in-flight exchange and, once they
//! acquire the lock, find the refreshed credential already in the slot
//! instead of issuing their own exchange.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::RegistryError;

/// A bearer credential issued by the registry login endpoint.
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
struct Credential {
    token: String,
    expires_at: Instant,
}

impl Credential {
    fn new(token: String, ttl: Duration) -> Self {
        Self {
            token,
            expires_at: Instant::now() + ttl,
        }
    }

    /// A credential is usable only while the refresh margin still fits
    /// before its expiry.
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

/// Process-wide cache for the registry bearer token.
///
/// Owned by the [`crate::RegistryClient`] and injected wherever a token
/// is needed; there is no ambient global credential state.
pub struct CredentialCache {
    slot: Mutex<Option<Credential>>,
    ttl: Duration,
    margin: Duration,
}

impl CredentialCache {
    /// Create an empty cache with the given assumed token lifetime and
    /// refresh margin.
    pub fn new(ttl: Duration, margin: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
            margin,
        }
    }

    /// Return the cached token, or perform exactly one authentication
    /// exchange via `authenticate` and cache its result.
    ///
    /// The slot lock is held across the exchange, so at most one
    /// exchange is outstanding at any time. An exchange failure
    /// propagates to the caller and leaves the slot empty; it is never
    /// retried here.
    pub async fn get_valid<F, Fut>(&self, authenticate: F) -> Result<String, RegistryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, RegistryError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(credential) = slot.as_ref() {
            if credential.is_fresh(self.margin) {
                return Ok(credential.token.clone());
            }
        }

        let token = authenticate().await?;
        *slot = Some(Credential::new(token.clone(), self.ttl));
        Ok(token)
    }

    /// Drop the cached credential immediately.
    ///
    /// Called when the registry answers 401; the next
    /// [`get_valid`](Self::get_valid) re-authenticates.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}
