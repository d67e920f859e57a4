//! Process-wide credential shared by every transport call.
//!
//! The credential starts empty, is written once by authentication and then read
//! by every subsequent request. Authentication holds the write guard for the
//! whole login exchange so no request goes out half-authenticated; requests
//! hold a read guard while they are in flight.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Bearer token returned by the login endpoint.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a token, returning `None` if `value` is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the token text for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Cheaply cloneable handle to the shared credential.
#[derive(Debug, Clone, Default)]
pub struct SharedCredentials {
    inner: Arc<RwLock<Option<BearerToken>>>,
}

impl SharedCredentials {
    /// Creates an empty credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires shared access for the duration of one request.
    pub async fn read(&self) -> RwLockReadGuard<'_, Option<BearerToken>> {
        self.inner.read().await
    }

    /// Acquires exclusive access for the duration of a login exchange.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Option<BearerToken>> {
        self.inner.write().await
    }

    /// Returns a copy of the current token, if authenticated.
    pub async fn current(&self) -> Option<BearerToken> {
        self.inner.read().await.clone()
    }
}
