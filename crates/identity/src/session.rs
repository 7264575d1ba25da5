//! Explicit session object owned by a front-end.

use std::sync::{Arc, RwLock};

use realty_core::LedgerResult;

use crate::identity::{Identity, load_identity};

/// Holds at most one active [`Identity`].
///
/// Switching identity replaces the whole `Arc`; callers that captured the
/// previous one keep using it unchanged until they drop it.
#[derive(Debug, Default)]
pub struct Session {
    current: RwLock<Option<Arc<Identity>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(identity))),
        }
    }

    /// Snapshot of the active identity, if any.
    pub fn current(&self) -> Option<Arc<Identity>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Load an identity from `secret` and make it current.
    ///
    /// On error the session is left exactly as it was.
    pub fn sign_in(&self, secret: &str) -> LedgerResult<Arc<Identity>> {
        let identity = Arc::new(load_identity(secret)?);
        self.swap(Some(identity.clone()));
        tracing::info!(address = %identity.address(), "session identity replaced");
        Ok(identity)
    }

    /// Make `identity` current, returning the one it replaced.
    pub fn replace(&self, identity: Identity) -> Option<Arc<Identity>> {
        self.swap(Some(Arc::new(identity)))
    }

    /// Drop the active identity.
    pub fn clear(&self) -> Option<Arc<Identity>> {
        self.swap(None)
    }

    fn swap(&self, next: Option<Arc<Identity>>) -> Option<Arc<Identity>> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const BOB: &str = "4646464646464646464646464646464646464646464646464646464646464646";

    #[test]
    fn sign_in_replaces_wholesale() {
        let session = Session::new();
        assert!(session.current().is_none());

        let alice = session.sign_in(ALICE).unwrap();
        let captured = session.current().unwrap();
        let bob = session.sign_in(BOB).unwrap();

        assert_eq!(captured.address(), alice.address());
        assert_eq!(session.current().unwrap().address(), bob.address());
        assert_ne!(alice.address(), bob.address());
    }

    #[test]
    fn failed_sign_in_keeps_previous_identity() {
        let session = Session::new();
        let alice = session.sign_in(ALICE).unwrap();

        assert!(session.sign_in("not-a-key").is_err());
        assert_eq!(session.current().unwrap().address(), alice.address());
    }

    #[test]
    fn clear_returns_previous() {
        let session = Session::with_identity(load_identity(ALICE).unwrap());
        let previous = session.clear().unwrap();
        assert_eq!(previous.address(), load_identity(ALICE).unwrap().address());
        assert!(session.current().is_none());
        assert!(session.clear().is_none());
    }

    #[test]
    fn replace_reports_old_identity() {
        let session = Session::new();
        assert!(session.replace(load_identity(ALICE).unwrap()).is_none());
        let old = session.replace(load_identity(BOB).unwrap()).unwrap();
        assert_eq!(old.address(), load_identity(ALICE).unwrap().address());
    }
}
