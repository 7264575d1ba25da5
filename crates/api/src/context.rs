use std::sync::Arc;

use uuid::Uuid;

use realty_identity::{Identity, Session};

/// Session bound to the request's bearer token.
#[derive(Debug, Clone)]
pub struct SessionContext {
    token: Uuid,
    session: Arc<Session>,
}

impl SessionContext {
    pub fn new(token: Uuid, session: Arc<Session>) -> Self {
        Self { token, session }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The identity this request acts for, captured once.
    ///
    /// A concurrent re-login replaces the session's identity but not this one.
    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.session.current()
    }
}
