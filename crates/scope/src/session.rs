//! Session snapshots and their storage seam.
//!
//! Sessions are owned by the session subsystem; the consistency layer only
//! reads them and writes `scope_version`, `last_scope_check_at` and
//! `is_active`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_core::{ScopeKey, SessionId};
use tessera_rbac::Capability;

use crate::store::StoreError;

/// A session's view of the principal's authorization at issuance time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub key: ScopeKey,
    /// Capabilities at issuance (carried inside the token as well).
    pub capabilities: Vec<Capability>,
    /// Scope version at issuance.
    pub scope_version: u64,
    pub expires_at: DateTime<Utc>,
    pub last_scope_check_at: DateTime<Utc>,
    pub is_active: bool,
}

impl SessionSnapshot {
    /// Issue a session against the current scope state.
    pub fn issue(
        id: SessionId,
        key: ScopeKey,
        capabilities: Vec<Capability>,
        scope_version: u64,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            key,
            capabilities,
            scope_version,
            expires_at,
            last_scope_check_at: now,
            is_active: true,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Reference to a session the reconciliation sweep flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    pub session: SessionId,
    pub key: ScopeKey,
    /// The version the session still carries.
    pub scope_version: u64,
    /// The current version for its key at sweep time.
    pub current_version: u64,
}

/// Storage seam for session snapshots.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &SessionId) -> Result<Option<SessionSnapshot>, StoreError>;

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

    /// All sessions (active or not) for one scope key.
    fn sessions_for(&self, key: &ScopeKey) -> Result<Vec<SessionSnapshot>, StoreError>;

    /// Every active session across keys (the sweep input).
    fn active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError>;

    /// Logically deactivate a session; returns whether it was active.
    fn deactivate(&self, id: &SessionId) -> Result<bool, StoreError>;

    /// Record a successful scope check.
    fn touch_scope_check(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// In-memory session store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionSnapshot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &SessionId) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    fn sessions_for(&self, key: &ScopeKey) -> Result<Vec<SessionSnapshot>, StoreError> {
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| &s.key == key)
            .cloned()
            .collect())
    }

    fn active_sessions(&self) -> Result<Vec<SessionSnapshot>, StoreError> {
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    fn deactivate(&self, id: &SessionId) -> Result<bool, StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(id) {
            Some(session) if session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn touch_scope_check(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(session) = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(id)
        {
            session.last_scope_check_at = at;
        }
        Ok(())
    }
}
