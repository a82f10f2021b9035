//! Per-request session consistency check.
//!
//! Called on every authenticated request. Token authenticity is delegated
//! to the external token validator — the checker receives its verdict and
//! adds the scope-version comparison on top. Policy for the outcomes lives
//! at the boundary: `Invalid` → 401, `Stale` → 403 with the
//! [`StaleScopeSignal`] payload plus proactive invalidation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_core::SessionId;

use crate::manager::ScopeVersionManager;
use crate::session::SessionStore;
use crate::store::StoreError;

/// Verdict of the external token validation (signature, decoding).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenVerdict {
    Verified,
    Expired,
    Unauthentic,
}

/// Outcome of a consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeCheck {
    /// Session is authentic and its scope snapshot is current.
    Valid,
    /// Authenticated, but permissions changed since issuance. The session
    /// should be proactively invalidated so it cannot be replayed.
    Stale {
        current_version: u64,
        token_version: u64,
    },
    /// Expired, unauthentic, or unknown session: reject outright.
    Invalid,
}

/// Machine-readable 403-class payload for a stale session (stable
/// contract): lets clients distinguish "not authenticated" from
/// "authenticated but permissions changed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleScopeSignal {
    pub error: String,
    pub current_version: u64,
    pub token_version: u64,
}

impl StaleScopeSignal {
    pub fn new(current_version: u64, token_version: u64) -> Self {
        Self {
            error: "scope_outdated".to_string(),
            current_version,
            token_version,
        }
    }
}

impl ScopeCheck {
    /// The boundary payload, for `Stale` outcomes only.
    pub fn stale_signal(&self) -> Option<StaleScopeSignal> {
        match self {
            Self::Stale {
                current_version,
                token_version,
            } => Some(StaleScopeSignal::new(*current_version, *token_version)),
            _ => None,
        }
    }
}

/// Read-mostly checker; safe to call concurrently across sessions.
pub struct SessionConsistencyChecker {
    manager: Arc<ScopeVersionManager>,
    sessions: Arc<dyn SessionStore>,
}

impl SessionConsistencyChecker {
    pub fn new(manager: Arc<ScopeVersionManager>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { manager, sessions }
    }

    /// Decide continue / reject-stale / reject-invalid for one session.
    ///
    /// On `Valid` the session's `last_scope_check_at` is updated (the only
    /// write); a store failure propagates so the caller rejects
    /// (fail-closed).
    pub fn check(
        &self,
        session_id: &SessionId,
        verdict: TokenVerdict,
        now: DateTime<Utc>,
    ) -> Result<ScopeCheck, StoreError> {
        if verdict != TokenVerdict::Verified {
            return Ok(ScopeCheck::Invalid);
        }

        let Some(session) = self.sessions.load(session_id)? else {
            return Ok(ScopeCheck::Invalid);
        };
        if !session.is_active || session.is_expired(now) {
            return Ok(ScopeCheck::Invalid);
        }

        let current_version = self.manager.version(&session.key)?;
        if session.scope_version < current_version {
            tracing::debug!(
                session = %session.id,
                token_version = session.scope_version,
                current_version,
                "session scope outdated"
            );
            return Ok(ScopeCheck::Stale {
                current_version,
                token_version: session.scope_version,
            });
        }

        self.sessions.touch_scope_check(session_id, now)?;
        Ok(ScopeCheck::Valid)
    }
}
