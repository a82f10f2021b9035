//! The scope version manager.
//!
//! Owns the monotonic per-key version counter and the change-event log.
//! `update` is the only mutation path: it compares the new snapshot to the
//! stored one as unordered sets, bumps the version by exactly 1 on an
//! actual change, persists, appends the change event, and pushes a
//! best-effort notification. A committed bump is never rolled back — it
//! records the fact that capabilities changed.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tessera_core::ScopeKey;
use tessera_events::{ChangeNotifier, NullNotifier};
use tessera_rbac::{Capability, RoleName};

use crate::config::ScopeConfig;
use crate::session::{SessionRef, SessionStore};
use crate::state::{ScopeChangeEvent, ScopeState};
use crate::store::{ScopeStore, StoreError};

pub struct ScopeVersionManager {
    store: Arc<dyn ScopeStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn ChangeNotifier>,
    config: ScopeConfig,
    /// Per-key serialization: two concurrent updates to the same key must
    /// not both read version N and both write N+1. The outer map lock is
    /// held only long enough to clone the per-key handle, so updates to
    /// different keys never contend.
    key_locks: Mutex<HashMap<ScopeKey, Arc<Mutex<()>>>>,
}

impl ScopeVersionManager {
    pub fn new(
        store: Arc<dyn ScopeStore>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn ChangeNotifier>,
        config: ScopeConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            notifier,
            config,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Manager without a push layer (sweep/pull only).
    pub fn without_notifier(
        store: Arc<dyn ScopeStore>,
        sessions: Arc<dyn SessionStore>,
        config: ScopeConfig,
    ) -> Self {
        Self::new(store, sessions, Arc::new(NullNotifier), config)
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    fn key_lock(&self, key: ScopeKey) -> Arc<Mutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key).or_default())
    }

    /// Current version for a key; 1 if the key has never been written.
    pub fn version(&self, key: &ScopeKey) -> Result<u64, StoreError> {
        Ok(self
            .store
            .load_state(key)?
            .map(|state| state.version)
            .unwrap_or(1))
    }

    /// Compare-and-bump the scope for one key.
    ///
    /// Identical content (as unordered sets, any element order) is a no-op
    /// returning the unchanged version: no write, no event. Otherwise the
    /// version increases by exactly 1 and a change event is appended.
    pub fn update(
        &self,
        key: ScopeKey,
        capabilities: impl IntoIterator<Item = Capability>,
        roles: impl IntoIterator<Item = RoleName>,
    ) -> Result<u64, StoreError> {
        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self
            .store
            .load_state(&key)?
            .unwrap_or_else(|| ScopeState::initial(key));

        let capabilities: BTreeSet<Capability> = capabilities.into_iter().collect();
        let roles: BTreeSet<RoleName> = roles.into_iter().collect();

        if current.same_content(&capabilities, &roles) {
            tracing::debug!(key = %key, version = current.version, "scope unchanged");
            return Ok(current.version);
        }

        let new_state = ScopeState {
            key,
            version: current.version + 1,
            capabilities,
            roles,
            updated_at: Utc::now(),
        };
        let event = ScopeChangeEvent::between(&current, &new_state);

        self.store.save_state(&new_state)?;
        self.store.append_event(&event)?;
        tracing::info!(
            key = %key,
            old_version = event.old_version,
            new_version = event.new_version,
            change_type = %event.change_type,
            "scope version bumped"
        );

        // The bump is committed; delivery failures go to the pull path.
        if let Err(err) = self.notifier.notify(&event.to_notification()) {
            tracing::warn!(key = %key, error = %err, "scope change notification failed");
        }

        Ok(new_state.version)
    }

    /// Deactivate every session for `key` whose snapshot version is behind
    /// `min_version`; sessions already at or past it are left untouched.
    ///
    /// Returns the number of sessions invalidated.
    pub fn invalidate_sessions(
        &self,
        key: &ScopeKey,
        min_version: u64,
    ) -> Result<usize, StoreError> {
        let mut invalidated = 0;
        for session in self.sessions.sessions_for(key)? {
            if session.is_active
                && session.scope_version < min_version
                && self.sessions.deactivate(&session.id)?
            {
                invalidated += 1;
            }
        }
        if invalidated > 0 {
            tracing::info!(key = %key, count = invalidated, min_version, "stale sessions invalidated");
        }
        Ok(invalidated)
    }

    /// Sessions the reconciliation sweep should refresh: behind the current
    /// version for their key, or unchecked for longer than the configured
    /// max age (version match notwithstanding).
    pub fn sessions_needing_update(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionRef>, StoreError> {
        let max_age = self.config.max_scope_check_age();
        let mut refs = Vec::new();
        for session in self.sessions.active_sessions()? {
            let current = self.version(&session.key)?;
            let behind = session.scope_version < current;
            let overdue = now - session.last_scope_check_at > max_age;
            if behind || overdue {
                refs.push(SessionRef {
                    session: session.id,
                    key: session.key,
                    scope_version: session.scope_version,
                    current_version: current,
                });
            }
        }
        Ok(refs)
    }

    /// Unconsumed change events, in append order.
    pub fn pending_change_events(&self) -> Result<Vec<ScopeChangeEvent>, StoreError> {
        self.store.pending_events()
    }

    /// Mark events processed after the consumer's delivery attempt.
    pub fn mark_events_processed(&self, event_ids: &[Uuid]) -> Result<usize, StoreError> {
        self.store.mark_processed(event_ids)
    }
}
