//! Persistence seam for scope state and change events.
//!
//! The manager always reads through this trait; implementations decide the
//! engine (rows in a relational store, a cache, the in-memory fake below).
//! Operations are single-row/transactional from the manager's point of view.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use uuid::Uuid;

use tessera_core::ScopeKey;

use crate::state::{ScopeChangeEvent, ScopeState};

/// Infrastructure failure of a store (not a domain outcome).
///
/// Callers must treat this as deny/reject (fail-closed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Authoritative storage for [`ScopeState`] rows and the append-only change
/// event log.
pub trait ScopeStore: Send + Sync {
    fn load_state(&self, key: &ScopeKey) -> Result<Option<ScopeState>, StoreError>;

    fn save_state(&self, state: &ScopeState) -> Result<(), StoreError>;

    /// Append a change event (unconsumed until marked processed).
    fn append_event(&self, event: &ScopeChangeEvent) -> Result<(), StoreError>;

    /// Unconsumed change events, in append order.
    fn pending_events(&self) -> Result<Vec<ScopeChangeEvent>, StoreError>;

    /// Mark events processed after a delivery attempt; returns how many
    /// transitioned from pending.
    fn mark_processed(&self, event_ids: &[Uuid]) -> Result<usize, StoreError>;
}

/// In-memory scope store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryScopeStore {
    states: RwLock<HashMap<ScopeKey, ScopeState>>,
    events: RwLock<Vec<(ScopeChangeEvent, bool)>>,
}

impl InMemoryScopeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeStore for InMemoryScopeStore {
    fn load_state(&self, key: &ScopeKey) -> Result<Option<ScopeState>, StoreError> {
        Ok(self
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn save_state(&self, state: &ScopeState) -> Result<(), StoreError> {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(state.key, state.clone());
        Ok(())
    }

    fn append_event(&self, event: &ScopeChangeEvent) -> Result<(), StoreError> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.clone(), false));
        Ok(())
    }

    fn pending_events(&self) -> Result<Vec<ScopeChangeEvent>, StoreError> {
        Ok(self
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, processed)| !processed)
            .map(|(event, _)| event.clone())
            .collect())
    }

    fn mark_processed(&self, event_ids: &[Uuid]) -> Result<usize, StoreError> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let mut marked = 0;
        for (event, processed) in events.iter_mut() {
            if !*processed && event_ids.contains(&event.event_id) {
                *processed = true;
                marked += 1;
            }
        }
        Ok(marked)
    }
}
