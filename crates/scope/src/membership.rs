//! Tenant memberships: the persisted (user, tenant) → role mapping.
//!
//! A membership carries a capability snapshot precomputed at assignment
//! time. At most one active membership exists per (user, tenant); removal
//! deactivates the row, it is never hard-deleted (audit trail).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_core::{TenantScope, UserId};
use tessera_rbac::{Capability, RoleName};

use crate::store::StoreError;

/// One (user, tenant) role grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user: UserId,
    pub tenant: TenantScope,
    pub role: RoleName,
    /// Effective capabilities precomputed when the role was assigned.
    pub capabilities: Vec<Capability>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(
        user: UserId,
        tenant: TenantScope,
        role: RoleName,
        capabilities: Vec<Capability>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user,
            tenant,
            role,
            capabilities,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence seam for memberships (transactional single-row operations).
pub trait MembershipStore: Send + Sync {
    /// Load the membership row for (user, tenant), active or not.
    fn load(
        &self,
        user: &UserId,
        tenant: &TenantScope,
    ) -> Result<Option<Membership>, StoreError>;

    /// Upsert a membership row.
    fn save(&self, membership: &Membership) -> Result<(), StoreError>;

    /// Logically delete (is_active = false); returns whether a row changed.
    fn deactivate(&self, user: &UserId, tenant: &TenantScope) -> Result<bool, StoreError>;

    /// All membership rows for a user, across tenants.
    fn memberships_for_user(&self, user: &UserId) -> Result<Vec<Membership>, StoreError>;
}

/// In-memory membership store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    rows: RwLock<HashMap<(UserId, TenantScope), Membership>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MembershipStore for InMemoryMembershipStore {
    fn load(
        &self,
        user: &UserId,
        tenant: &TenantScope,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(*user, *tenant))
            .cloned())
    }

    fn save(&self, membership: &Membership) -> Result<(), StoreError> {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((membership.user, membership.tenant), membership.clone());
        Ok(())
    }

    fn deactivate(&self, user: &UserId, tenant: &TenantScope) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.get_mut(&(*user, *tenant)) {
            Some(row) if row.is_active => {
                row.is_active = false;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn memberships_for_user(&self, user: &UserId) -> Result<Vec<Membership>, StoreError> {
        Ok(self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|m| &m.user == user)
            .cloned()
            .collect())
    }
}
