//! Scope state and change events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::ScopeKey;
use tessera_events::{ChangeType, ScopeChangeNotification};
use tessera_rbac::{Capability, RoleName};

/// Current authorization snapshot for one scope key.
///
/// Mutated only by the [`ScopeVersionManager`](crate::ScopeVersionManager):
/// the version increases by exactly 1 per *actual* content change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeState {
    pub key: ScopeKey,
    pub version: u64,
    pub capabilities: BTreeSet<Capability>,
    pub roles: BTreeSet<RoleName>,
    pub updated_at: DateTime<Utc>,
}

impl ScopeState {
    /// Lazy default for a key that has never been written: version 1,
    /// empty snapshot.
    pub fn initial(key: ScopeKey) -> Self {
        Self {
            key,
            version: 1,
            capabilities: BTreeSet::new(),
            roles: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }

    /// Unordered-set comparison against a candidate snapshot.
    pub fn same_content(
        &self,
        capabilities: &BTreeSet<Capability>,
        roles: &BTreeSet<RoleName>,
    ) -> bool {
        &self.capabilities == capabilities && &self.roles == roles
    }
}

/// Append-only record of one version bump.
///
/// For a given key, `new_version == old_version + 1` and event order matches
/// version order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChangeEvent {
    pub event_id: Uuid,
    pub key: ScopeKey,
    pub old_version: u64,
    pub new_version: u64,
    /// Symmetric difference of old/new capability sets.
    pub changed_capabilities: Vec<Capability>,
    /// Symmetric difference of old/new role sets.
    pub changed_roles: Vec<RoleName>,
    pub change_type: ChangeType,
    pub timestamp: DateTime<Utc>,
}

impl ScopeChangeEvent {
    /// Build the change record for a transition between two snapshots.
    pub fn between(old: &ScopeState, new: &ScopeState) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            key: new.key,
            old_version: old.version,
            new_version: new.version,
            changed_capabilities: old
                .capabilities
                .symmetric_difference(&new.capabilities)
                .cloned()
                .collect(),
            changed_roles: old
                .roles
                .symmetric_difference(&new.roles)
                .cloned()
                .collect(),
            change_type: classify(old, new),
            timestamp: new.updated_at,
        }
    }

    /// The wire payload for the push layer.
    pub fn to_notification(&self) -> ScopeChangeNotification {
        ScopeChangeNotification {
            user_id: self.key.user,
            tenant_id: self.key.tenant,
            old_version: self.old_version,
            new_version: self.new_version,
            change_type: self.change_type,
            changed_capabilities: self
                .changed_capabilities
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            changed_roles: self
                .changed_roles
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        }
    }
}

/// `Added` if the new snapshot strictly grew, `Removed` if it strictly
/// shrank, `Modified` for anything else (overlap, role swap).
fn classify(old: &ScopeState, new: &ScopeState) -> ChangeType {
    let caps_grew = new.capabilities.is_superset(&old.capabilities);
    let caps_shrank = new.capabilities.is_subset(&old.capabilities);
    let roles_grew = new.roles.is_superset(&old.roles);
    let roles_shrank = new.roles.is_subset(&old.roles);

    if caps_grew && roles_grew && !(caps_shrank && roles_shrank) {
        ChangeType::Added
    } else if caps_shrank && roles_shrank && !(caps_grew && roles_grew) {
        ChangeType::Removed
    } else {
        ChangeType::Modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::UserId;

    fn state(caps: &[&'static str], roles: &[&'static str], version: u64) -> ScopeState {
        ScopeState {
            key: ScopeKey::global(UserId::from_uuid(uuid::Uuid::nil())),
            version,
            capabilities: caps.iter().map(|c| Capability::new(*c)).collect(),
            roles: roles.iter().map(|r| RoleName::new(*r)).collect(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn grant_is_classified_added() {
        let old = state(&["app:login"], &["viewer"], 1);
        let new = state(&["app:login", "app:profile.write"], &["viewer"], 2);
        let event = ScopeChangeEvent::between(&old, &new);
        assert_eq!(event.change_type, ChangeType::Added);
        assert_eq!(
            event.changed_capabilities,
            vec![Capability::new("app:profile.write")]
        );
        assert!(event.changed_roles.is_empty());
    }

    #[test]
    fn revocation_is_classified_removed() {
        let old = state(&["app:login", "app:profile.write"], &["user"], 3);
        let new = state(&["app:login"], &[], 4);
        let event = ScopeChangeEvent::between(&old, &new);
        assert_eq!(event.change_type, ChangeType::Removed);
        assert_eq!(event.changed_roles, vec![RoleName::new("user")]);
    }

    #[test]
    fn role_swap_is_classified_modified() {
        let old = state(&["app:login"], &["viewer"], 1);
        let new = state(&["integrations:connect"], &["power_user"], 2);
        let event = ScopeChangeEvent::between(&old, &new);
        assert_eq!(event.change_type, ChangeType::Modified);
        // Symmetric difference carries both sides of the swap.
        assert_eq!(event.changed_capabilities.len(), 2);
        assert_eq!(event.changed_roles.len(), 2);
    }

    #[test]
    fn notification_uses_stable_field_names() {
        let old = state(&[], &[], 1);
        let new = state(&["app:login"], &["viewer"], 2);
        let value =
            serde_json::to_value(ScopeChangeEvent::between(&old, &new).to_notification())
                .unwrap();
        assert_eq!(value["type"], "scope_change");
        assert_eq!(value["tenant_id"], "global");
        assert_eq!(value["new_version"], 2);
    }
}
