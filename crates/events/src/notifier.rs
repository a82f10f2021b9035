//! Scope-change notification contract.
//!
//! [`ScopeChangeNotification`] is the exact payload the external push layer
//! (WebSocket fan-out, broker) must deliver verbatim to affected
//! connections. Field names and types are a stable contract — other
//! components parse them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_core::{TenantScope, UserId};

use crate::bus::EventBus;

/// Classification of a scope change relative to the previous snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// New snapshot is a strict superset of the old one.
    Added,
    /// New snapshot is a strict subset of the old one.
    Removed,
    /// Anything else (overlapping replacement, role swap, ...).
    Modified,
}

impl core::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Modified => f.write_str("modified"),
        }
    }
}

/// Wire payload pushed to live connections on a scope change.
///
/// Serializes with a constant `"type": "scope_change"` discriminator;
/// `tenant_id` is the tenant UUID or the string `"global"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "scope_change")]
pub struct ScopeChangeNotification {
    pub user_id: UserId,
    pub tenant_id: TenantScope,
    pub old_version: u64,
    pub new_version: u64,
    pub change_type: ChangeType,
    pub changed_capabilities: Vec<String>,
    pub changed_roles: Vec<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Boundary for pushing scope changes toward live connections.
///
/// Delivery is best-effort: the version bump this notification describes is
/// already committed, so failures are logged by callers and retried through
/// the pending-event pull path, never rolled back.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, notification: &ScopeChangeNotification) -> Result<(), NotifyError>;
}

/// Notifier that publishes onto an [`EventBus`].
pub struct BusNotifier<B> {
    bus: Arc<B>,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: Arc<B>) -> Self {
        Self { bus }
    }
}

impl<B> ChangeNotifier for BusNotifier<B>
where
    B: EventBus<ScopeChangeNotification>,
{
    fn notify(&self, notification: &ScopeChangeNotification) -> Result<(), NotifyError> {
        self.bus
            .publish(notification.clone())
            .map_err(|e| NotifyError::Delivery(format!("{e:?}")))
    }
}

/// No-op notifier for deployments without a push layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn notify(&self, _notification: &ScopeChangeNotification) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_bus::InMemoryEventBus;

    fn notification() -> ScopeChangeNotification {
        ScopeChangeNotification {
            user_id: UserId::new(),
            tenant_id: TenantScope::Global,
            old_version: 1,
            new_version: 2,
            change_type: ChangeType::Added,
            changed_capabilities: vec!["app:login".into()],
            changed_roles: vec!["user".into()],
        }
    }

    #[test]
    fn payload_shape_is_the_stable_contract() {
        let value = serde_json::to_value(notification()).unwrap();
        assert_eq!(value["type"], "scope_change");
        assert_eq!(value["tenant_id"], "global");
        assert_eq!(value["old_version"], 1);
        assert_eq!(value["new_version"], 2);
        assert_eq!(value["change_type"], "added");
        assert_eq!(value["changed_capabilities"][0], "app:login");
        assert_eq!(value["changed_roles"][0], "user");
    }

    #[test]
    fn bus_notifier_delivers_to_subscribers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let notifier = BusNotifier::new(Arc::clone(&bus));

        let sent = notification();
        notifier.notify(&sent).unwrap();

        assert_eq!(sub.try_recv().unwrap(), sent);
    }
}
