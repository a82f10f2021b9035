//! Decision input/output shapes (stable sidecar contract).

use serde::{Deserialize, Serialize};

use tessera_core::TenantScope;

/// Input to a policy evaluation: the principal's effective capabilities plus
/// the resource/action (or method/path) being attempted, in tenant context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub capabilities: Vec<String>,
    pub resource: String,
    pub action: String,
    pub tenant_id: TenantScope,
}

impl PolicyInput {
    pub fn new(
        capabilities: Vec<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        tenant_id: TenantScope,
    ) -> Self {
        Self {
            capabilities,
            resource: resource.into(),
            action: action.into(),
            tenant_id,
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub policy_version: Option<String>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allow: true,
            reason: None,
            policy_version: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: Some(reason.into()),
            policy_version: None,
        }
    }
}
