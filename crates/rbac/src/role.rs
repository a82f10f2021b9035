//! Role identity and definitions.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Role identifier.
///
/// Roles are opaque strings at this layer; what a role grants is decided by
/// the catalog that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RoleName {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// A named bundle of direct capabilities.
///
/// Immutable once created; `custom` distinguishes roles added at runtime
/// from roles loaded out of static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: RoleName,
    pub capabilities: Vec<Capability>,
    pub description: Option<String>,
    #[serde(default)]
    pub custom: bool,
}

impl RoleDefinition {
    /// Whether the role's *direct* set carries the universal wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.capabilities.iter().any(Capability::is_wildcard)
    }
}
