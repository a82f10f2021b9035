//! The tenant/global scope axis.
//!
//! Every version counter, membership row and change event is keyed by a
//! [`ScopeKey`]: the user plus the tenant context the grant lives in. A
//! grant can also be platform-wide, in which case the tenant axis is the
//! literal string `"global"` on the wire.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{TenantId, UserId};

/// Tenant context of a grant: a concrete tenant, or platform-wide.
///
/// Wire form (stable contract): the tenant UUID, or the string `"global"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TenantScope {
    Global,
    Tenant(TenantId),
}

impl TenantScope {
    /// Convenience for the common `Option<TenantId>` call sites.
    pub fn from_tenant(tenant: Option<TenantId>) -> Self {
        match tenant {
            Some(id) => Self::Tenant(id),
            None => Self::Global,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Self::Global => None,
            Self::Tenant(id) => Some(*id),
        }
    }
}

impl core::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Tenant(id) => core::fmt::Display::fmt(id, f),
        }
    }
}

impl FromStr for TenantScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            Ok(Self::Global)
        } else {
            Ok(Self::Tenant(TenantId::from_str(s)?))
        }
    }
}

impl Serialize for TenantScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TenantScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<TenantId> for TenantScope {
    fn from(value: TenantId) -> Self {
        Self::Tenant(value)
    }
}

/// Key of a principal's scope: who, and within which tenant context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub user: UserId,
    pub tenant: TenantScope,
}

impl ScopeKey {
    pub fn new(user: UserId, tenant: TenantScope) -> Self {
        Self { user, tenant }
    }

    pub fn global(user: UserId) -> Self {
        Self {
            user,
            tenant: TenantScope::Global,
        }
    }

    pub fn tenant(user: UserId, tenant: TenantId) -> Self {
        Self {
            user,
            tenant: TenantScope::Tenant(tenant),
        }
    }
}

impl core::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.user, self.tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_scope_round_trips_global() {
        let s = serde_json::to_string(&TenantScope::Global).unwrap();
        assert_eq!(s, "\"global\"");
        let back: TenantScope = serde_json::from_str(&s).unwrap();
        assert_eq!(back, TenantScope::Global);
    }

    #[test]
    fn tenant_scope_round_trips_tenant_uuid() {
        let scope = TenantScope::Tenant(TenantId::new());
        let s = serde_json::to_string(&scope).unwrap();
        let back: TenantScope = serde_json::from_str(&s).unwrap();
        assert_eq!(back, scope);
    }

    #[test]
    fn from_tenant_maps_none_to_global() {
        assert_eq!(TenantScope::from_tenant(None), TenantScope::Global);
        let id = TenantId::new();
        assert_eq!(
            TenantScope::from_tenant(Some(id)),
            TenantScope::Tenant(id)
        );
    }
}
