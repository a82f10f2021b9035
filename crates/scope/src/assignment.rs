//! Role assignment: the write path that ties the catalog, the membership
//! store and the version manager together.
//!
//! Assigning or removing a role recomputes the principal's effective scope
//! and runs it through [`ScopeVersionManager::update`], so the version
//! bumps exactly when the effective capabilities/roles actually changed.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use tessera_core::{ScopeKey, TenantScope, UserId};
use tessera_rbac::{Capability, CapabilityResolver, RoleName};

use crate::manager::ScopeVersionManager;
use crate::membership::{Membership, MembershipStore};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("role '{0}' not configured")]
    UnknownRole(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct RoleAssignmentService {
    resolver: CapabilityResolver,
    memberships: Arc<dyn MembershipStore>,
    manager: Arc<ScopeVersionManager>,
}

impl RoleAssignmentService {
    pub fn new(
        resolver: CapabilityResolver,
        memberships: Arc<dyn MembershipStore>,
        manager: Arc<ScopeVersionManager>,
    ) -> Self {
        Self {
            resolver,
            memberships,
            manager,
        }
    }

    /// Assign `role` to `user` within `tenant` (upserting the membership)
    /// and bump the scope version if the effective scope changed.
    ///
    /// Returns the scope version after the assignment.
    pub fn assign_role(
        &self,
        user: UserId,
        tenant: TenantScope,
        role: &RoleName,
    ) -> Result<u64, AssignmentError> {
        if !self.resolver.catalog().contains(role) {
            return Err(AssignmentError::UnknownRole(role.as_str().to_string()));
        }

        let capabilities: Vec<Capability> = self
            .resolver
            .effective_capabilities(role)
            .into_iter()
            .collect();

        let membership = match self.memberships.load(&user, &tenant)? {
            Some(mut existing) => {
                existing.role = role.clone();
                existing.capabilities = capabilities.clone();
                existing.is_active = true;
                existing.updated_at = chrono::Utc::now();
                existing
            }
            None => Membership::new(user, tenant, role.clone(), capabilities.clone()),
        };
        self.memberships.save(&membership)?;
        tracing::info!(user = %user, tenant = %tenant, role = %role, "role assigned");

        let version =
            self.manager
                .update(ScopeKey::new(user, tenant), capabilities, [role.clone()])?;
        Ok(version)
    }

    /// Remove the user's role in `tenant` (logical delete) and bump the
    /// scope version down to whatever remains effective for that key.
    ///
    /// Returns the scope version after the removal; removing a role the
    /// user does not hold is a no-op on the version.
    pub fn remove_role(
        &self,
        user: UserId,
        tenant: TenantScope,
    ) -> Result<u64, AssignmentError> {
        let removed = self.memberships.deactivate(&user, &tenant)?;
        if removed {
            tracing::info!(user = %user, tenant = %tenant, "role removed");
        }

        let remaining_capabilities = self.user_capabilities(&user, &tenant)?;
        let remaining_roles = self.user_roles(&user, &tenant)?;
        let version = self.manager.update(
            ScopeKey::new(user, tenant),
            remaining_capabilities,
            remaining_roles,
        )?;
        Ok(version)
    }

    /// Effective capabilities for a user in tenant context.
    ///
    /// Tenant queries merge the user's `global` membership; global queries
    /// see only the `global` row. A membership carrying `*` absorbs the
    /// whole set.
    pub fn user_capabilities(
        &self,
        user: &UserId,
        tenant: &TenantScope,
    ) -> Result<HashSet<Capability>, StoreError> {
        let mut capabilities = HashSet::new();
        for membership in self.relevant_memberships(user, tenant)? {
            if membership
                .capabilities
                .iter()
                .any(Capability::is_wildcard)
            {
                return Ok(HashSet::from([Capability::wildcard()]));
            }
            capabilities.extend(membership.capabilities);
        }
        Ok(capabilities)
    }

    /// Distinct active roles for a user in tenant context.
    pub fn user_roles(
        &self,
        user: &UserId,
        tenant: &TenantScope,
    ) -> Result<Vec<RoleName>, StoreError> {
        let mut roles: Vec<RoleName> = self
            .relevant_memberships(user, tenant)?
            .into_iter()
            .map(|m| m.role)
            .collect();
        roles.sort();
        roles.dedup();
        Ok(roles)
    }

    fn relevant_memberships(
        &self,
        user: &UserId,
        tenant: &TenantScope,
    ) -> Result<Vec<Membership>, StoreError> {
        Ok(self
            .memberships
            .memberships_for_user(user)?
            .into_iter()
            .filter(|m| m.is_active)
            .filter(|m| match tenant {
                TenantScope::Global => m.tenant.is_global(),
                scoped => &m.tenant == scoped || m.tenant.is_global(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeConfig;
    use crate::membership::InMemoryMembershipStore;
    use crate::session::{InMemorySessionStore, SessionSnapshot, SessionStore};
    use crate::store::InMemoryScopeStore;
    use chrono::{Duration, Utc};
    use tessera_core::{SessionId, TenantId};
    use tessera_rbac::CapabilityCatalog;

    const CATALOG: &str = r#"
roles:
  viewer:
    capabilities: ["app:login"]
  user:
    capabilities: ["app:login", "app:profile.write"]
  power_user:
    capabilities: ["integrations:connect"]
  admin:
    capabilities: ["*"]
"#;

    struct Fixture {
        service: RoleAssignmentService,
        manager: Arc<ScopeVersionManager>,
        sessions: Arc<InMemorySessionStore>,
        memberships: Arc<InMemoryMembershipStore>,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(InMemorySessionStore::new());
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let manager = Arc::new(ScopeVersionManager::without_notifier(
            Arc::new(InMemoryScopeStore::new()),
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            ScopeConfig::default(),
        ));
        let resolver = CapabilityResolver::new(Arc::new(
            CapabilityCatalog::from_yaml(CATALOG).unwrap(),
        ));
        let service = RoleAssignmentService::new(
            resolver,
            Arc::clone(&memberships) as Arc<dyn MembershipStore>,
            Arc::clone(&manager),
        );
        Fixture {
            service,
            manager,
            sessions,
            memberships,
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .assign_role(UserId::new(), TenantScope::Global, &RoleName::new("ghost"))
            .unwrap_err();
        assert!(matches!(err, AssignmentError::UnknownRole(_)));
    }

    #[test]
    fn assignment_precomputes_inherited_capabilities() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Tenant(TenantId::new());

        f.service
            .assign_role(user, tenant, &RoleName::new("power_user"))
            .unwrap();

        let membership = f.memberships.load(&user, &tenant).unwrap().unwrap();
        assert!(membership.is_active);
        for cap in ["app:login", "app:profile.write", "integrations:connect"] {
            assert!(
                membership.capabilities.contains(&Capability::new(cap)),
                "missing {cap}"
            );
        }
    }

    #[test]
    fn reassignment_replaces_the_single_active_role() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Global;

        f.service
            .assign_role(user, tenant, &RoleName::new("viewer"))
            .unwrap();
        f.service
            .assign_role(user, tenant, &RoleName::new("user"))
            .unwrap();

        let roles = f.service.user_roles(&user, &tenant).unwrap();
        assert_eq!(roles, vec![RoleName::new("user")]);
    }

    #[test]
    fn global_membership_merges_into_tenant_queries() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Tenant(TenantId::new());

        f.service
            .assign_role(user, TenantScope::Global, &RoleName::new("viewer"))
            .unwrap();
        f.service
            .assign_role(user, tenant, &RoleName::new("power_user"))
            .unwrap();

        let caps = f.service.user_capabilities(&user, &tenant).unwrap();
        assert!(caps.contains(&Capability::new("integrations:connect")));
        assert!(caps.contains(&Capability::new("app:login")));

        // The global view does not see the tenant grant.
        let global_caps = f
            .service
            .user_capabilities(&user, &TenantScope::Global)
            .unwrap();
        assert!(!global_caps.contains(&Capability::new("integrations:connect")));
    }

    #[test]
    fn admin_membership_absorbs_to_wildcard() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Tenant(TenantId::new());

        f.service
            .assign_role(user, tenant, &RoleName::new("admin"))
            .unwrap();
        f.service
            .assign_role(user, TenantScope::Global, &RoleName::new("viewer"))
            .unwrap();

        let caps = f.service.user_capabilities(&user, &tenant).unwrap();
        assert_eq!(caps, HashSet::from([Capability::wildcard()]));
    }

    #[test]
    fn assign_update_remove_walks_versions_and_invalidates() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Tenant(TenantId::new());
        let key = ScopeKey::new(user, tenant);

        // Fresh key reads the lazy default.
        assert_eq!(f.manager.version(&key).unwrap(), 1);

        // Assign: 1 -> 2.
        let v2 = f
            .service
            .assign_role(user, tenant, &RoleName::new("user"))
            .unwrap();
        assert_eq!(v2, 2);

        // Sessions issued while the scope was at version 1 and 2.
        let stale = SessionSnapshot::issue(
            SessionId::new(),
            key,
            vec![],
            1,
            Utc::now() + Duration::hours(1),
        );
        let current = SessionSnapshot::issue(
            SessionId::new(),
            key,
            vec![Capability::new("app:login")],
            v2,
            Utc::now() + Duration::hours(1),
        );
        f.sessions.save(&stale).unwrap();
        f.sessions.save(&current).unwrap();

        // Same role again: no content change, version stays 2.
        let same = f
            .service
            .assign_role(user, tenant, &RoleName::new("user"))
            .unwrap();
        assert_eq!(same, 2);

        // Remove: 2 -> 3, and the membership row survives deactivated.
        let v3 = f.service.remove_role(user, tenant).unwrap();
        assert_eq!(v3, 3);
        let row = f.memberships.load(&user, &tenant).unwrap().unwrap();
        assert!(!row.is_active);

        // Everything issued before version 3 goes.
        let invalidated = f.manager.invalidate_sessions(&key, v3).unwrap();
        assert_eq!(invalidated, 2);
    }

    #[test]
    fn removing_an_unheld_role_keeps_the_version() {
        let f = fixture();
        let user = UserId::new();
        let tenant = TenantScope::Global;

        let version = f.service.remove_role(user, tenant).unwrap();
        assert_eq!(version, 1);
    }
}
