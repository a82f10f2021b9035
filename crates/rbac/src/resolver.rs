//! Resolution of a role into its effective capability set.
//!
//! Inheritance rules (invariants the rest of the system depends on):
//!
//! - an unknown role resolves to the empty set, never an error;
//! - a role whose *direct* set contains `*` resolves to exactly `{*}` —
//!   the wildcard absorbs, nothing else is added;
//! - otherwise the effective set is the union of the role's direct
//!   capabilities and the direct capabilities of every dominated role,
//!   *except* dominated roles that themselves carry `*` — a lower role's
//!   wildcard never leaks upward.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::capability::{Capability, has_capability};
use crate::catalog::CapabilityCatalog;
use crate::role::RoleName;

/// Pure resolver over a shared catalog handle.
#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    catalog: Arc<CapabilityCatalog>,
}

/// Resolved view of a role (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRole {
    pub role: RoleName,
    pub direct_capabilities: Vec<Capability>,
    pub effective_capabilities: Vec<Capability>,
    pub inherited_from: Vec<RoleName>,
    pub custom: bool,
}

impl CapabilityResolver {
    pub fn new(catalog: Arc<CapabilityCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<CapabilityCatalog> {
        &self.catalog
    }

    /// Effective capability set for a single role.
    pub fn effective_capabilities(&self, role: &RoleName) -> HashSet<Capability> {
        let Some(definition) = self.catalog.role(role) else {
            return HashSet::new();
        };

        if definition.has_wildcard() {
            return HashSet::from([Capability::wildcard()]);
        }

        let mut effective: HashSet<Capability> =
            definition.capabilities.into_iter().collect();

        for lower in self.catalog.hierarchy().dominated(role) {
            let Some(inherited) = self.catalog.role(lower) else {
                continue;
            };
            // Do not inherit a lower role's wildcard upward.
            if inherited.has_wildcard() {
                continue;
            }
            effective.extend(inherited.capabilities);
        }

        effective
    }

    /// Combined effective set for a principal holding several roles.
    ///
    /// Any role resolving to `{*}` absorbs the whole set.
    pub fn effective_for_roles(&self, roles: &[RoleName]) -> HashSet<Capability> {
        let mut combined = HashSet::new();
        for role in roles {
            let caps = self.effective_capabilities(role);
            if caps.contains(&Capability::wildcard()) {
                return HashSet::from([Capability::wildcard()]);
            }
            combined.extend(caps);
        }
        combined
    }

    /// Whether `role` grants `required` (resolution + matching in one call).
    pub fn role_has_capability(&self, role: &RoleName, required: &Capability) -> bool {
        has_capability(&self.effective_capabilities(role), required)
    }

    /// Resolved role view for audit endpoints; `None` for unknown roles.
    pub fn describe(&self, role: &RoleName) -> Option<ResolvedRole> {
        let definition = self.catalog.role(role)?;
        let mut effective: Vec<Capability> =
            self.effective_capabilities(role).into_iter().collect();
        effective.sort();
        Some(ResolvedRole {
            role: role.clone(),
            direct_capabilities: definition.capabilities,
            effective_capabilities: effective,
            inherited_from: self.catalog.hierarchy().dominated(role).to_vec(),
            custom: definition.custom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CapabilityCatalog;
    use proptest::prelude::*;

    const FIXTURE: &str = r#"
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

    fn resolver() -> CapabilityResolver {
        CapabilityResolver::new(Arc::new(CapabilityCatalog::from_yaml(FIXTURE).unwrap()))
    }

    fn cap(s: &'static str) -> Capability {
        Capability::new(s)
    }

    #[test]
    fn unknown_role_resolves_to_empty_set() {
        assert!(resolver()
            .effective_capabilities(&RoleName::new("ghost"))
            .is_empty());
    }

    #[test]
    fn power_user_inherits_lower_levels() {
        let effective = resolver().effective_capabilities(&RoleName::new("power_user"));
        for required in ["app:login", "app:profile.write", "integrations:connect"] {
            assert!(
                effective.contains(&Capability::new(required)),
                "missing {required}"
            );
        }
    }

    #[test]
    fn wildcard_absorbs_regardless_of_hierarchy() {
        let effective = resolver().effective_capabilities(&RoleName::new("admin"));
        assert_eq!(effective, HashSet::from([cap("*")]));
    }

    #[test]
    fn lower_wildcard_does_not_leak_upward() {
        let yaml = r#"
roles:
  viewer:
    capabilities: ["*"]
  user:
    capabilities: ["app:login"]
"#;
        let resolver = CapabilityResolver::new(Arc::new(
            CapabilityCatalog::from_yaml(yaml).unwrap(),
        ));
        let effective = resolver.effective_capabilities(&RoleName::new("user"));
        assert_eq!(effective, HashSet::from([cap("app:login")]));
    }

    #[test]
    fn multi_role_wildcard_absorbs_combined_set() {
        let resolver = resolver();
        let combined = resolver
            .effective_for_roles(&[RoleName::new("viewer"), RoleName::new("admin")]);
        assert_eq!(combined, HashSet::from([cap("*")]));
    }

    #[test]
    fn describe_reports_inheritance_chain() {
        let view = resolver().describe(&RoleName::new("power_user")).unwrap();
        let inherited: Vec<&str> =
            view.inherited_from.iter().map(RoleName::as_str).collect();
        assert_eq!(inherited, ["viewer", "user"]);
        assert!(!view.custom);
        assert!(resolver().describe(&RoleName::new("ghost")).is_none());
    }

    proptest! {
        /// Property: resolution is monotone in the hierarchy — a higher
        /// non-wildcard role's effective set contains every lower
        /// non-wildcard role's effective set.
        #[test]
        fn higher_levels_contain_lower_levels(extra in "[a-z]{1,8}:[a-z]{1,8}") {
            let yaml = format!(
                r#"
roles:
  viewer:
    capabilities: ["app:login"]
  user:
    capabilities: ["app:login", "{extra}"]
  power_user:
    capabilities: ["integrations:connect"]
  admin:
    capabilities: ["admin:all"]
"#
            );
            let resolver = CapabilityResolver::new(Arc::new(
                CapabilityCatalog::from_yaml(&yaml).unwrap(),
            ));
            let levels = ["viewer", "user", "power_user", "admin"];
            for pair in levels.windows(2) {
                let lower = resolver.effective_capabilities(&RoleName::new(pair[0]));
                let higher = resolver.effective_capabilities(&RoleName::new(pair[1]));
                prop_assert!(lower.is_subset(&higher));
            }
        }
    }
}
