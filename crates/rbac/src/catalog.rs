//! Role catalog: the authoritative map of role → direct capabilities.
//!
//! Loaded from YAML configuration at startup (fail-fast on malformed
//! capability strings), with controlled runtime additions for custom roles.
//! The catalog is an explicit handle passed into the resolver — there is no
//! process-wide registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tessera_core::{CoreError, CoreResult};

use crate::capability::Capability;
use crate::hierarchy::RoleHierarchy;
use crate::role::{RoleDefinition, RoleName};

/// One role entry in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Serde model of the role configuration file.
///
/// ```yaml
/// roles:
///   viewer:
///     capabilities: ["app:login"]
///   admin:
///     capabilities: ["*"]
///     description: Full platform administrator
/// hierarchy: [viewer, user, power_user, admin]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub roles: BTreeMap<String, RoleConfig>,
    /// Levels lowest-first; defaults to the standard four-level hierarchy.
    #[serde(default)]
    pub hierarchy: Option<Vec<String>>,
}

/// Role catalog with a fixed hierarchy and runtime-extensible role map.
///
/// Custom-role writes are guarded by an `RwLock`; reads clone the small
/// definitions so no lock is held across resolution.
#[derive(Debug)]
pub struct CapabilityCatalog {
    hierarchy: RoleHierarchy,
    roles: RwLock<HashMap<RoleName, RoleDefinition>>,
}

impl CapabilityCatalog {
    /// Build a catalog from loaded configuration.
    ///
    /// Configuration errors (malformed capability strings) fail here, at
    /// load time — never per-request.
    pub fn from_config(config: CatalogConfig) -> CoreResult<Self> {
        let hierarchy = match config.hierarchy {
            Some(levels) => {
                RoleHierarchy::new(levels.into_iter().map(RoleName::new).collect())?
            }
            None => RoleHierarchy::standard(),
        };

        let mut roles = HashMap::new();
        for (name, role) in config.roles {
            let mut capabilities = Vec::with_capacity(role.capabilities.len());
            for cap in &role.capabilities {
                let cap = Capability::parse(cap).map_err(|e| {
                    CoreError::configuration(format!("role '{name}': {e}"))
                })?;
                capabilities.push(cap);
            }
            let name = RoleName::new(name);
            roles.insert(
                name.clone(),
                RoleDefinition {
                    name,
                    capabilities,
                    description: role.description,
                    custom: false,
                },
            );
        }

        Ok(Self {
            hierarchy,
            roles: RwLock::new(roles),
        })
    }

    /// Parse and build a catalog from a YAML document.
    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        let config: CatalogConfig = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::configuration(format!("role catalog: {e}")))?;
        Self::from_config(config)
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Look up a role definition (clone; definitions are small).
    pub fn role(&self, name: &RoleName) -> Option<RoleDefinition> {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &RoleName) -> bool {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All configured role names, sorted for stable output.
    pub fn available_roles(&self) -> Vec<RoleName> {
        let mut names: Vec<RoleName> = self
            .roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Add a runtime-only custom role.
    ///
    /// Rejected locally as a validation failure on an empty name, a
    /// duplicate name, or any malformed capability string — never silently
    /// coerced.
    pub fn create_custom_role(
        &self,
        name: &str,
        capabilities: Vec<String>,
        description: Option<String>,
    ) -> CoreResult<RoleDefinition> {
        if name.is_empty() {
            return Err(CoreError::validation("role name must not be empty"));
        }

        let mut parsed = Vec::with_capacity(capabilities.len());
        for cap in &capabilities {
            let cap = Capability::parse(cap)
                .map_err(|e| CoreError::validation(e.to_string()))?;
            parsed.push(cap);
        }

        let role_name = RoleName::new(name.to_string());
        let definition = RoleDefinition {
            name: role_name.clone(),
            capabilities: parsed,
            description: Some(
                description.unwrap_or_else(|| format!("Custom role: {name}")),
            ),
            custom: true,
        };

        let mut roles = self
            .roles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if roles.contains_key(&role_name) {
            return Err(CoreError::conflict(format!("role '{name}' already exists")));
        }
        tracing::info!(role = %role_name, "custom role created");
        roles.insert(role_name, definition.clone());
        Ok(definition)
    }
}
