//! Role hierarchy: a total order over configured role levels.
//!
//! Higher roles inherit the capabilities of every role below them (with the
//! wildcard exception handled by the resolver). The hierarchy is built once
//! at startup and immutable thereafter — acyclic by construction, since it
//! is just an ordered list of levels.

use serde::{Deserialize, Serialize};
use tessera_core::{CoreError, CoreResult};

use crate::role::RoleName;

/// Ordered role levels, lowest first.
///
/// Reference order: `viewer < user < power_user < admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHierarchy {
    levels: Vec<RoleName>,
}

impl RoleHierarchy {
    /// Build a hierarchy from levels ordered lowest to highest.
    ///
    /// Fails fast on duplicate level names (a role cannot appear at two
    /// levels).
    pub fn new(levels: Vec<RoleName>) -> CoreResult<Self> {
        for (i, role) in levels.iter().enumerate() {
            if levels[..i].contains(role) {
                return Err(CoreError::configuration(format!(
                    "role '{role}' appears at multiple hierarchy levels"
                )));
            }
        }
        Ok(Self { levels })
    }

    /// The reference four-level hierarchy.
    pub fn standard() -> Self {
        Self {
            levels: vec![
                RoleName::new("viewer"),
                RoleName::new("user"),
                RoleName::new("power_user"),
                RoleName::new("admin"),
            ],
        }
    }

    pub fn levels(&self) -> &[RoleName] {
        &self.levels
    }

    /// Zero-based level of a role, or `None` if it is outside the hierarchy
    /// (custom roles do not participate in inheritance).
    pub fn level(&self, role: &RoleName) -> Option<usize> {
        self.levels.iter().position(|r| r == role)
    }

    /// Roles strictly dominated by `role` (everything at a lower level).
    ///
    /// Unknown roles dominate nothing.
    pub fn dominated(&self, role: &RoleName) -> &[RoleName] {
        match self.level(role) {
            Some(level) => &self.levels[..level],
            None => &[],
        }
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}
