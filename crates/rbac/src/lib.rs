//! `tessera-rbac` — capability grammar, role catalog and resolution.
//!
//! This crate is intentionally decoupled from storage and transport: it owns
//! the capability string format, the role hierarchy, and the pure resolution
//! of a role into its effective capability set.

pub mod capability;
pub mod catalog;
pub mod hierarchy;
pub mod resolver;
pub mod role;

pub use capability::{Capability, CapabilityFormatError, has_capability};
pub use catalog::{CapabilityCatalog, CatalogConfig, RoleConfig};
pub use hierarchy::RoleHierarchy;
pub use resolver::{CapabilityResolver, ResolvedRole};
pub use role::{RoleDefinition, RoleName};
