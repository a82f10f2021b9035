//! `tessera-core` — shared authorization-domain primitives.
//!
//! This crate contains **pure domain** building blocks (no infrastructure
//! concerns): strongly-typed identifiers, the tenant/global scope axis, and
//! the error taxonomy shared by the authorization crates.

pub mod error;
pub mod id;
pub mod scope;

pub use error::{CoreError, CoreResult};
pub use id::{SessionId, TenantId, UserId};
pub use scope::{ScopeKey, TenantScope};
