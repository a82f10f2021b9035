//! `tessera-scope` — scope versioning and session consistency.
//!
//! Every principal's effective authorization within a tenant (its *scope*)
//! carries a monotonically increasing version. Sessions snapshot that
//! version at issuance; when the scope's content changes the version bumps,
//! a change event is recorded, and stale sessions are detected and
//! invalidated (immediately by the push notifier, eventually by the
//! reconciliation sweep).

pub mod assignment;
pub mod checker;
pub mod config;
pub mod manager;
pub mod membership;
pub mod session;
pub mod state;
pub mod store;

pub use assignment::{AssignmentError, RoleAssignmentService};
pub use checker::{ScopeCheck, SessionConsistencyChecker, StaleScopeSignal, TokenVerdict};
pub use config::{PollingConfig, ScopeConfig, SessionInvalidationConfig, VersionCheckingConfig};
pub use manager::ScopeVersionManager;
pub use membership::{InMemoryMembershipStore, Membership, MembershipStore};
pub use session::{InMemorySessionStore, SessionRef, SessionSnapshot, SessionStore};
pub use state::{ScopeChangeEvent, ScopeState};
pub use store::{InMemoryScopeStore, ScopeStore, StoreError};
