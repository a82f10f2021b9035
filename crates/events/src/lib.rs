//! `tessera-events` — push-side plumbing for scope changes.
//!
//! The authorization core only needs to *emit* well-formed scope-change
//! notifications; connection management and delivery (WebSocket layer,
//! message broker) are external. This crate provides the stable payload
//! shape, the notifier seam, and a small in-memory pub/sub bus for tests
//! and single-process deployments.

pub mod bus;
pub mod in_memory_bus;
pub mod notifier;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::InMemoryEventBus;
pub use notifier::{
    BusNotifier, ChangeNotifier, ChangeType, NotifyError, NullNotifier, ScopeChangeNotification,
};
