//! `tessera-policy` — decision contract for the external policy-engine
//! sidecar.
//!
//! The core never evaluates policy itself: it sends a decision input to a
//! remote engine and consumes an allow/deny answer. This crate pins down the
//! request/response contract and the fail-closed mapping for transport
//! failures. Implementations of [`PolicyEngineClient`] own the HTTP plumbing
//! and its bounded timeout.

pub mod client;
pub mod decision;

pub use client::{PolicyEngineClient, PolicyError, StaticPolicyClient, evaluate_fail_closed};
pub use decision::{PolicyDecision, PolicyInput};
