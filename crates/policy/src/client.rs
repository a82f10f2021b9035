//! Policy-engine client seam and fail-closed evaluation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::decision::{PolicyDecision, PolicyInput};

/// Transport-level failure talking to the policy engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The engine did not answer within the client's bounded timeout.
    #[error("policy evaluation timeout")]
    Timeout,

    /// The engine answered with a non-2xx status.
    #[error("policy engine returned status {0}")]
    Status(u16),

    /// Connection-level failure (DNS, refused, broken pipe, ...).
    #[error("policy engine transport error: {0}")]
    Transport(String),
}

/// Client for the remote policy-engine sidecar.
///
/// Implementations must enforce a bounded timeout and surface it as
/// [`PolicyError::Timeout`]; retry policy belongs to the caller, not here,
/// so decisions stay deterministic and fast.
pub trait PolicyEngineClient: Send + Sync {
    fn evaluate(&self, input: &PolicyInput) -> Result<PolicyDecision, PolicyError>;
}

/// Evaluate a policy, mapping every transport failure to a deny.
///
/// A timeout or error from the engine must never become "allow" and never an
/// unhandled fault; the synthesized reason names the failure mode so logs
/// can distinguish timeout from error status.
pub fn evaluate_fail_closed(
    client: &dyn PolicyEngineClient,
    input: &PolicyInput,
) -> PolicyDecision {
    match client.evaluate(input) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!(error = %err, resource = %input.resource, "policy evaluation failed, denying");
            let reason = match err {
                PolicyError::Timeout => "policy evaluation timeout".to_string(),
                PolicyError::Status(status) => {
                    format!("policy evaluation failed with status {status}")
                }
                PolicyError::Transport(detail) => {
                    format!("policy evaluation error: {detail}")
                }
            };
            PolicyDecision::deny(reason)
        }
    }
}

/// In-memory client with canned answers, for tests and wiring.
///
/// Unknown (resource, action) pairs deny by default (fail-closed even in the
/// fake).
#[derive(Debug, Default)]
pub struct StaticPolicyClient {
    answers: Mutex<HashMap<(String, String), Result<PolicyDecision, PolicyError>>>,
}

impl StaticPolicyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(
        &self,
        resource: impl Into<String>,
        action: impl Into<String>,
        outcome: Result<PolicyDecision, PolicyError>,
    ) {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((resource.into(), action.into()), outcome);
    }
}

impl PolicyEngineClient for StaticPolicyClient {
    fn evaluate(&self, input: &PolicyInput) -> Result<PolicyDecision, PolicyError> {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(input.resource.clone(), input.action.clone()))
            .cloned()
            .unwrap_or_else(|| Ok(PolicyDecision::deny("no policy configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::TenantScope;

    fn input() -> PolicyInput {
        PolicyInput::new(
            vec!["app:login".into()],
            "/api/items",
            "GET",
            TenantScope::Global,
        )
    }

    #[test]
    fn engine_answer_passes_through() {
        let client = StaticPolicyClient::new();
        client.answer("/api/items", "GET", Ok(PolicyDecision::allow()));
        let decision = evaluate_fail_closed(&client, &input());
        assert!(decision.allow);
    }

    #[test]
    fn timeout_maps_to_deny_naming_the_failure() {
        let client = StaticPolicyClient::new();
        client.answer("/api/items", "GET", Err(PolicyError::Timeout));
        let decision = evaluate_fail_closed(&client, &input());
        assert!(!decision.allow);
        assert_eq!(decision.reason.as_deref(), Some("policy evaluation timeout"));
    }

    #[test]
    fn error_status_maps_to_deny_naming_the_status() {
        let client = StaticPolicyClient::new();
        client.answer("/api/items", "GET", Err(PolicyError::Status(503)));
        let decision = evaluate_fail_closed(&client, &input());
        assert!(!decision.allow);
        assert_eq!(
            decision.reason.as_deref(),
            Some("policy evaluation failed with status 503")
        );
    }

    #[test]
    fn unknown_route_denies_by_default() {
        let client = StaticPolicyClient::new();
        let decision = evaluate_fail_closed(&client, &input());
        assert!(!decision.allow);
    }
}
