//! Scripted bridge for tests and headless runs.

use parking_lot::RwLock;
use async_trait::async_trait;
use formpilot_core_types::EscalationStatus;
use tracing::info;

use crate::bridge::{EscalationBridge, EscalationOutcome, EscalationRequest};
use crate::errors::{BridgeError, Result};

/// Aggregate view of what was escalated and how it ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscalationSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub aborted: usize,
}

#[derive(Default)]
struct ScriptedState {
    responses: Vec<EscalationOutcome>,
    received: Vec<EscalationRequest>,
    resolved: Vec<EscalationStatus>,
}

/// Bridge that answers from a pre-arranged script. Engine tests use it
/// in place of a live operator console; it records every request so
/// assertions can inspect what the engine escalated.
#[derive(Default)]
pub struct ScriptedBridge {
    state: RwLock<ScriptedState>,
    fallback: Option<EscalationStatus>,
}

impl ScriptedBridge {
    /// Answer every escalation with the same status.
    pub fn always(status: EscalationStatus) -> Self {
        Self {
            state: RwLock::new(ScriptedState::default()),
            fallback: Some(status),
        }
    }

    /// Answer escalations from a queue, in order; a request past the
    /// end of the script fails as bridge-unavailable.
    pub fn scripted(responses: Vec<EscalationOutcome>) -> Self {
        Self {
            state: RwLock::new(ScriptedState {
                responses,
                received: Vec::new(),
                resolved: Vec::new(),
            }),
            fallback: None,
        }
    }

    /// Requests received so far, in order.
    pub fn received(&self) -> Vec<EscalationRequest> {
        self.state.read().received.clone()
    }

    pub fn summary(&self) -> EscalationSummary {
        let state = self.state.read();
        let mut summary = EscalationSummary {
            total: state.received.len(),
            ..EscalationSummary::default()
        };
        for status in &state.resolved {
            match status {
                EscalationStatus::Completed => summary.completed += 1,
                EscalationStatus::Skipped => summary.skipped += 1,
                EscalationStatus::AbortTask => summary.aborted += 1,
            }
        }
        summary
    }
}

#[async_trait]
impl EscalationBridge for ScriptedBridge {
    async fn escalate(&self, request: EscalationRequest) -> Result<EscalationOutcome> {
        let mut state = self.state.write();
        info!(
            id = %request.id,
            category = request.question_category.as_deref().unwrap_or("-"),
            "escalation requested"
        );
        state.received.push(request);

        let outcome = if state.responses.is_empty() {
            match self.fallback {
                Some(status) => EscalationOutcome::new(status),
                None => {
                    return Err(BridgeError::Unavailable(
                        "escalation script exhausted".to_string(),
                    ))
                }
            }
        } else {
            state.responses.remove(0)
        };
        state.resolved.push(outcome.status);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::EscalationReason;

    fn request() -> EscalationRequest {
        EscalationRequest::new(
            Some("demographics".to_string()),
            EscalationReason::ElementNotFound {
                target_value: "Male".to_string(),
            },
            "What is your gender?",
        )
    }

    #[tokio::test]
    async fn test_always_answers_with_fixed_status() {
        let bridge = ScriptedBridge::always(EscalationStatus::Completed);
        let outcome = bridge.escalate(request()).await.unwrap();
        assert_eq!(outcome.status, EscalationStatus::Completed);
        assert_eq!(bridge.received().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_answers_in_order_then_fails() {
        let bridge = ScriptedBridge::scripted(vec![
            EscalationOutcome::new(EscalationStatus::Skipped),
            EscalationOutcome::new(EscalationStatus::AbortTask).with_note("survey over"),
        ]);

        assert_eq!(
            bridge.escalate(request()).await.unwrap().status,
            EscalationStatus::Skipped
        );
        let second = bridge.escalate(request()).await.unwrap();
        assert_eq!(second.status, EscalationStatus::AbortTask);
        assert_eq!(second.operator_note.as_deref(), Some("survey over"));

        let err = bridge.escalate(request()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_summary_counts_by_status() {
        let bridge = ScriptedBridge::scripted(vec![
            EscalationOutcome::new(EscalationStatus::Completed),
            EscalationOutcome::new(EscalationStatus::Skipped),
            EscalationOutcome::new(EscalationStatus::Completed),
        ]);
        for _ in 0..3 {
            bridge.escalate(request()).await.unwrap();
        }
        assert_eq!(
            bridge.summary(),
            EscalationSummary {
                total: 3,
                completed: 2,
                skipped: 1,
                aborted: 0,
            }
        );
    }
}
