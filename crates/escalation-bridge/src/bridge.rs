//! The escalation contract between the engine and its host.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formpilot_core_types::EscalationStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;

/// Why the engine is handing a step to a human.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EscalationReason {
    /// Arbitration ended with no qualifying handler
    NoHandlerQualified { best_confidence: f64 },
    /// A handler was selected but the answer source has no value for
    /// this question
    AnswerUnavailable,
    /// A handler was selected but no strategy located the control
    ElementNotFound { target_value: String },
    /// The control was found but driving it failed
    ApplyFailed { detail: String },
}

/// One request for human intervention. Message-passing only: the engine
/// sends this value and awaits the terminal status; it never reaches
/// into host state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub id: Uuid,
    /// Category of the selected handler, absent when arbitration itself
    /// failed
    pub question_category: Option<String>,
    pub reason: EscalationReason,
    /// Page text captured at escalation time, so the operator sees what
    /// the engine saw
    pub page_snapshot: String,
    pub requested_at: DateTime<Utc>,
}

impl EscalationRequest {
    pub fn new(
        question_category: Option<String>,
        reason: EscalationReason,
        page_snapshot: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_category,
            reason,
            page_snapshot: page_snapshot.into(),
            requested_at: Utc::now(),
        }
    }
}

/// Terminal answer from the human side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationOutcome {
    pub status: EscalationStatus,
    pub operator_note: Option<String>,
}

impl EscalationOutcome {
    pub fn new(status: EscalationStatus) -> Self {
        Self {
            status,
            operator_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.operator_note = Some(note.into());
        self
    }
}

/// Host-side collaborator that puts a human in the loop.
///
/// `escalate` suspends until the operator resolves the step; the
/// returned status tells the engine whether to continue, skip, or stop
/// the whole task.
#[async_trait]
pub trait EscalationBridge: Send + Sync {
    async fn escalate(&self, request: EscalationRequest) -> Result<EscalationOutcome>;
}
