//! Shared data model for the formpilot engine.
//!
//! Every crate in the workspace speaks in these types: question
//! classifications, element search criteria and detection results, the
//! per-handler threshold records mutated by the learner, and the
//! append-only automation outcomes the learner folds into them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard ceiling for every classifier confidence. No handler may claim
/// near-certainty and bypass arbitration.
pub const CONFIDENCE_CEILING: f64 = 0.98;

/// Kind of form control a handler expects to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Single-choice radio button
    Radio,
    /// Multi-choice checkbox
    Checkbox,
    /// `<select>` dropdown (matched against its options)
    Dropdown,
    /// Free-text or numeric input
    Text,
}

impl ControlKind {
    /// Get kind name as string
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Radio => "radio",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Dropdown => "dropdown",
            ControlKind::Text => "text",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle to a control owned by the browser session collaborator.
///
/// The engine never dereferences this; it only hands it back to the
/// session for visibility checks and apply operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlRef(pub String);

impl ControlRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of classifying one page against one question category.
///
/// Created fresh per page evaluation and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Question category this score belongs to
    pub category: String,
    /// Clamped confidence in [0, CONFIDENCE_CEILING]
    pub confidence: f64,
    /// Keywords that matched, in match order
    pub matched_keywords: Vec<String>,
    /// Uncapped score before clamping (diagnostic)
    pub raw_score: f64,
}

impl Classification {
    /// Create a classification, clamping confidence into the valid band.
    pub fn new(category: impl Into<String>, raw_score: f64, matched_keywords: Vec<String>) -> Self {
        Self {
            category: category.into(),
            confidence: raw_score.clamp(0.0, CONFIDENCE_CEILING),
            matched_keywords,
            raw_score,
        }
    }

    /// Zero-confidence classification for a category (e.g. empty page text).
    pub fn none(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            confidence: 0.0,
            matched_keywords: Vec::new(),
            raw_score: 0.0,
        }
    }
}

/// Criteria for one element-resolution call.
///
/// Constructed by the dispatcher, immutable for the duration of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// The answer value we want to select or enter
    pub target_value: String,
    /// Question category driving synonym and pattern lookup
    pub question_category: String,
    /// Expected control kind; candidates of other kinds are rejected
    pub control_kind: ControlKind,
    /// Semantic synonyms supplied by the caller, in addition to the
    /// resolver's built-in tables
    pub alternatives: Vec<String>,
    /// Minimum confidence a strategy result must carry to be accepted
    pub confidence_floor: f64,
    /// Free-text page context for proximity scoring
    pub context: String,
}

impl SearchCriteria {
    pub fn new(
        target_value: impl Into<String>,
        question_category: impl Into<String>,
        control_kind: ControlKind,
    ) -> Self {
        Self {
            target_value: target_value.into(),
            question_category: question_category.into(),
            control_kind,
            alternatives: Vec::new(),
            confidence_floor: 0.5,
            context: String::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Outcome of one strategy attempt (or of the whole resolution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Matched control, if any
    pub control: Option<ControlRef>,
    /// Strategy's own confidence in the match (0 when no candidate)
    pub confidence: f64,
    /// Name of the strategy that produced this result
    pub strategy_used: String,
    /// Strategy-specific diagnostics (matched text, selector, scores)
    pub metadata: HashMap<String, serde_json::Value>,
    /// Whether a usable control was found
    pub success: bool,
}

impl DetectionResult {
    /// Successful detection.
    pub fn hit(control: ControlRef, confidence: f64, strategy: impl Into<String>) -> Self {
        Self {
            control: Some(control),
            confidence,
            strategy_used: strategy.into(),
            metadata: HashMap::new(),
            success: true,
        }
    }

    /// Strategy found nothing; the resolver moves on to the next one.
    pub fn miss(strategy: impl Into<String>) -> Self {
        Self {
            control: None,
            confidence: 0.0,
            strategy_used: strategy.into(),
            metadata: HashMap::new(),
            success: false,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Advisory trend bucket derived from a handler's success rate.
///
/// Never used for arbitration; surfaced in statistics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Excellent,
    Improving,
    Stable,
    NeedsAttention,
}

/// Per-handler learning record, persisted between runs.
///
/// Invariants: `0 < threshold <= 1` and
/// `successful_attempts <= total_attempts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerThreshold {
    pub handler_name: String,
    pub threshold: f64,
    pub total_attempts: u32,
    pub successful_attempts: u32,
    pub last_updated: DateTime<Utc>,
    pub last_success: Option<DateTime<Utc>>,
}

impl HandlerThreshold {
    /// Fresh record seeded at the configured default threshold.
    pub fn seeded(handler_name: impl Into<String>, threshold: f64) -> Self {
        Self {
            handler_name: handler_name.into(),
            threshold,
            total_attempts: 0,
            successful_attempts: 0,
            last_updated: Utc::now(),
            last_success: None,
        }
    }

    /// Observed success rate, 0 when no attempts were recorded yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        f64::from(self.successful_attempts) / f64::from(self.total_attempts)
    }

    pub fn trend(&self) -> Trend {
        let rate = self.success_rate();
        if rate > 0.8 {
            Trend::Excellent
        } else if rate > 0.6 {
            Trend::Improving
        } else if rate > 0.4 {
            Trend::Stable
        } else {
            Trend::NeedsAttention
        }
    }
}

/// Write-once record of one automation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationOutcome {
    pub id: Uuid,
    pub handler_name: String,
    pub question_category: String,
    pub confidence: f64,
    pub success: bool,
    pub error_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AutomationOutcome {
    pub fn success(
        handler_name: impl Into<String>,
        question_category: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler_name: handler_name.into(),
            question_category: question_category.into(),
            confidence,
            success: true,
            error_reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        handler_name: impl Into<String>,
        question_category: impl Into<String>,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler_name: handler_name.into(),
            question_category: question_category.into(),
            confidence,
            success: false,
            error_reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Terminal status returned by the human-intervention collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationStatus {
    /// Human completed the step; continue with the next page
    Completed,
    /// Human chose to skip this step
    Skipped,
    /// The whole task should stop (e.g. already complete)
    AbortTask,
}
