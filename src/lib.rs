//! Formpilot: confidence-arbitrated web-form automation.
//!
//! The engine classifies a rendered page against a set of question
//! handlers, selects one by adjusted confidence against its adaptive
//! threshold, resolves each answer value to a concrete control through
//! a nine-strategy chain, drives the control, and records the outcome
//! so thresholds keep learning. Anything it cannot do confidently is
//! escalated to a human over a message-passing bridge; the engine never
//! guesses.
//!
//! ```no_run
//! use std::sync::Arc;
//! use formpilot::{FormEngine, ProfileOracle};
//! use formpilot::browser_bridge::FixturePage;
//! use formpilot::escalation_bridge::ScriptedBridge;
//! use formpilot::formpilot_core_types::EscalationStatus;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = FormEngine::builder()
//!     .session(Arc::new(FixturePage::empty()))
//!     .oracle(Arc::new(ProfileOracle::new().with_value("demographics", "Male")))
//!     .escalation(Arc::new(ScriptedBridge::always(EscalationStatus::Skipped)))
//!     .build()?;
//! let result = engine.process_page("What is your gender?").await?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod errors;
pub mod logging;
pub mod oracle;

pub use engine::{FormEngine, FormEngineBuilder, PageResult};
pub use errors::{EngineError, Result};
pub use logging::init_tracing;
pub use oracle::{AnswerOracle, PlannedAnswer, ProfileOracle};

// The workspace crates, re-exported for hosts that embed the engine.
pub use browser_bridge;
pub use element_resolver;
pub use escalation_bridge;
pub use formpilot_core_types;
pub use handler_dispatch;
pub use pattern_match;
pub use threshold_store;
