//! Human-in-the-loop escalation.
//!
//! When arbitration, resolution or application fails, the engine does
//! not guess; it sends an [`EscalationRequest`] across this bridge and
//! waits for a terminal [`formpilot_core_types::EscalationStatus`]. The
//! exchange is pure message passing, so any host (console prompt,
//! operator dashboard, test script) can sit on the other side.

pub mod bridge;
pub mod errors;
pub mod scripted;

pub use bridge::{EscalationBridge, EscalationOutcome, EscalationReason, EscalationRequest};
pub use errors::{BridgeError, Result};
pub use scripted::{EscalationSummary, ScriptedBridge};
