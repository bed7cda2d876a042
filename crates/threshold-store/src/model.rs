//! On-disk snapshot model.

use std::collections::HashMap;

use formpilot_core_types::{AutomationOutcome, HandlerThreshold};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the store persists: the per-handler records plus the
/// append-only outcome log they were folded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub records: HashMap<String, HandlerThreshold>,
    #[serde(default)]
    pub outcomes: Vec<AutomationOutcome>,
}

impl ThresholdSnapshot {
    pub fn new() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: HashMap::new(),
            outcomes: Vec::new(),
        }
    }
}
