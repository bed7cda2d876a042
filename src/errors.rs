//! Engine-level error type.

use escalation_bridge::BridgeError;
use thiserror::Error;
use threshold_store::StoreError;

/// Failures that end page processing abnormally. Everything recoverable
/// (no qualifying handler, unresolved element, failed application) is
/// handled inside the page loop by escalating; these are the cases
/// where even escalation or record-keeping is impossible.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
