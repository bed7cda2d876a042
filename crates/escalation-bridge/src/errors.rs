//! Escalation bridge error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host side of the bridge is gone (channel closed, operator
    /// console disconnected). The engine treats this as a task abort.
    #[error("escalation bridge unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
