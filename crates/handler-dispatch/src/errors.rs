//! Dispatcher error types.
//!
//! A page where no handler qualifies is not an error; it comes back as
//! [`crate::Selection::NoneQualified`]. Errors here are configuration
//! mistakes caught at registration time.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler already registered: {0}")]
    DuplicateHandler(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
