//! Handler selection by confidence arbitration.
//!
//! Every registered handler scores the page; context rules boost or
//! penalize the scores; each adjusted score is tested against the
//! handler's dynamic threshold from the store. The qualifying maximum
//! wins, subject to two configurable heuristics: a priority category
//! that short-circuits selection, and substitution of a near-miss
//! specific handler when only the generic fallback qualified. A page
//! where nobody qualifies is a normal outcome the engine escalates.

pub mod dispatcher;
pub mod errors;
pub mod handler;
pub mod policy;

pub use dispatcher::{HandlerDispatcher, SelectedHandler, Selection};
pub use errors::{DispatchError, Result};
pub use handler::{builtin_handlers, FormHandler, Handler, HandlerConfig};
pub use policy::{ContextRule, DispatchPolicy};
