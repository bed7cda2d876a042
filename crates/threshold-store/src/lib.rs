//! Threshold learning store.
//!
//! One record per handler: its current dynamic threshold plus the
//! attempt/success counters the threshold is derived from. The store is
//! the single writer of learned state; every other component receives
//! read-only snapshots. Backed either by memory (tests) or by a JSON
//! snapshot on disk that is rewritten after every recorded outcome and
//! reloaded at process start.

pub mod config;
pub mod errors;
pub mod learner;
pub mod model;
pub mod store;

pub use config::{LearnerConfig, ThresholdBand};
pub use errors::{Result, StoreError};
pub use learner::derive_threshold;
pub use model::ThresholdSnapshot;
pub use store::{JsonThresholdStore, MemoryThresholdStore, ThresholdStore};
