//! Multi-strategy resolution of answer values to page controls.
//!
//! Handlers know what they want to answer ("Male", "45-54", "Somewhat
//! familiar"); this crate finds the control that expresses it. Nine
//! strategies run in a fixed priority order, from verbatim value
//! matching down to learned-pattern replay, and the first validated hit
//! above the caller's confidence floor wins. An exhausted chain is an
//! ordinary unsuccessful result, never a guess.

pub mod learned;
pub mod resolver;
pub mod similarity;
pub mod strategies;
pub mod synonyms;

pub use learned::{LearnedPattern, LearnedPatternBook, DEFAULT_BOOK_CAPACITY, REPLAY_CONFIDENCE};
pub use resolver::{ElementResolver, StrategyChainResolver};
pub use similarity::text_similarity;
pub use strategies::Strategy;
pub use synonyms::SynonymTable;
