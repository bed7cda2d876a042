//! Question classification from rendered page text.
//!
//! One [`PatternMatcher`] per question category scores free page text
//! through three additive terms (keyword density, structural indicators,
//! historical success) and one multiplicative penalty (exclusionary
//! indicators), clamped to the global confidence ceiling so no category
//! can claim near-certainty and bypass arbitration.

pub mod matcher;
pub mod patterns;

pub use matcher::PatternMatcher;
pub use patterns::{builtin_patterns, patterns_for, CategoryPatterns};
