//! Replayable query patterns recorded from successful resolutions.

use browser_bridge::Query;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Confidence a replayed pattern claims. Deliberately modest: a pattern
/// that worked on one page is a lead, not proof, on the next.
pub const REPLAY_CONFIDENCE: f64 = 0.6;

/// Default retention limit for a book.
pub const DEFAULT_BOOK_CAPACITY: usize = 64;

/// One query that previously located a control for a question category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub category: String,
    pub query: Query,
    pub confidence: f64,
    pub hits: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Per-session book of learned patterns, shared between the resolver
/// (writer) and the learned-pattern strategy (reader). Retention is
/// bounded: once the book is full, recording a new pattern evicts the
/// least-replayed (then oldest) entry.
#[derive(Debug)]
pub struct LearnedPatternBook {
    capacity: usize,
    patterns: RwLock<Vec<LearnedPattern>>,
}

impl Default for LearnedPatternBook {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BOOK_CAPACITY)
    }
}

impl LearnedPatternBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            patterns: RwLock::new(Vec::new()),
        }
    }

    /// Record a query that just located a control, bumping the hit count
    /// if the same pattern was already known for the category.
    pub fn record(&self, category: &str, query: Query, confidence: f64) {
        let mut patterns = self.patterns.write();
        if let Some(existing) = patterns
            .iter_mut()
            .find(|p| p.category == category && p.query == query)
        {
            existing.hits += 1;
            existing.confidence = existing.confidence.max(confidence);
            existing.recorded_at = Utc::now();
            return;
        }
        if patterns.len() >= self.capacity {
            if let Some(evict) = patterns
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| (p.hits, p.recorded_at))
                .map(|(index, _)| index)
            {
                patterns.remove(evict);
            }
        }
        patterns.push(LearnedPattern {
            category: category.to_string(),
            query,
            confidence,
            hits: 1,
            recorded_at: Utc::now(),
        });
    }

    /// Patterns for a category, most-hit first.
    pub fn for_category(&self, category: &str) -> Vec<LearnedPattern> {
        let mut matches: Vec<LearnedPattern> = self
            .patterns
            .read()
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.hits.cmp(&a.hits));
        matches
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }
}
