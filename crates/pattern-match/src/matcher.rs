//! Category scoring against page text.

use std::collections::HashSet;

use formpilot_core_types::Classification;
use regex::Regex;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::patterns::CategoryPatterns;

/// Scores page text against one category's pattern table.
///
/// Stateless between calls; historical evidence is injected per call as a
/// read-only success-rate snapshot rather than reached through shared
/// learning state.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    config: CategoryPatterns,
    indicator_regexes: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new(config: CategoryPatterns) -> Self {
        let indicator_regexes = config
            .indicator_regexes
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!(
                        "Skipping invalid indicator regex for {}: {}",
                        config.category, err
                    );
                    None
                }
            })
            .collect();
        Self {
            config,
            indicator_regexes,
        }
    }

    pub fn category(&self) -> &str {
        &self.config.category
    }

    /// Classify page text, folding in the category's historical success
    /// rate as a small additive bonus. No side effects.
    pub fn classify(&self, page_text: &str, history_rate: f64) -> Classification {
        if page_text.trim().is_empty() {
            return Classification::none(&self.config.category);
        }

        let lower = page_text.to_lowercase();
        let words: HashSet<&str> = lower.unicode_words().collect();

        // Keyword density: matched-count over table size, capped. Short
        // single words match on word boundaries only ("age" must not fire
        // on "page"); longer keywords and phrases match by containment so
        // plural and inflected forms still count.
        let matched_keywords: Vec<String> = self
            .config
            .keywords
            .iter()
            .filter(|keyword| {
                if !keyword.contains(' ') && keyword.len() <= 4 {
                    words.contains(keyword.as_str())
                } else {
                    lower.contains(keyword.as_str())
                }
            })
            .cloned()
            .collect();

        let density = if self.config.keywords.is_empty() {
            0.0
        } else {
            (matched_keywords.len() as f64 / self.config.keywords.len() as f64)
                .min(self.config.density_cap)
        };

        // Structural indicators: fixed bonus each, capped.
        let indicator_hits = self
            .config
            .structural_indicators
            .iter()
            .filter(|phrase| lower.contains(phrase.as_str()))
            .count()
            + self
                .indicator_regexes
                .iter()
                .filter(|re| re.is_match(&lower))
                .count();
        let bonus =
            (indicator_hits as f64 * self.config.structural_bonus).min(self.config.structural_bonus_cap);

        let history_bonus = history_rate.clamp(0.0, 1.0) * self.config.history_weight;

        let mut raw = (density + bonus).max(self.config.baseline) + history_bonus;

        // Exclusionary indicators only ever multiply the score down.
        let exclusion_hits = self
            .config
            .exclusions
            .iter()
            .filter(|phrase| lower.contains(phrase.as_str()))
            .count()
            .min(3);
        if exclusion_hits > 0 {
            let factor = self.config.exclusion_factor.clamp(0.0, 1.0);
            raw *= factor.powi(exclusion_hits as i32);
        }

        debug!(
            category = %self.config.category,
            density,
            bonus,
            history_bonus,
            exclusion_hits,
            raw,
            "classified page text"
        );

        Classification::new(&self.config.category, raw, matched_keywords)
    }
}
