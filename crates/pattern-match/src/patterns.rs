//! Built-in per-category pattern tables.
//!
//! Category behavior is configuration, not code: each table carries the
//! keyword set scored for density, the structural indicator phrases and
//! regexes that earn a fixed bonus each, and the exclusionary phrases
//! that multiply the score down when present.

use serde::{Deserialize, Serialize};

/// Pattern configuration for one question category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPatterns {
    /// Category name; doubles as the handler name
    pub category: String,
    /// Keywords scored as matched-count / total-count
    pub keywords: Vec<String>,
    /// Phrases that each earn `structural_bonus` when present
    pub structural_indicators: Vec<String>,
    /// Regex indicators, same bonus as phrase indicators
    pub indicator_regexes: Vec<String>,
    /// Exclusionary phrases; each occurrence multiplies the score by
    /// `exclusion_factor`, never raising it
    pub exclusions: Vec<String>,
    /// Bonus per matched structural indicator
    pub structural_bonus: f64,
    /// Cap on the total structural bonus
    pub structural_bonus_cap: f64,
    /// Cap on the keyword-density term
    pub density_cap: f64,
    /// Multiplier applied once per exclusion match (up to three)
    pub exclusion_factor: f64,
    /// Weight of the historical success-rate bonus
    pub history_weight: f64,
    /// Constant floor score emitted even without keyword evidence;
    /// non-zero only for the generic fallback category
    pub baseline: f64,
}

impl CategoryPatterns {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            keywords: Vec::new(),
            structural_indicators: Vec::new(),
            indicator_regexes: Vec::new(),
            exclusions: Vec::new(),
            structural_bonus: 0.2,
            structural_bonus_cap: 0.4,
            density_cap: 0.8,
            exclusion_factor: 0.7,
            history_weight: 0.1,
            baseline: 0.0,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Standard category set, modeled on the handlers the engine ships with.
pub fn builtin_patterns() -> Vec<CategoryPatterns> {
    vec![
        demographics(),
        brand_familiarity(),
        rating_matrix(),
        multi_select(),
        trust_rating(),
        recency_activities(),
        research_required(),
        unknown(),
    ]
}

/// Lookup one built-in table by category name.
pub fn patterns_for(category: &str) -> Option<CategoryPatterns> {
    builtin_patterns().into_iter().find(|p| p.category == category)
}

fn demographics() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&[
            "age",
            "your age",
            "gender",
            "income",
            "education",
            "employment",
            "occupation",
            "postcode",
            "marital",
            "household",
        ]),
        structural_indicators: strings(&[
            "what is your age",
            "please enter your age",
            "how old are you",
            "select your gender",
            "year were you born",
        ]),
        exclusions: strings(&[
            "purchased",
            "bought",
            "product",
            "brand",
            "last 12 months",
            "consumption",
            "shopping",
            "sponsor",
            "venue",
        ]),
        structural_bonus: 0.35,
        structural_bonus_cap: 0.7,
        ..CategoryPatterns::new("demographics")
    }
}

fn brand_familiarity() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&["familiar", "brand", "heard of", "currently use", "aware of"]),
        structural_indicators: strings(&[
            "very familiar",
            "somewhat familiar",
            "not familiar",
            "never heard of",
        ]),
        exclusions: strings(&["trustworthy"]),
        structural_bonus: 0.25,
        structural_bonus_cap: 0.5,
        ..CategoryPatterns::new("brand_familiarity")
    }
}

fn rating_matrix() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&[
            "rate",
            "rating",
            "scale",
            "agree",
            "disagree",
            "statement",
            "opinion",
        ]),
        structural_indicators: strings(&[
            "strongly agree",
            "strongly disagree",
            "neither agree nor disagree",
        ]),
        indicator_regexes: vec![r"(?i)\b(?:10|[1-9])\s*(?:-|to|–)\s*(?:10|[1-9])\b".to_string()],
        structural_bonus: 0.2,
        structural_bonus_cap: 0.4,
        ..CategoryPatterns::new("rating_matrix")
    }
}

fn multi_select() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&["select", "choose", "apply", "multiple", "options"]),
        structural_indicators: strings(&[
            "select all that apply",
            "check all that apply",
            "choose all",
            "more than one",
        ]),
        structural_bonus: 0.3,
        structural_bonus_cap: 0.6,
        ..CategoryPatterns::new("multi_select")
    }
}

fn trust_rating() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&["trust", "trustworthy", "reliable", "confidence in"]),
        structural_indicators: strings(&["how much do you trust", "rate the trust"]),
        indicator_regexes: vec![r"(?i)\bscale of\b".to_string()],
        exclusions: strings(&["familiar"]),
        structural_bonus: 0.2,
        structural_bonus_cap: 0.4,
        ..CategoryPatterns::new("trust_rating")
    }
}

fn recency_activities() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&[
            "last time",
            "recently",
            "in the past",
            "activities",
            "how often",
            "when did you",
        ]),
        structural_indicators: strings(&[
            "in the last month",
            "in the last 3 months",
            "in the last year",
            "never",
        ]),
        structural_bonus: 0.2,
        structural_bonus_cap: 0.4,
        ..CategoryPatterns::new("recency_activities")
    }
}

fn research_required() -> CategoryPatterns {
    CategoryPatterns {
        keywords: strings(&["sponsor", "venue", "stadium", "which company", "where is"]),
        structural_indicators: strings(&["official sponsor", "headquartered"]),
        structural_bonus: 0.3,
        structural_bonus_cap: 0.6,
        ..CategoryPatterns::new("research_required")
    }
}

/// Generic fallback. No keyword evidence; a constant weak score keeps it
/// selectable only once its learned threshold has earned trust.
fn unknown() -> CategoryPatterns {
    CategoryPatterns {
        baseline: 0.3,
        ..CategoryPatterns::new("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_categories_are_unique() {
        let patterns = builtin_patterns();
        let mut names: Vec<_> = patterns.iter().map(|p| p.category.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), patterns.len());
    }

    #[test]
    fn test_lookup_by_category() {
        assert!(patterns_for("demographics").is_some());
        assert!(patterns_for("brand_familiarity").is_some());
        assert!(patterns_for("nonexistent").is_none());
    }

    #[test]
    fn test_only_fallback_has_baseline() {
        for p in builtin_patterns() {
            if p.category == "unknown" {
                assert!(p.baseline > 0.0);
            } else {
                assert_eq!(p.baseline, 0.0);
            }
        }
    }
}
