//! Arbitration policy: context adjustments and selection heuristics.
//!
//! The priority short-circuit and the 80%-of-threshold fallback
//! substitution are empirically tuned business rules, so they live here
//! as configuration rather than as constants inside the dispatcher.

use serde::{Deserialize, Serialize};

/// One context adjustment: when enough of the rule's phrases appear in
/// the page text, the named handler's confidence moves by the delta of
/// the highest tier met.
///
/// Tiers allow graduated effects ("two research markers: +0.3, one:
/// +0.1") without applying both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRule {
    pub handler: String,
    pub phrases: Vec<String>,
    /// (minimum distinct phrase matches, delta), best met tier applies
    pub tiers: Vec<(usize, f64)>,
}

impl ContextRule {
    pub fn new(handler: impl Into<String>, phrases: &[&str], tiers: &[(usize, f64)]) -> Self {
        Self {
            handler: handler.into(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            tiers: tiers.to_vec(),
        }
    }

    fn delta_for(&self, page_text: &str) -> f64 {
        let matches = self
            .phrases
            .iter()
            .filter(|phrase| page_text.contains(phrase.as_str()))
            .count();
        self.tiers
            .iter()
            .filter(|(min, _)| matches >= *min)
            .max_by_key(|(min, _)| *min)
            .map(|(_, delta)| *delta)
            .unwrap_or(0.0)
    }
}

/// Dispatcher-wide selection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// Category that short-circuits selection as soon as it clears its
    /// threshold, regardless of other handlers' scores
    pub priority_category: Option<String>,
    /// Name of the generic fallback handler
    pub fallback_handler: String,
    /// When only the fallback qualifies, a specific handler whose
    /// unadjusted confidence reaches this fraction of its own threshold
    /// is substituted in preference
    pub fallback_factor: f64,
    /// Ceiling for boosted confidences
    pub boost_cap: f64,
    /// Floor for penalized confidences
    pub penalty_floor: f64,
    pub context_rules: Vec<ContextRule>,
}

impl DispatchPolicy {
    /// Apply context adjustments to one handler's confidence. Boosted
    /// scores cap at `boost_cap`, penalized ones floor at
    /// `penalty_floor`; an unadjusted score passes through untouched.
    pub fn adjust(&self, handler: &str, confidence: f64, page_text: &str) -> f64 {
        let lower = page_text.to_lowercase();
        let delta: f64 = self
            .context_rules
            .iter()
            .filter(|rule| rule.handler == handler)
            .map(|rule| rule.delta_for(&lower))
            .sum();

        let adjusted = confidence + delta;
        if delta > 0.0 {
            adjusted.min(self.boost_cap)
        } else if delta < 0.0 {
            adjusted.max(self.penalty_floor)
        } else {
            confidence
        }
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            priority_category: Some("brand_familiarity".to_string()),
            fallback_handler: "unknown".to_string(),
            fallback_factor: 0.8,
            boost_cap: 0.98,
            penalty_floor: 0.02,
            context_rules: vec![
                ContextRule::new(
                    "trust_rating",
                    &["trustworthy", "how much do you trust", "rate the trust"],
                    &[(1, 0.2)],
                ),
                ContextRule::new(
                    "trust_rating",
                    &["1-10", "1 to 10", "0-10", "scale of"],
                    &[(1, 0.1)],
                ),
                ContextRule::new("trust_rating", &["familiar"], &[(1, -0.3)]),
                ContextRule::new(
                    "research_required",
                    &["sponsor", "venue", "stadium", "headquartered"],
                    &[(2, 0.3), (1, 0.1)],
                ),
                ContextRule::new(
                    "demographics",
                    &["your age", "how old", "gender", "income", "education", "employment"],
                    &[(2, 0.2)],
                ),
                ContextRule::new("demographics", &["sponsor", "venue", "stadium"], &[(1, -0.2)]),
                ContextRule::new("brand_familiarity", &["familiar", "brand"], &[(2, 0.2)]),
                ContextRule::new("brand_familiarity", &["trustworthy"], &[(1, -0.2)]),
                ContextRule::new(
                    "multi_select",
                    &["select all", "all that apply", "choose all"],
                    &[(1, 0.2)],
                ),
            ],
        }
    }
}
