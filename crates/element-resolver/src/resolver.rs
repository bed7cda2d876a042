//! Ordered strategy chain with short-circuit acceptance.

use std::sync::Arc;

use async_trait::async_trait;
use browser_bridge::{BrowserSession, Query};
use formpilot_core_types::{DetectionResult, SearchCriteria};
use tracing::{debug, info, warn};

use crate::learned::{LearnedPatternBook, REPLAY_CONFIDENCE};
use crate::strategies::{
    AccessibilityStrategy, CommonStructureStrategy, ExactValueStrategy, LabelAssociationStrategy,
    LearnedPatternStrategy, NearbyTextStrategy, SemanticStrategy, Strategy, TextContentStrategy,
    VisualStrategy,
};
use crate::synonyms::SynonymTable;

/// Resolves search criteria to a concrete control, or reports that no
/// strategy could.
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Run the strategy chain. Never errors: session failures and
    /// exhausted chains both come back as an unsuccessful result.
    async fn resolve(&self, criteria: &SearchCriteria) -> DetectionResult;
}

/// Default resolver: the nine built-in strategies in fixed priority
/// order, first accepted hit wins.
///
/// A hit is accepted when its confidence reaches the criteria's floor;
/// below-floor hits and strategy errors fall through to the next
/// strategy. Resolution is read-only against the page, so resolving the
/// same criteria twice returns the same result.
pub struct StrategyChainResolver {
    session: Arc<dyn BrowserSession>,
    strategies: Vec<Arc<dyn Strategy>>,
    learned: Arc<LearnedPatternBook>,
}

impl StrategyChainResolver {
    pub fn new(session: Arc<dyn BrowserSession>) -> Self {
        Self::with_book(session, Arc::new(LearnedPatternBook::new()))
    }

    /// Build with a shared pattern book, so learned queries survive
    /// across pages within a session.
    pub fn with_book(session: Arc<dyn BrowserSession>, learned: Arc<LearnedPatternBook>) -> Self {
        let synonyms = Arc::new(SynonymTable::builtin());
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(ExactValueStrategy),
            Arc::new(SemanticStrategy::new(synonyms)),
            Arc::new(LabelAssociationStrategy),
            Arc::new(TextContentStrategy),
            Arc::new(NearbyTextStrategy),
            Arc::new(CommonStructureStrategy),
            Arc::new(AccessibilityStrategy),
            Arc::new(VisualStrategy),
            Arc::new(LearnedPatternStrategy::new(learned.clone())),
        ];
        Self {
            session,
            strategies,
            learned,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn learned(&self) -> &Arc<LearnedPatternBook> {
        &self.learned
    }

    /// Strategies that can name the query that found the control attach
    /// it as replay metadata; those get remembered for the category.
    fn remember(&self, criteria: &SearchCriteria, result: &DetectionResult) {
        let Some(value) = result.metadata.get("replay_query") else {
            return;
        };
        match serde_json::from_value::<Query>(value.clone()) {
            Ok(query) => {
                self.learned
                    .record(&criteria.question_category, query, REPLAY_CONFIDENCE);
            }
            Err(error) => {
                debug!(%error, "unreadable replay query in detection metadata");
            }
        }
    }
}

#[async_trait]
impl ElementResolver for StrategyChainResolver {
    async fn resolve(&self, criteria: &SearchCriteria) -> DetectionResult {
        if criteria.target_value.trim().is_empty() {
            return DetectionResult::miss("exhausted");
        }

        for strategy in &self.strategies {
            match strategy.detect(self.session.as_ref(), criteria).await {
                Ok(result) if result.success => {
                    if result.confidence + 1e-9 >= criteria.confidence_floor {
                        info!(
                            strategy = strategy.name(),
                            confidence = result.confidence,
                            target = %criteria.target_value,
                            "resolved control"
                        );
                        self.remember(criteria, &result);
                        return result;
                    }
                    debug!(
                        strategy = strategy.name(),
                        confidence = result.confidence,
                        floor = criteria.confidence_floor,
                        "hit below confidence floor"
                    );
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), "no match");
                }
                Err(error) if error.is_timeout() => {
                    warn!(
                        strategy = strategy.name(),
                        %error,
                        "query timed out, treated as non-match"
                    );
                }
                Err(error) => {
                    warn!(strategy = strategy.name(), %error, "strategy failed");
                }
            }
        }

        debug!(target = %criteria.target_value, "all strategies exhausted");
        DetectionResult::miss("exhausted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_bridge::{ControlSpec, FixturePage};
    use formpilot_core_types::{ControlKind, ControlRef};

    fn gender_criteria(target: &str) -> SearchCriteria {
        SearchCriteria::new(target, "demographics", ControlKind::Radio)
    }

    fn man_woman_page() -> FixturePage {
        FixturePage::builder()
            .control(ControlSpec::radio("r-man").value("Man").text("Man"))
            .control(ControlSpec::radio("r-woman").value("Woman").text("Woman"))
            .build()
    }

    #[tokio::test]
    async fn test_semantic_fallback_when_exact_value_misses() {
        // Target spelling "Male" appears nowhere; the synonym bridge
        // must pick the Man radio through the second strategy.
        let resolver = StrategyChainResolver::new(Arc::new(man_woman_page()));
        let result = resolver.resolve(&gender_criteria("Male")).await;

        assert!(result.success);
        assert_eq!(result.control, Some(ControlRef::new("r-man")));
        assert_eq!(result.strategy_used, "semantic-equivalence");
        assert!(result.confidence >= 0.85);
    }

    #[tokio::test]
    async fn test_exact_value_short_circuits_the_chain() {
        let page = FixturePage::builder()
            .control(ControlSpec::radio("r1").value("Male").text("Male"))
            .control(ControlSpec::radio("r2").value("Man").text("Man").aria_label("Male"))
            .build();
        let resolver = StrategyChainResolver::new(Arc::new(page));
        let result = resolver.resolve(&gender_criteria("Male")).await;

        assert_eq!(result.strategy_used, "exact-value");
        assert_eq!(result.control, Some(ControlRef::new("r1")));
    }

    #[tokio::test]
    async fn test_earlier_strategy_outranks_later_match() {
        // Both the label and the accessibility attribute point at a
        // control; label association sits earlier in the chain.
        let page = FixturePage::builder()
            .control(ControlSpec::radio("r1").value("opt-1"))
            .control(ControlSpec::radio("r2").value("opt-2").aria_label("Blue"))
            .label_for("Blue", "r1")
            .build();
        let resolver = StrategyChainResolver::new(Arc::new(page));
        let result = resolver
            .resolve(&SearchCriteria::new("Blue", "brand_familiarity", ControlKind::Radio))
            .await;

        assert_eq!(result.strategy_used, "label-association");
        assert_eq!(result.control, Some(ControlRef::new("r1")));
    }

    #[tokio::test]
    async fn test_timeout_falls_through_to_next_strategy() {
        let page = FixturePage::builder()
            .control(ControlSpec::radio("r-man").value("Man").text("Man"))
            .control(ControlSpec::radio("r-woman").value("Woman").text("Woman"))
            .timeout_on(Query::KindWithValue {
                kind: ControlKind::Radio,
                value: "Male".to_string(),
            })
            .build();
        let resolver = StrategyChainResolver::new(Arc::new(page));
        let result = resolver.resolve(&gender_criteria("Male")).await;

        assert!(result.success);
        assert_eq!(result.strategy_used, "semantic-equivalence");
    }

    #[tokio::test]
    async fn test_confidence_floor_rejects_weak_hits() {
        let resolver = StrategyChainResolver::new(Arc::new(man_woman_page()));
        let result = resolver
            .resolve(&gender_criteria("Male").with_confidence_floor(0.9))
            .await;

        assert!(!result.success);
        assert_eq!(result.strategy_used, "exhausted");
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let resolver = StrategyChainResolver::new(Arc::new(man_woman_page()));
        let first = resolver.resolve(&gender_criteria("Male")).await;
        let second = resolver.resolve(&gender_criteria("Male")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_page_resolves_to_failure() {
        let resolver = StrategyChainResolver::new(Arc::new(FixturePage::empty()));
        let result = resolver.resolve(&gender_criteria("Male")).await;
        assert!(!result.success);
        assert!(result.control.is_none());
    }

    #[tokio::test]
    async fn test_successful_exact_match_is_remembered() {
        let page = FixturePage::builder()
            .control(ControlSpec::radio("r1").value("Male").text("Male"))
            .build();
        let resolver = StrategyChainResolver::new(Arc::new(page));
        assert!(resolver.learned().is_empty());

        let result = resolver.resolve(&gender_criteria("Male")).await;
        assert!(result.success);
        assert_eq!(resolver.learned().len(), 1);
        assert_eq!(
            resolver.learned().for_category("demographics")[0].query,
            Query::KindWithValue {
                kind: ControlKind::Radio,
                value: "Male".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_chain_holds_nine_strategies_in_order() {
        let resolver = StrategyChainResolver::new(Arc::new(FixturePage::empty()));
        assert_eq!(
            resolver.strategy_names(),
            vec![
                "exact-value",
                "semantic-equivalence",
                "label-association",
                "text-content",
                "nearby-text",
                "common-structure",
                "accessibility",
                "visual",
                "learned-pattern",
            ]
        );
    }
}
