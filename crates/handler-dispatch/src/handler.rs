//! The handler capability trait and its data-driven implementation.
//!
//! A handler is not a subclass hierarchy; it is one struct configured
//! with a category pattern table and a control kind. Adding a question
//! category means adding configuration, not code.

use std::sync::Arc;

use async_trait::async_trait;
use browser_bridge::BrowserSession;
use formpilot_core_types::{Classification, ControlKind, ControlRef, SearchCriteria};
use pattern_match::{builtin_patterns, CategoryPatterns, PatternMatcher};

/// What the dispatcher needs from a question handler: a score for the
/// page, search criteria for an answer value, and the ability to drive
/// the matched control.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    /// Control kind this handler operates on.
    fn control_kind(&self) -> ControlKind;

    /// Whether this is the generic fallback handler, the one the
    /// dispatcher substitutes away from when a specific handler comes
    /// close enough to its own threshold.
    fn is_fallback(&self) -> bool {
        false
    }

    /// Score the page for this handler's category. The historical
    /// success rate is a read-only snapshot supplied by the caller;
    /// handlers never reach into learning state themselves.
    async fn classify(&self, page_text: &str, history_rate: f64) -> Classification;

    /// Search criteria for resolving one answer value on this page.
    fn criteria(&self, target_value: &str, page_text: &str) -> SearchCriteria;

    /// Drive the matched control with the answer value.
    async fn apply(
        &self,
        session: &dyn BrowserSession,
        control: &ControlRef,
        value: &str,
    ) -> browser_bridge::Result<()>;
}

/// Configuration for one [`FormHandler`].
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub patterns: CategoryPatterns,
    pub control_kind: ControlKind,
    pub fallback: bool,
}

impl HandlerConfig {
    pub fn new(patterns: CategoryPatterns, control_kind: ControlKind) -> Self {
        Self {
            patterns,
            control_kind,
            fallback: false,
        }
    }

    pub fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// Pattern-table-driven handler. All built-in categories are instances
/// of this one type.
pub struct FormHandler {
    name: String,
    matcher: PatternMatcher,
    control_kind: ControlKind,
    fallback: bool,
}

impl FormHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            name: config.patterns.category.clone(),
            matcher: PatternMatcher::new(config.patterns),
            control_kind: config.control_kind,
            fallback: config.fallback,
        }
    }
}

#[async_trait]
impl Handler for FormHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn control_kind(&self) -> ControlKind {
        self.control_kind
    }

    fn is_fallback(&self) -> bool {
        self.fallback
    }

    async fn classify(&self, page_text: &str, history_rate: f64) -> Classification {
        self.matcher.classify(page_text, history_rate)
    }

    fn criteria(&self, target_value: &str, page_text: &str) -> SearchCriteria {
        SearchCriteria::new(target_value, &self.name, self.control_kind)
            .with_context(page_text)
    }

    async fn apply(
        &self,
        session: &dyn BrowserSession,
        control: &ControlRef,
        value: &str,
    ) -> browser_bridge::Result<()> {
        // Drive by the control's actual kind; a category can span kinds
        // (age as a text entry, gender as radios).
        let kind = session
            .control_kind(control)
            .await?
            .unwrap_or(self.control_kind);
        match kind {
            ControlKind::Radio | ControlKind::Checkbox => session.click(control).await,
            ControlKind::Dropdown => session.select_option(control, value).await,
            ControlKind::Text => session.fill(control, value).await,
        }
    }
}

fn kind_for(category: &str) -> ControlKind {
    match category {
        "multi_select" | "recency_activities" => ControlKind::Checkbox,
        "research_required" => ControlKind::Text,
        _ => ControlKind::Radio,
    }
}

/// The standard handler set, one per built-in category, registration
/// order matching the pattern-table order.
pub fn builtin_handlers() -> Vec<Arc<dyn Handler>> {
    builtin_patterns()
        .into_iter()
        .map(|patterns| {
            let kind = kind_for(&patterns.category);
            let mut config = HandlerConfig::new(patterns, kind);
            if config.patterns.category == "unknown" {
                config = config.fallback();
            }
            Arc::new(FormHandler::new(config)) as Arc<dyn Handler>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_bridge::{AppliedAction, ControlSpec, FixturePage};

    #[tokio::test]
    async fn test_builtin_set_has_one_fallback() {
        let handlers = builtin_handlers();
        assert_eq!(handlers.len(), 8);
        let fallbacks: Vec<_> = handlers.iter().filter(|h| h.is_fallback()).collect();
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].name(), "unknown");
    }

    #[tokio::test]
    async fn test_classify_delegates_to_pattern_table() {
        let handlers = builtin_handlers();
        let demographics = handlers.iter().find(|h| h.name() == "demographics").unwrap();
        let c = demographics
            .classify("What is your age? Please enter your age.", 0.0)
            .await;
        assert!(c.confidence > 0.8);
    }

    #[tokio::test]
    async fn test_apply_clicks_choice_controls() {
        let handlers = builtin_handlers();
        let demographics = handlers.iter().find(|h| h.name() == "demographics").unwrap();
        let page = FixturePage::builder()
            .control(ControlSpec::radio("r1").value("Male"))
            .build();

        demographics
            .apply(&page, &ControlRef::new("r1"), "Male")
            .await
            .unwrap();
        assert_eq!(page.applied(), vec![AppliedAction::Clicked(ControlRef::new("r1"))]);
    }

    #[tokio::test]
    async fn test_apply_fills_text_controls() {
        let handlers = builtin_handlers();
        let research = handlers
            .iter()
            .find(|h| h.name() == "research_required")
            .unwrap();
        let page = FixturePage::builder()
            .control(ControlSpec::text_input("answer"))
            .build();

        research
            .apply(&page, &ControlRef::new("answer"), "Optus Stadium")
            .await
            .unwrap();
        assert_eq!(
            page.applied(),
            vec![AppliedAction::Filled(
                ControlRef::new("answer"),
                "Optus Stadium".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_criteria_carries_category_kind_and_context() {
        let handlers = builtin_handlers();
        let multi = handlers.iter().find(|h| h.name() == "multi_select").unwrap();
        let criteria = multi.criteria("Walking", "Which activities apply to you?");
        assert_eq!(criteria.target_value, "Walking");
        assert_eq!(criteria.question_category, "multi_select");
        assert_eq!(criteria.control_kind, ControlKind::Checkbox);
        assert!(criteria.context.contains("activities"));
    }
}
