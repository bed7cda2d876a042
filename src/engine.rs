//! The per-page automation loop.

use std::sync::Arc;

use anyhow::Context;
use browser_bridge::BrowserSession;
use element_resolver::{ElementResolver, LearnedPatternBook, StrategyChainResolver};
use escalation_bridge::{EscalationBridge, EscalationReason, EscalationRequest};
use formpilot_core_types::{AutomationOutcome, EscalationStatus, HandlerThreshold};
use handler_dispatch::{DispatchPolicy, Handler, HandlerDispatcher, SelectedHandler, Selection};
use threshold_store::{LearnerConfig, MemoryThresholdStore, ThresholdStore};
use tracing::{info, warn};

use crate::errors::Result;
use crate::oracle::AnswerOracle;

/// Terminal result of processing one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// A handler qualified and every answer value was applied
    Automated {
        handler: String,
        confidence: f64,
        applied: usize,
    },
    /// The page went to a human; the status says how to continue
    Escalated(EscalationStatus),
}

/// Orchestrates one survey session: classify the page, arbitrate
/// between handlers, resolve each answer value to a control, drive it,
/// record the outcome, and escalate whenever the pipeline comes up
/// short. Pages are strictly sequential; there are no retries at this
/// level.
pub struct FormEngine {
    session: Arc<dyn BrowserSession>,
    dispatcher: HandlerDispatcher,
    resolver: Arc<dyn ElementResolver>,
    store: Arc<dyn ThresholdStore>,
    oracle: Arc<dyn AnswerOracle>,
    escalation: Arc<dyn EscalationBridge>,
}

/// Assembles a [`FormEngine`] from its collaborators. Session, oracle
/// and escalation bridge are required; the store defaults to an
/// in-memory one and the policy to [`DispatchPolicy::default`].
#[derive(Default)]
pub struct FormEngineBuilder {
    session: Option<Arc<dyn BrowserSession>>,
    oracle: Option<Arc<dyn AnswerOracle>>,
    escalation: Option<Arc<dyn EscalationBridge>>,
    store: Option<Arc<dyn ThresholdStore>>,
    policy: DispatchPolicy,
}

impl FormEngineBuilder {
    pub fn session(mut self, session: Arc<dyn BrowserSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn oracle(mut self, oracle: Arc<dyn AnswerOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn escalation(mut self, escalation: Arc<dyn EscalationBridge>) -> Self {
        self.escalation = Some(escalation);
        self
    }

    pub fn store(mut self, store: Arc<dyn ThresholdStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> anyhow::Result<FormEngine> {
        let session = self.session.context("a browser session is required")?;
        let oracle = self.oracle.context("an answer oracle is required")?;
        let escalation = self.escalation.context("an escalation bridge is required")?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryThresholdStore::new(LearnerConfig::default())));

        let dispatcher =
            HandlerDispatcher::with_builtin_handlers(store.clone()).with_policy(self.policy);
        let resolver = Arc::new(StrategyChainResolver::with_book(
            session.clone(),
            Arc::new(LearnedPatternBook::new()),
        ));

        Ok(FormEngine {
            session,
            dispatcher,
            resolver,
            store,
            oracle,
            escalation,
        })
    }
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine").finish_non_exhaustive()
    }
}

impl FormEngine {
    pub fn builder() -> FormEngineBuilder {
        FormEngineBuilder::default()
    }

    /// Process one rendered page to a terminal result.
    pub async fn process_page(&self, page_text: &str) -> Result<PageResult> {
        match self.dispatcher.select_handler(page_text).await {
            Selection::NoneQualified {
                best_handler,
                best_confidence,
            } => {
                warn!(
                    best_handler = %best_handler,
                    best_confidence,
                    "no handler qualified, escalating page"
                );
                // Every hand-off to a human counts as a failed attempt,
                // attributed to the closest-scoring handler.
                self.record_failure(&best_handler, best_confidence, "no handler qualified")?;
                self.escalate(
                    None,
                    EscalationReason::NoHandlerQualified { best_confidence },
                    page_text,
                )
                .await
            }
            Selection::Selected(selected) => self.automate(selected, page_text).await,
        }
    }

    /// Current learning records for every registered handler.
    pub fn thresholds(&self) -> Vec<HandlerThreshold> {
        self.dispatcher
            .handler_names()
            .iter()
            .map(|name| self.store.handler_record(name))
            .collect()
    }

    pub fn store(&self) -> &Arc<dyn ThresholdStore> {
        &self.store
    }

    async fn automate(&self, selected: SelectedHandler, page_text: &str) -> Result<PageResult> {
        let handler = selected.handler.clone();
        let name = handler.name().to_string();

        let Some(answers) = self.oracle.answers(&name, page_text).await else {
            self.record_failure(&name, selected.confidence, "no answer available")?;
            return self
                .escalate(Some(name), EscalationReason::AnswerUnavailable, page_text)
                .await;
        };

        let mut applied = 0usize;
        for answer in &answers {
            let mut criteria = handler.criteria(&answer.value, page_text);
            if let Some(kind) = answer.control_kind {
                criteria.control_kind = kind;
            }

            let detection = self.resolver.resolve(&criteria).await;
            let control = match detection.control {
                Some(control) if detection.success => control,
                _ => {
                    self.record_failure(
                        &name,
                        selected.confidence,
                        format!("element not found for {}", answer.value),
                    )?;
                    return self
                        .escalate(
                            Some(name),
                            EscalationReason::ElementNotFound {
                                target_value: answer.value.clone(),
                            },
                            page_text,
                        )
                        .await;
                }
            };

            if let Err(error) = handler
                .apply(self.session.as_ref(), &control, &answer.value)
                .await
            {
                warn!(%error, value = %answer.value, "answer application failed");
                self.record_failure(&name, selected.confidence, error.to_string())?;
                return self
                    .escalate(
                        Some(name),
                        EscalationReason::ApplyFailed {
                            detail: error.to_string(),
                        },
                        page_text,
                    )
                    .await;
            }
            applied += 1;
        }

        self.store.record_outcome(&AutomationOutcome::success(
            name.as_str(),
            name.as_str(),
            selected.confidence,
        ))?;
        info!(
            handler = %name,
            applied,
            confidence = selected.confidence,
            "page automated"
        );
        Ok(PageResult::Automated {
            handler: name,
            confidence: selected.confidence,
            applied,
        })
    }

    async fn escalate(
        &self,
        category: Option<String>,
        reason: EscalationReason,
        page_text: &str,
    ) -> Result<PageResult> {
        let request = EscalationRequest::new(category, reason, page_text);
        let outcome = self.escalation.escalate(request).await?;
        info!(status = ?outcome.status, "escalation resolved");
        Ok(PageResult::Escalated(outcome.status))
    }

    fn record_failure(
        &self,
        handler: &str,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Result<()> {
        self.store.record_outcome(&AutomationOutcome::failure(
            handler, handler, confidence, reason,
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ProfileOracle;
    use browser_bridge::FixturePage;
    use escalation_bridge::ScriptedBridge;

    #[test]
    fn test_builder_requires_collaborators() {
        let err = FormEngine::builder().build().unwrap_err();
        assert!(err.to_string().contains("browser session"));

        let err = FormEngine::builder()
            .session(Arc::new(FixturePage::empty()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("answer oracle"));
    }

    #[test]
    fn test_thresholds_cover_all_builtin_handlers() {
        let engine = FormEngine::builder()
            .session(Arc::new(FixturePage::empty()))
            .oracle(Arc::new(ProfileOracle::new()))
            .escalation(Arc::new(ScriptedBridge::always(EscalationStatus::Skipped)))
            .build()
            .unwrap();
        let thresholds = engine.thresholds();
        assert_eq!(thresholds.len(), 8);
        assert!(thresholds.iter().any(|t| t.handler_name == "demographics"));
        assert!(thresholds.iter().all(|t| t.total_attempts == 0));
    }
}
