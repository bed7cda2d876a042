//! Six-step handler arbitration.

use std::sync::Arc;

use formpilot_core_types::Classification;
use threshold_store::ThresholdStore;
use tracing::{debug, info, warn};

use crate::errors::{DispatchError, Result};
use crate::handler::{builtin_handlers, Handler};
use crate::policy::DispatchPolicy;

/// The handler the dispatcher settled on, with the evidence behind it.
pub struct SelectedHandler {
    pub handler: Arc<dyn Handler>,
    /// Confidence the selection was made on: context-adjusted normally,
    /// unadjusted for a fallback substitution
    pub confidence: f64,
    /// The handler's dynamic threshold at selection time
    pub threshold: f64,
    /// True when this handler was substituted for the fallback despite
    /// not clearing its own threshold
    pub via_fallback_substitution: bool,
    pub classification: Classification,
}

/// Result of arbitration over one page.
pub enum Selection {
    Selected(SelectedHandler),
    /// No handler qualified; carries the best-scoring handler and its
    /// confidence so the caller can attribute and report the miss when
    /// escalating
    NoneQualified {
        best_handler: String,
        best_confidence: f64,
    },
}

struct Scored {
    handler: Arc<dyn Handler>,
    classification: Classification,
    adjusted: f64,
    threshold: f64,
    qualifies: bool,
}

/// Arbitrates between registered handlers per page.
///
/// Selection is a pure read against the threshold store; recording
/// outcomes is the engine's responsibility after the attempt.
pub struct HandlerDispatcher {
    handlers: Vec<Arc<dyn Handler>>,
    store: Arc<dyn ThresholdStore>,
    policy: DispatchPolicy,
}

impl HandlerDispatcher {
    /// Empty dispatcher with the default policy.
    pub fn new(store: Arc<dyn ThresholdStore>) -> Self {
        Self {
            handlers: Vec::new(),
            store,
            policy: DispatchPolicy::default(),
        }
    }

    /// Dispatcher pre-loaded with the built-in handler set.
    pub fn with_builtin_handlers(store: Arc<dyn ThresholdStore>) -> Self {
        let mut dispatcher = Self::new(store);
        for handler in builtin_handlers() {
            // Built-in names are unique by construction.
            let _ = dispatcher.register(handler);
        }
        dispatcher
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register a handler. Registration order is the tie-break order.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<()> {
        if self.handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(DispatchError::DuplicateHandler(handler.name().to_string()));
        }
        self.handlers.push(handler);
        Ok(())
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name().to_string()).collect()
    }

    /// Select the handler for a page, or report that none qualifies.
    ///
    /// Steps: classify every handler, apply context adjustments, test
    /// each adjusted score against the handler's dynamic threshold
    /// (the priority category short-circuits as soon as it qualifies),
    /// take the qualifying maximum, substitute a near-miss specific
    /// handler when only the fallback qualified, and otherwise report
    /// the best observed confidence for escalation.
    pub async fn select_handler(&self, page_text: &str) -> Selection {
        let mut scored: Vec<Scored> = Vec::with_capacity(self.handlers.len());

        for handler in &self.handlers {
            let rate = self.store.success_rate(handler.name());
            let classification = handler.classify(page_text, rate).await;
            let adjusted = self
                .policy
                .adjust(handler.name(), classification.confidence, page_text);
            let threshold = self.store.current_threshold(handler.name());
            let qualifies = adjusted + 1e-9 >= threshold;

            debug!(
                handler = handler.name(),
                confidence = classification.confidence,
                adjusted,
                threshold,
                qualifies,
                "scored handler"
            );

            if qualifies
                && self.policy.priority_category.as_deref() == Some(handler.name())
            {
                info!(
                    handler = handler.name(),
                    confidence = adjusted,
                    "priority category cleared threshold, short-circuiting"
                );
                return Selection::Selected(SelectedHandler {
                    handler: handler.clone(),
                    confidence: adjusted,
                    threshold,
                    via_fallback_substitution: false,
                    classification,
                });
            }

            scored.push(Scored {
                handler: handler.clone(),
                classification,
                adjusted,
                threshold,
                qualifies,
            });
        }

        let mut best: Option<usize> = None;
        for (index, entry) in scored.iter().enumerate() {
            if !entry.qualifies {
                continue;
            }
            match best {
                // Strict comparison keeps the first-registered handler
                // on ties.
                Some(current) if entry.adjusted <= scored[current].adjusted => {
                    if (entry.adjusted - scored[current].adjusted).abs() < 1e-9 {
                        warn!(
                            kept = scored[current].handler.name(),
                            dropped = entry.handler.name(),
                            confidence = entry.adjusted,
                            "ambiguous classification, keeping first-registered handler"
                        );
                    }
                }
                _ => best = Some(index),
            }
        }

        let Some(best_index) = best else {
            let closest = scored
                .iter()
                .max_by(|a, b| a.adjusted.total_cmp(&b.adjusted));
            let best_handler = closest
                .map(|s| s.handler.name().to_string())
                .unwrap_or_else(|| self.policy.fallback_handler.clone());
            let best_confidence = closest.map(|s| s.adjusted).unwrap_or(0.0);
            warn!(best_handler = %best_handler, best_confidence, "no handler qualified");
            return Selection::NoneQualified {
                best_handler,
                best_confidence,
            };
        };

        let winner = &scored[best_index];
        if winner.handler.is_fallback() {
            let only_fallback = scored
                .iter()
                .filter(|s| s.qualifies)
                .all(|s| s.handler.is_fallback());
            if only_fallback {
                if let Some(substitute) = self.fallback_substitute(&scored) {
                    return Selection::Selected(substitute);
                }
            }
        }

        info!(
            handler = winner.handler.name(),
            confidence = winner.adjusted,
            threshold = winner.threshold,
            "selected handler"
        );
        Selection::Selected(SelectedHandler {
            handler: winner.handler.clone(),
            confidence: winner.adjusted,
            threshold: winner.threshold,
            via_fallback_substitution: false,
            classification: winner.classification.clone(),
        })
    }

    /// A specific handler whose unadjusted confidence reaches the
    /// policy fraction of its own threshold outranks the fallback, even
    /// though it did not independently qualify.
    fn fallback_substitute(&self, scored: &[Scored]) -> Option<SelectedHandler> {
        let mut best: Option<&Scored> = None;
        for entry in scored {
            if entry.handler.is_fallback() {
                continue;
            }
            let near_miss = entry.classification.confidence + 1e-9
                >= entry.threshold * self.policy.fallback_factor;
            if !near_miss {
                continue;
            }
            if best
                .map(|b| entry.classification.confidence > b.classification.confidence)
                .unwrap_or(true)
            {
                best = Some(entry);
            }
        }
        best.map(|entry| {
            info!(
                handler = entry.handler.name(),
                confidence = entry.classification.confidence,
                threshold = entry.threshold,
                "substituting near-miss handler for the fallback"
            );
            SelectedHandler {
                handler: entry.handler.clone(),
                confidence: entry.classification.confidence,
                threshold: entry.threshold,
                via_fallback_substitution: true,
                classification: entry.classification.clone(),
            }
        })
    }
}
