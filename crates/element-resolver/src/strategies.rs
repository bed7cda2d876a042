//! The nine resolution strategies, in falling order of trust.
//!
//! Every strategy answers the same question: given search criteria, is
//! there a usable control on the page that represents the target value?
//! Each validates its own candidates (visible, enabled, expected kind)
//! so a hit is always actionable. Confidence bands are fixed per
//! strategy; the resolver decides acceptance against the caller's floor.

use std::sync::Arc;

use async_trait::async_trait;
use browser_bridge::{BrowserSession, ContainerIdiom, Query, Result};
use formpilot_core_types::{ControlKind, ControlRef, DetectionResult, SearchCriteria};
use serde_json::json;

use crate::learned::LearnedPatternBook;
use crate::similarity::text_similarity;
use crate::synonyms::SynonymTable;

/// One way of locating a control for the target value.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempt a detection. `Ok` with `success: false` means the page
    /// simply has no match for this strategy; `Err` means the session
    /// itself failed (the resolver treats timeouts as non-matches).
    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult>;
}

/// Candidate passes only when visible, enabled and of the expected kind.
async fn usable(
    session: &dyn BrowserSession,
    control: &ControlRef,
    kind: ControlKind,
) -> Result<bool> {
    if session.control_kind(control).await? != Some(kind) {
        return Ok(false);
    }
    Ok(session.is_visible(control).await? && session.is_enabled(control).await?)
}

/// Text a candidate presents to the user: visible text first, raw value
/// attribute when the node renders none.
async fn display_text(session: &dyn BrowserSession, control: &ControlRef) -> Result<String> {
    let text = session.text(control).await?;
    if text.trim().is_empty() {
        session.value(control).await
    } else {
        Ok(text)
    }
}

/// Best similarity between a snippet and any of the criteria's
/// spellings (target plus caller-supplied alternatives).
fn candidate_similarity(criteria: &SearchCriteria, text: &str) -> f64 {
    let mut best = text_similarity(&criteria.target_value, text);
    for alternative in &criteria.alternatives {
        best = best.max(text_similarity(alternative, text));
    }
    best
}

fn replay(query: &Query) -> serde_json::Value {
    serde_json::to_value(query).unwrap_or(serde_json::Value::Null)
}

/// Strategy 1: the control's value attribute equals the answer verbatim
/// (case variants included).
pub struct ExactValueStrategy;

#[async_trait]
impl Strategy for ExactValueStrategy {
    fn name(&self) -> &'static str {
        "exact-value"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        let target = criteria.target_value.trim();
        if target.is_empty() {
            return Ok(DetectionResult::miss(self.name()));
        }

        let mut variants = vec![target.to_string()];
        for cased in [target.to_lowercase(), target.to_uppercase()] {
            if !variants.contains(&cased) {
                variants.push(cased);
            }
        }

        for variant in variants {
            let query = Query::KindWithValue {
                kind: criteria.control_kind,
                value: variant.clone(),
            };
            for control in session.query_all(&query).await? {
                if !usable(session, &control, criteria.control_kind).await? {
                    continue;
                }
                // Full confidence only when the rendered text agrees
                // with the value attribute.
                let text = session.text(&control).await?;
                let confidence = if text.trim().is_empty()
                    || text.to_lowercase().contains(&target.to_lowercase())
                {
                    0.95
                } else {
                    0.8
                };
                return Ok(DetectionResult::hit(control, confidence, self.name())
                    .with_metadata("matched_value", json!(variant))
                    .with_metadata("replay_query", replay(&query)));
            }
        }

        // Free-text answers target an input, not a preset value; the
        // first empty usable input takes the entry.
        if criteria.control_kind == ControlKind::Text {
            let query = Query::Kind(ControlKind::Text);
            for control in session.query_all(&query).await? {
                if usable(session, &control, ControlKind::Text).await?
                    && session.value(&control).await?.trim().is_empty()
                {
                    return Ok(DetectionResult::hit(control, 0.8, self.name())
                        .with_metadata("replay_query", replay(&query)));
                }
            }
        }

        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 2: the option's text names the same answer in different
/// words ("Man" for "Male", "45 to 54" for "45-54").
pub struct SemanticStrategy {
    synonyms: Arc<SynonymTable>,
}

impl SemanticStrategy {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self { synonyms }
    }
}

#[async_trait]
impl Strategy for SemanticStrategy {
    fn name(&self) -> &'static str {
        "semantic-equivalence"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        // Only option-style controls carry answer text worth comparing.
        if !matches!(
            criteria.control_kind,
            ControlKind::Radio | ControlKind::Dropdown
        ) {
            return Ok(DetectionResult::miss(self.name()));
        }
        let target = criteria.target_value.trim();
        if target.is_empty() {
            return Ok(DetectionResult::miss(self.name()));
        }

        for control in session.query_all(&Query::Kind(criteria.control_kind)).await? {
            if !usable(session, &control, criteria.control_kind).await? {
                continue;
            }
            let text = display_text(session, &control).await?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            let equivalent = self.synonyms.same_group(target, trimmed)
                || criteria
                    .alternatives
                    .iter()
                    .any(|alt| alt.trim().eq_ignore_ascii_case(trimmed));
            if equivalent {
                let confidence = if trimmed.eq_ignore_ascii_case(target) {
                    0.9
                } else {
                    0.85
                };
                return Ok(DetectionResult::hit(control, confidence, self.name())
                    .with_metadata("matched_text", json!(trimmed)));
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 3: a label similar to the answer points at the control,
/// through a `for` reference or by wrapping it.
pub struct LabelAssociationStrategy;

#[async_trait]
impl Strategy for LabelAssociationStrategy {
    fn name(&self) -> &'static str {
        "label-association"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        for label in session.query_all(&Query::Labels).await? {
            let label_text = session.text(&label).await?;
            if candidate_similarity(criteria, &label_text) <= 0.7 {
                continue;
            }
            let targets = session
                .query_all(&Query::LabelTarget {
                    label: label.clone(),
                })
                .await?;
            for (index, control) in targets.into_iter().enumerate() {
                if !usable(session, &control, criteria.control_kind).await? {
                    continue;
                }
                // Explicit `for` association outranks structural nesting.
                let confidence = if index == 0 { 0.9 } else { 0.85 };
                return Ok(DetectionResult::hit(control, confidence, self.name())
                    .with_metadata("label_text", json!(label_text.trim())));
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 4: the control's own text, or its container's, resembles
/// the answer. Container evidence is discounted.
pub struct TextContentStrategy;

#[async_trait]
impl Strategy for TextContentStrategy {
    fn name(&self) -> &'static str {
        "text-content"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        let mut best: Option<(ControlRef, f64, String)> = None;

        for control in session.query_all(&Query::Kind(criteria.control_kind)).await? {
            if !usable(session, &control, criteria.control_kind).await? {
                continue;
            }
            let text = display_text(session, &control).await?;
            let direct = candidate_similarity(criteria, &text);
            let container = session.container_text(&control).await?;
            let contextual = candidate_similarity(criteria, &container) * 0.8;
            let score = direct.max(contextual);

            if best.as_ref().map(|(_, s, _)| score > *s).unwrap_or(true) {
                best = Some((control, score, text));
            }
        }

        match best {
            Some((control, score, text)) if score >= 0.6 => {
                Ok(DetectionResult::hit(control, score, self.name())
                    .with_metadata("matched_text", json!(text.trim())))
            }
            _ => Ok(DetectionResult::miss(self.name())),
        }
    }
}

/// Strategy 5: a text node mentioning the answer anchors the search;
/// controls in its structural neighborhood are candidates.
pub struct NearbyTextStrategy;

#[async_trait]
impl Strategy for NearbyTextStrategy {
    fn name(&self) -> &'static str {
        "nearby-text"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        let mut needles = vec![criteria.target_value.clone()];
        needles.extend(criteria.alternatives.iter().cloned());

        for needle in needles {
            let trimmed = needle.trim();
            if trimmed.is_empty() {
                continue;
            }
            let anchors = session
                .query_all(&Query::TextNodes {
                    containing: trimmed.to_string(),
                })
                .await?;
            for anchor in anchors {
                let nearby = session
                    .query_all(&Query::Neighborhood { of: anchor.clone() })
                    .await?;
                for control in nearby {
                    if !usable(session, &control, criteria.control_kind).await? {
                        continue;
                    }
                    // Sharing a container with the anchor text is
                    // stronger evidence than mere adjacency.
                    let container = session.container_text(&control).await?;
                    let confidence = if container.to_lowercase().contains(&trimmed.to_lowercase())
                    {
                        0.9
                    } else {
                        0.8
                    };
                    return Ok(DetectionResult::hit(control, confidence, self.name())
                        .with_metadata("anchor_text", json!(trimmed)));
                }
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 6: recurring layout idioms (label+input pairs, fieldsets,
/// list items, table cells) whose container text matches the answer.
pub struct CommonStructureStrategy;

#[async_trait]
impl Strategy for CommonStructureStrategy {
    fn name(&self) -> &'static str {
        "common-structure"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        for idiom in ContainerIdiom::all() {
            for container in session.query_all(&Query::Containers(idiom)).await? {
                let container_text = session.text(&container).await?;
                if candidate_similarity(criteria, &container_text) < 0.6 {
                    continue;
                }
                let controls = session
                    .query_all(&Query::ContainerControls {
                        container: container.clone(),
                    })
                    .await?;
                for control in controls {
                    if usable(session, &control, criteria.control_kind).await? {
                        return Ok(DetectionResult::hit(control, 0.8, self.name())
                            .with_metadata("pattern", json!(idiom.name())));
                    }
                }
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 7: the control's accessibility label mentions the answer.
pub struct AccessibilityStrategy;

#[async_trait]
impl Strategy for AccessibilityStrategy {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        let mut needles = vec![criteria.target_value.clone()];
        needles.extend(criteria.alternatives.iter().cloned());

        for needle in needles {
            let trimmed = needle.trim();
            if trimmed.is_empty() {
                continue;
            }
            let query = Query::AccessibilityLabel {
                containing: trimmed.to_string(),
            };
            for control in session.query_all(&query).await? {
                if usable(session, &control, criteria.control_kind).await? {
                    return Ok(DetectionResult::hit(control, 0.85, self.name())
                        .with_metadata("matched_label", json!(trimmed))
                        .with_metadata("replay_query", replay(&query)));
                }
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 8: last heuristic before learned replay. Any rendered
/// control of the right kind whose text is at least half-similar to
/// the answer, accepted at reduced confidence.
pub struct VisualStrategy;

#[async_trait]
impl Strategy for VisualStrategy {
    fn name(&self) -> &'static str {
        "visual"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        for control in session.query_all(&Query::Kind(criteria.control_kind)).await? {
            if !usable(session, &control, criteria.control_kind).await? {
                continue;
            }
            let rendered = match session.bounding_box(&control).await? {
                Some(bbox) => bbox.has_area(),
                None => false,
            };
            if !rendered {
                continue;
            }
            let text = display_text(session, &control).await?;
            let container = session.container_text(&control).await?;
            let similarity =
                candidate_similarity(criteria, &text).max(candidate_similarity(criteria, &container));
            if similarity >= 0.5 {
                return Ok(DetectionResult::hit(control, 0.7, self.name())
                    .with_metadata("similarity", json!(similarity)));
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}

/// Strategy 9: replay queries that located a control for this question
/// category before.
pub struct LearnedPatternStrategy {
    book: Arc<LearnedPatternBook>,
}

impl LearnedPatternStrategy {
    pub fn new(book: Arc<LearnedPatternBook>) -> Self {
        Self { book }
    }
}

#[async_trait]
impl Strategy for LearnedPatternStrategy {
    fn name(&self) -> &'static str {
        "learned-pattern"
    }

    async fn detect(
        &self,
        session: &dyn BrowserSession,
        criteria: &SearchCriteria,
    ) -> Result<DetectionResult> {
        for pattern in self.book.for_category(&criteria.question_category) {
            for control in session.query_all(&pattern.query).await? {
                if !usable(session, &control, criteria.control_kind).await? {
                    continue;
                }
                let text = display_text(session, &control).await?;
                let container = session.container_text(&control).await?;
                let similarity = candidate_similarity(criteria, &text)
                    .max(candidate_similarity(criteria, &container));
                if similarity >= 0.5 {
                    return Ok(DetectionResult::hit(
                        control,
                        pattern.confidence.max(0.5),
                        self.name(),
                    )
                    .with_metadata("pattern_hits", json!(pattern.hits)));
                }
            }
        }
        Ok(DetectionResult::miss(self.name()))
    }
}
