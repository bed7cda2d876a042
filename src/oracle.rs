//! The answer source the engine consults after selecting a handler.

use std::collections::HashMap;

use async_trait::async_trait;
use formpilot_core_types::ControlKind;
use serde::{Deserialize, Serialize};

/// One value the engine should express on the page.
///
/// The control kind is optional; when absent the selected handler's
/// default kind applies. A category can span kinds (age as a text
/// entry, gender as radios), so the answer may pin it down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAnswer {
    pub value: String,
    pub control_kind: Option<ControlKind>,
}

impl PlannedAnswer {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            control_kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ControlKind) -> Self {
        self.control_kind = Some(kind);
        self
    }
}

/// Supplies answer values for a classified question.
///
/// `None` means the source has nothing for this question; the engine
/// escalates rather than invent an answer.
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    async fn answers(&self, category: &str, page_text: &str) -> Option<Vec<PlannedAnswer>>;
}

/// Static persona profile: a category → answers map built up front.
#[derive(Debug, Clone, Default)]
pub struct ProfileOracle {
    answers: HashMap<String, Vec<PlannedAnswer>>,
}

impl ProfileOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, category: impl Into<String>, answer: PlannedAnswer) -> Self {
        self.answers.entry(category.into()).or_default().push(answer);
        self
    }

    pub fn with_value(self, category: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_answer(category, PlannedAnswer::new(value))
    }
}

#[async_trait]
impl AnswerOracle for ProfileOracle {
    async fn answers(&self, category: &str, _page_text: &str) -> Option<Vec<PlannedAnswer>> {
        self.answers.get(category).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_profile_returns_answers_per_category() {
        let oracle = ProfileOracle::new()
            .with_value("demographics", "Male")
            .with_answer(
                "demographics",
                PlannedAnswer::new("45").with_kind(ControlKind::Text),
            );

        let answers = oracle.answers("demographics", "").await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].value, "Male");
        assert_eq!(answers[1].control_kind, Some(ControlKind::Text));

        assert!(oracle.answers("trust_rating", "").await.is_none());
    }
}
