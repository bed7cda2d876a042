//! End-to-end page scenarios through the full engine stack.

use std::sync::Arc;

use formpilot::browser_bridge::{AppliedAction, ControlSpec, FixturePage};
use formpilot::escalation_bridge::{EscalationReason, ScriptedBridge};
use formpilot::formpilot_core_types::{ControlKind, ControlRef, EscalationStatus};
use formpilot::threshold_store::{JsonThresholdStore, LearnerConfig, ThresholdStore};
use formpilot::{FormEngine, PageResult, PlannedAnswer, ProfileOracle};

fn engine(
    page: Arc<FixturePage>,
    oracle: ProfileOracle,
    bridge: Arc<ScriptedBridge>,
) -> FormEngine {
    FormEngine::builder()
        .session(page)
        .oracle(Arc::new(oracle))
        .escalation(bridge)
        .build()
        .unwrap()
}

fn age_page() -> Arc<FixturePage> {
    Arc::new(
        FixturePage::builder()
            .control(ControlSpec::text_input("age-entry"))
            .build(),
    )
}

const AGE_PAGE_TEXT: &str = "What is your age? Please enter your age.";

fn age_oracle() -> ProfileOracle {
    ProfileOracle::new().with_answer(
        "demographics",
        PlannedAnswer::new("45").with_kind(ControlKind::Text),
    )
}

#[tokio::test]
async fn test_age_question_is_automated_end_to_end() {
    let page = age_page();
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page.clone(), age_oracle(), bridge.clone());

    let result = engine.process_page(AGE_PAGE_TEXT).await.unwrap();
    match result {
        PageResult::Automated {
            handler,
            confidence,
            applied,
        } => {
            assert_eq!(handler, "demographics");
            assert!(confidence >= 0.89);
            assert_eq!(applied, 1);
        }
        PageResult::Escalated(status) => panic!("unexpected escalation: {:?}", status),
    }

    assert_eq!(
        page.applied(),
        vec![AppliedAction::Filled(
            ControlRef::new("age-entry"),
            "45".to_string()
        )]
    );
    assert!(bridge.received().is_empty());

    // One recorded success moves the demographics threshold down.
    let record = engine.store().handler_record("demographics");
    assert_eq!(record.total_attempts, 1);
    assert_eq!(record.successful_attempts, 1);
    assert!(record.threshold < 0.55);
}

#[tokio::test]
async fn test_brand_matrix_wins_by_priority_and_clicks_option() {
    let page = Arc::new(
        FixturePage::builder()
            .control(ControlSpec::radio("b-very").value("Very familiar"))
            .control(ControlSpec::radio("b-somewhat").value("Somewhat familiar"))
            .control(ControlSpec::radio("b-never").value("Never heard of"))
            .build(),
    );
    let oracle = ProfileOracle::new().with_value("brand_familiarity", "Somewhat familiar");
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page.clone(), oracle, bridge);

    let result = engine
        .process_page(
            "How familiar are you with these brands? \
             Options: Very familiar, Somewhat familiar, Never heard of.",
        )
        .await
        .unwrap();

    match result {
        PageResult::Automated { handler, .. } => assert_eq!(handler, "brand_familiarity"),
        PageResult::Escalated(status) => panic!("unexpected escalation: {:?}", status),
    }
    assert_eq!(
        page.applied(),
        vec![AppliedAction::Clicked(ControlRef::new("b-somewhat"))]
    );
}

#[tokio::test]
async fn test_ambiguous_page_escalates_without_guessing() {
    let page = Arc::new(FixturePage::empty());
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page.clone(), ProfileOracle::new(), bridge.clone());

    let result = engine
        .process_page("Which of these companies do you trust? Rate 1-10.")
        .await
        .unwrap();
    assert_eq!(result, PageResult::Escalated(EscalationStatus::Skipped));

    let requests = bridge.received();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].question_category.is_none());
    match &requests[0].reason {
        EscalationReason::NoHandlerQualified { best_confidence } => {
            assert!(*best_confidence > 0.0);
            assert!(*best_confidence < 0.5);
        }
        other => panic!("unexpected reason: {:?}", other),
    }

    // The hand-off is recorded as a failed attempt against the
    // closest-scoring handler, whatever the human then did.
    let log = engine.store().outcome_log();
    assert_eq!(log.len(), 1);
    assert!(!log[0].success);
    assert_eq!(log[0].handler_name, "trust_rating");
    // A failure never lowers a threshold.
    assert!(engine.store().current_threshold("trust_rating") >= 0.95);
    assert!(page.applied().is_empty());
}

#[tokio::test]
async fn test_repeated_successes_walk_threshold_to_band_floor() {
    let page = age_page();
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page, age_oracle(), bridge);

    let mut last = engine.store().current_threshold("demographics");
    assert_eq!(last, 0.55);
    for _ in 0..10 {
        let result = engine.process_page(AGE_PAGE_TEXT).await.unwrap();
        assert!(matches!(result, PageResult::Automated { .. }));

        let threshold = engine.store().current_threshold("demographics");
        assert!(threshold <= last);
        last = threshold;
    }
    // Band floor for demographics.
    assert!((last - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn test_gender_answer_lands_via_synonym_bridge() {
    // No control is labeled "Male"; the semantic strategy must pick the
    // Man radio.
    let page = Arc::new(
        FixturePage::builder()
            .control(ControlSpec::radio("r-man").value("Man").text("Man"))
            .control(ControlSpec::radio("r-woman").value("Woman").text("Woman"))
            .build(),
    );
    let oracle = ProfileOracle::new().with_value("demographics", "Male");
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page.clone(), oracle, bridge.clone());

    let result = engine
        .process_page(
            "Demographic details: What is your age group and gender? \
             Please select your gender. Man or Woman.",
        )
        .await
        .unwrap();

    match result {
        PageResult::Automated { handler, .. } => assert_eq!(handler, "demographics"),
        PageResult::Escalated(status) => panic!("unexpected escalation: {:?}", status),
    }
    assert_eq!(
        page.applied(),
        vec![AppliedAction::Clicked(ControlRef::new("r-man"))]
    );
    assert!(bridge.received().is_empty());
}

#[tokio::test]
async fn test_missing_answer_escalates_and_records_failure() {
    let page = Arc::new(FixturePage::empty());
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Completed));
    // Oracle knows nothing about research questions.
    let engine = engine(page, ProfileOracle::new(), bridge.clone());

    let result = engine
        .process_page("Which company is the official sponsor of this venue?")
        .await
        .unwrap();
    assert_eq!(result, PageResult::Escalated(EscalationStatus::Completed));

    let requests = bridge.received();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].question_category.as_deref(),
        Some("research_required")
    );
    assert_eq!(requests[0].reason, EscalationReason::AnswerUnavailable);

    let record = engine.store().handler_record("research_required");
    assert_eq!(record.total_attempts, 1);
    assert_eq!(record.successful_attempts, 0);
    // A failure never lowers the threshold.
    assert!(record.threshold >= 0.95);
}

#[tokio::test]
async fn test_unresolvable_element_escalates_with_target() {
    // Demographics qualifies but the page has no gender controls.
    let page = Arc::new(FixturePage::empty());
    let oracle = ProfileOracle::new().with_value("demographics", "Male");
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::Skipped));
    let engine = engine(page, oracle, bridge.clone());

    let result = engine.process_page(AGE_PAGE_TEXT).await.unwrap();
    assert_eq!(result, PageResult::Escalated(EscalationStatus::Skipped));

    let requests = bridge.received();
    assert_eq!(requests.len(), 1);
    match &requests[0].reason {
        EscalationReason::ElementNotFound { target_value } => {
            assert_eq!(target_value, "Male")
        }
        other => panic!("unexpected reason: {:?}", other),
    }
}

#[tokio::test]
async fn test_abort_status_propagates_to_caller() {
    let page = Arc::new(FixturePage::empty());
    let bridge = Arc::new(ScriptedBridge::always(EscalationStatus::AbortTask));
    let engine = engine(page, ProfileOracle::new(), bridge);

    let result = engine
        .process_page("Which of these companies do you trust? Rate 1-10.")
        .await
        .unwrap();
    assert_eq!(result, PageResult::Escalated(EscalationStatus::AbortTask));
}

#[tokio::test]
async fn test_learned_thresholds_survive_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thresholds.json");

    {
        let store = Arc::new(
            JsonThresholdStore::open(&path, LearnerConfig::default()).unwrap(),
        );
        let engine = FormEngine::builder()
            .session(age_page())
            .oracle(Arc::new(age_oracle()))
            .escalation(Arc::new(ScriptedBridge::always(EscalationStatus::Skipped)))
            .store(store)
            .build()
            .unwrap();
        for _ in 0..3 {
            engine.process_page(AGE_PAGE_TEXT).await.unwrap();
        }
        assert!(engine.store().current_threshold("demographics") < 0.55);
    }

    let reopened = JsonThresholdStore::open(&path, LearnerConfig::default()).unwrap();
    let record = reopened.handler_record("demographics");
    assert_eq!(record.total_attempts, 3);
    assert_eq!(record.successful_attempts, 3);
    assert!(record.threshold < 0.55);
}
