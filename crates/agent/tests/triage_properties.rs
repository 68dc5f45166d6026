//! End-to-end properties of the deterministic triage components

use std::sync::Arc;

use triage_agent::{process_step, start_node, ArbiterInput, TriageArbiter};
use triage_config::{builtin_flow, ArbiterConfig, KeywordTable};
use triage_core::{
    ArbiterSignal, ArbiterState, AssessmentQuestion, BodySystem, ClinicalProfile, FlowError,
    SymptomCategory,
};
use triage_text_processing::{ClinicalSlotParser, DetectionOptions, EmergencyDetector};

fn table() -> Arc<KeywordTable> {
    Arc::new(KeywordTable::builtin().unwrap())
}

fn detector() -> EmergencyDetector {
    EmergencyDetector::new(table())
}

fn arbiter() -> TriageArbiter {
    TriageArbiter::new(ArbiterConfig::default(), &table())
}

#[test]
fn test_absolute_keyword_survives_deescalation() {
    let detector = detector();
    let texts = [
        "I think he had a stroke",
        "runny nose and sneezing, and now a stroke i think",
        "for months, on and off, but today she is unconscious",
    ];
    for text in texts {
        let result = detector.evaluate(text, &DetectionOptions::default());
        assert!(result.is_emergency, "{}", text);
        assert_eq!(result.score, 10, "{}", text);
    }
}

#[test]
fn test_negation_removes_keyword_from_scoring() {
    let detector = detector();
    let negated = detector.evaluate("I have no chest pain", &DetectionOptions::default());
    assert!(!negated.is_emergency);
    assert_eq!(negated.score, 0);
    assert!(negated.matched_keywords.is_empty());

    let affirmed = detector.evaluate("I have chest pain", &DetectionOptions::default());
    assert!(affirmed.matched_keywords.contains(&"chest pain".to_string()));
    assert!(affirmed.score >= 8);
}

#[test]
fn test_score_always_clamped() {
    let detector = detector();
    let texts = [
        "",
        "sudden severe worst crushing chest pain with difficulty breathing and seizure after I hit my head",
        "runny nose, sneezing, sore throat, mild cough",
        "chronic wheezing for years",
        "no chest pain, no fainting, no trouble breathing",
    ];
    for text in texts {
        let result = detector.evaluate(text, &DetectionOptions::default());
        assert!(result.score <= 10, "{}", text);
    }
}

#[test]
fn test_combination_raises_score() {
    let detector = detector();
    let result = detector.evaluate("I have a fever and a stiff neck", &DetectionOptions::default());
    assert!(result.score >= 9);
    assert!(result.is_emergency);
}

#[test]
fn test_hard_cap_terminates_any_profile() {
    let arbiter = arbiter();
    let profiles = [
        ClinicalProfile::new(),
        ClinicalProfile {
            ambiguity_detected: true,
            red_flags_resolved: Some(false),
            ..Default::default()
        },
    ];
    let remaining = vec![AssessmentQuestion::new("rf", "Fainting?").red_flag()];
    for profile in &profiles {
        for turn in [12, 13, 40] {
            let input = ArbiterInput {
                history: &[],
                profile,
                current_turn: turn,
                total_planned: 50,
                remaining_questions: &remaining,
                previous_profile: None,
                clarification_attempts: 0,
            };
            let decision = arbiter.evaluate(&input, ArbiterState::new());
            assert_eq!(decision.result.signal, ArbiterSignal::Terminate);
        }
    }
}

#[test]
fn test_unresolved_red_flags_never_terminate() {
    let arbiter = arbiter();
    let profile = ClinicalProfile {
        age: Some("40".into()),
        duration: Some("2 days".into()),
        severity: Some("3/10".into()),
        progression: Some("better".into()),
        red_flag_denials: Some("none".into()),
        red_flags_resolved: Some(false),
        symptom_category: Some(SymptomCategory::Simple),
        triage_readiness_score: Some(1.0),
        ..Default::default()
    };
    let remaining = vec![AssessmentQuestion::new("rf1", "Any fainting?").red_flag()];
    for turn in 0..12 {
        let input = ArbiterInput {
            history: &[],
            profile: &profile,
            current_turn: turn,
            total_planned: 3,
            remaining_questions: &remaining,
            previous_profile: Some(&profile),
            clarification_attempts: 0,
        };
        let decision = arbiter.evaluate(&input, ArbiterState { stable_turn_count: 5 });
        assert_eq!(decision.result.signal, ArbiterSignal::PrioritizeRedFlags, "turn {}", turn);
    }
}

#[test]
fn test_no_termination_below_floor_without_saturation() {
    let arbiter = arbiter();
    let profile = ClinicalProfile {
        age: Some("40".into()),
        duration: Some("2 days".into()),
        severity: Some("3/10".into()),
        progression: Some("better".into()),
        red_flag_denials: Some("no fainting".into()),
        red_flags_resolved: Some(true),
        symptom_category: Some(SymptomCategory::Complex),
        triage_readiness_score: Some(0.99),
        ..Default::default()
    };
    for turn in 0..7 {
        let input = ArbiterInput {
            history: &[],
            profile: &profile,
            current_turn: turn,
            total_planned: 0,
            remaining_questions: &[],
            previous_profile: Some(&profile),
            clarification_attempts: 0,
        };
        let decision = arbiter.evaluate(&input, ArbiterState { stable_turn_count: 9 });
        assert_ne!(decision.result.signal, ArbiterSignal::Terminate, "turn {}", turn);
    }
}

#[test]
fn test_slot_parser_merge_law() {
    let mut parser = ClinicalSlotParser::new();
    let before = parser.slots().clone();
    parser.parse_turn("");
    assert_eq!(parser.slots(), &before);

    parser.parse_turn("I am 45 years old");
    parser.parse_turn("the pain is 6/10 since 2 days");
    assert_eq!(parser.slots().age, Some(45));
    assert_eq!(parser.slots().severity.as_deref(), Some("6/10"));
}

#[test]
fn test_offline_step_contract() {
    let flow = builtin_flow().unwrap();
    let start = start_node(&flow).unwrap();
    let yes_target = start
        .node
        .options()
        .iter()
        .find(|o| o.label.eq_ignore_ascii_case("yes"))
        .map(|o| o.next.clone())
        .unwrap();

    let step = process_step(&flow, start.id, "Yes").unwrap();
    assert_eq!(step.id, yes_target);

    assert!(matches!(
        process_step(&flow, start.id, "purple"),
        Err(FlowError::InvalidAnswer { .. })
    ));

    assert!(step.is_outcome);
    assert_eq!(
        process_step(&flow, step.id, "Yes").unwrap_err(),
        FlowError::OutcomeReached(step.id.to_string())
    );
}

#[test]
fn test_chest_pain_and_breathing_is_maximal() {
    let result = detector().evaluate(
        "I have severe chest pain and difficulty breathing",
        &DetectionOptions::default(),
    );
    assert!(result.is_emergency);
    assert!(result.has_system(BodySystem::Cardiac));
    assert!(result.has_system(BodySystem::Respiratory));
    assert_eq!(result.score, 10);
}

#[test]
fn test_authority_override_caps_non_absolute_match() {
    let profile = ClinicalProfile {
        red_flags_resolved: Some(true),
        red_flag_denials: Some("no chest pain".into()),
        ..Default::default()
    };
    let result = detector().evaluate(
        "chest pain",
        &DetectionOptions::default().with_profile(&profile),
    );
    assert!(!result.is_emergency);
    assert_eq!(result.score, 7);
    assert!(result.debug.authority_override);
}
