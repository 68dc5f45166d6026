//! Triage Arbiter
//!
//! Deterministic turn policy deciding, after every answer, whether the
//! interview continues, reorders, asks for clarification, drills down or
//! terminates. Guards are evaluated in a fixed order and the first match
//! wins:
//!
//! | step | guard | signal |
//! |------|-------|--------|
//! | 0 | hard cap reached | TERMINATE |
//! | 0b | vulnerable group (pure profile transform) | - |
//! | 1 | low-confidence denial | REQUIRE_CLARIFICATION |
//! | 2 | red flags unresolved | PRIORITIZE_RED_FLAGS / CONTINUE |
//! | 3 | hard sanity finding | RESOLVE_AMBIGUITY / REQUIRE_CLARIFICATION / DRILL_DOWN |
//! | 3b | saturation | TERMINATE |
//! | 4 | below turn floor | CONTINUE |
//! | 5 | deferred soft sanity finding | CONTINUE |
//! | 6 | tier-3 questions pending on complex cases | CONTINUE |
//! | 7 | data completeness / readiness | CONTINUE / TERMINATE / REQUIRE_CLARIFICATION |
//! | 8 | plan exhausted or final turn | TERMINATE / CONTINUE |
//!
//! Saturation tracking is explicit per-session state: callers pass the
//! previous `ArbiterState` in and keep the returned one.

pub mod sanity;
pub mod stability;
pub mod vulnerability;

use regex::Regex;

use triage_config::{ArbiterConfig, KeywordTable};
use triage_core::{
    ArbiterResult, ArbiterSignal, ArbiterState, AssessmentQuestion, ClinicalProfile,
    DenialConfidence, SymptomCategory, Turn,
};

use sanity::SanityOutcome;
use vulnerability::VulnerabilityRules;

/// Readiness that counts as fully ready for saturation and false-positive checks
const FULL_READINESS: f64 = 1.0;

/// Explicit inputs for one arbiter evaluation
#[derive(Debug, Clone, Copy)]
pub struct ArbiterInput<'a> {
    pub history: &'a [Turn],
    pub profile: &'a ClinicalProfile,
    /// Answers given so far
    pub current_turn: u32,
    /// Questions in the plan, including expansions
    pub total_planned: u32,
    /// Questions not yet asked
    pub remaining_questions: &'a [AssessmentQuestion],
    /// Profile from the previous evaluation, for stability tracking
    pub previous_profile: Option<&'a ClinicalProfile>,
    pub clarification_attempts: u32,
}

/// Arbiter output: the signal, the next state and the transformed profile
#[derive(Debug, Clone, PartialEq)]
pub struct ArbiterDecision {
    pub result: ArbiterResult,
    pub state: ArbiterState,
    /// Input profile after vulnerable-group detection
    pub profile: ClinicalProfile,
}

/// Stateless arbiter configured with policy thresholds and vocabulary
#[derive(Debug, Clone)]
pub struct TriageArbiter {
    config: ArbiterConfig,
    vulnerability: VulnerabilityRules,
    fever_terms: Vec<Regex>,
}

impl TriageArbiter {
    pub fn new(config: ArbiterConfig, table: &KeywordTable) -> Self {
        let fever_terms = table
            .fever_terms
            .iter()
            .filter_map(|t| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(t))).ok())
            .collect();
        Self {
            config,
            vulnerability: VulnerabilityRules::new(&table.maternal_keywords),
            fever_terms,
        }
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Decide the next control signal
    pub fn evaluate(&self, input: &ArbiterInput<'_>, state: ArbiterState) -> ArbiterDecision {
        let decision = self.decide(input, state);
        tracing::info!(
            signal = %decision.result.signal,
            reason = %decision.result.reason,
            turn = input.current_turn,
            stable_turns = decision.state.stable_turn_count,
            "Arbiter decision"
        );
        decision
    }

    fn decide(&self, input: &ArbiterInput<'_>, state: ArbiterState) -> ArbiterDecision {
        let cfg = &self.config;

        if input.current_turn >= cfg.hard_cap_turns {
            return ArbiterDecision {
                result: ArbiterResult::new(
                    ArbiterSignal::Terminate,
                    format!("Hard cap of {} turns reached", cfg.hard_cap_turns),
                )
                .with_saturation(state.stable_turn_count),
                state,
                profile: input.profile.clone(),
            };
        }

        let profile = self.vulnerability.apply(input.profile, input.history);

        let stable = input
            .previous_profile
            .map(|prev| stability::profiles_equivalent(prev, &profile))
            .unwrap_or(false);
        let state = state.observe(stable);

        let result = self
            .cascade(input, &profile, state)
            .with_saturation(state.stable_turn_count);

        ArbiterDecision {
            result,
            state,
            profile,
        }
    }

    fn cascade(
        &self,
        input: &ArbiterInput<'_>,
        profile: &ClinicalProfile,
        state: ArbiterState,
    ) -> ArbiterResult {
        let cfg = &self.config;

        if profile.denial_confidence == Some(DenialConfidence::Low)
            && input.clarification_attempts < cfg.max_clarifications
        {
            return ArbiterResult::new(
                ArbiterSignal::RequireClarification,
                "Red-flag denial given with low confidence",
            );
        }

        if !profile.red_flags_explicitly_resolved() {
            let pending: Vec<String> = input
                .remaining_questions
                .iter()
                .filter(|q| q.is_red_flag)
                .map(|q| q.id.clone())
                .collect();
            if pending.is_empty() {
                return ArbiterResult::new(
                    ArbiterSignal::Continue,
                    "Red flags unresolved and no red-flag questions remain",
                );
            }
            return ArbiterResult::new(
                ArbiterSignal::PrioritizeRedFlags,
                "Red flags must be resolved before anything else",
            )
            .with_next_steps(pending);
        }

        let deferred = match sanity::check(
            profile,
            input.clarification_attempts,
            cfg.max_clarifications,
        ) {
            SanityOutcome::Hard(result) => return result,
            SanityOutcome::Soft(result) => Some(result),
            SanityOutcome::Clear => None,
        };

        if state.stable_turn_count >= cfg.saturation_turns && profile.readiness() >= FULL_READINESS {
            return ArbiterResult::new(
                ArbiterSignal::Terminate,
                format!(
                    "Profile saturated: stable for {} turns at full readiness",
                    state.stable_turn_count
                ),
            );
        }

        let floor = self.turn_floor(profile);
        if input.current_turn < floor {
            return ArbiterResult::new(
                ArbiterSignal::Continue,
                format!("Below minimum of {} turns ({})", floor, input.current_turn),
            );
        }

        if let Some(result) = deferred {
            return result;
        }

        let deep_case = profile.symptom_category == Some(SymptomCategory::Complex)
            || profile.is_complex_case
            || profile.clinical_friction_detected;
        if deep_case {
            let tier3: Vec<String> = input
                .remaining_questions
                .iter()
                .filter(|q| q.is_tier3())
                .map(|q| q.id.clone())
                .collect();
            if !tier3.is_empty() {
                return ArbiterResult::new(
                    ArbiterSignal::Continue,
                    "Deep ambiguity-resolution questions still pending",
                )
                .with_next_steps(tier3);
            }
        }

        if let Some(result) = self.completeness(input, profile) {
            return result;
        }

        if input.current_turn >= input.total_planned {
            return ArbiterResult::new(ArbiterSignal::Terminate, "Assessment plan exhausted");
        }
        if input.current_turn >= cfg.final_turn_limit {
            return ArbiterResult::new(
                ArbiterSignal::Terminate,
                format!("Final turn limit of {} reached", cfg.final_turn_limit),
            );
        }
        ArbiterResult::new(ArbiterSignal::Continue, "Continuing planned assessment")
    }

    /// Data completeness gate; `None` lets the final termination check run
    fn completeness(&self, input: &ArbiterInput<'_>, profile: &ClinicalProfile) -> Option<ArbiterResult> {
        let missing = profile.missing_core_slots();
        if !missing.is_empty() {
            return Some(
                ArbiterResult::new(
                    ArbiterSignal::Continue,
                    format!("Missing core data: {}", missing.join(", ")),
                )
                .with_next_steps(missing.into_iter().map(String::from).collect()),
            );
        }

        if !profile.red_flags_explicitly_resolved() {
            return Some(ArbiterResult::new(ArbiterSignal::Continue, "Red flags unresolved"));
        }

        let readiness = profile.readiness();
        if readiness >= FULL_READINESS && profile.internal_inconsistency_detected {
            return Some(
                ArbiterResult::new(
                    ArbiterSignal::RequireClarification,
                    "Full readiness reported despite internal inconsistency",
                )
                .with_reset(),
            );
        }

        if self.is_fever_case(profile, input.history)
            && profile.fever.is_complete()
            && profile.consistency() > self.config.fever_consistency_threshold
        {
            return Some(ArbiterResult::new(
                ArbiterSignal::Terminate,
                "Fever protocol complete and consistent",
            ));
        }

        if readiness < self.config.readiness_threshold {
            return Some(ArbiterResult::new(
                ArbiterSignal::Continue,
                format!("Readiness {:.2} below threshold", readiness),
            ));
        }

        None
    }

    /// Minimum turns before non-saturation termination
    pub fn turn_floor(&self, profile: &ClinicalProfile) -> u32 {
        let simple = profile.symptom_category == Some(SymptomCategory::Simple)
            && !profile.is_complex_case
            && !profile.is_vulnerable;
        if simple {
            self.config.simple_floor_turns
        } else {
            self.config.complex_floor_turns
        }
    }

    /// Fever vocabulary in the complaint or user turns, or a recorded maximum temperature
    pub fn is_fever_case(&self, profile: &ClinicalProfile, history: &[Turn]) -> bool {
        if profile.fever.fever_max_temp.is_some() {
            return true;
        }
        let mentions = |text: &str| self.fever_terms.iter().any(|re| re.is_match(text));
        profile.primary_complaint.as_deref().map(mentions).unwrap_or(false)
            || history.iter().filter(|t| t.is_user()).any(|t| mentions(&t.content))
    }
}
