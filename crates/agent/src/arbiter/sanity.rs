//! Clinical sanity checks
//!
//! Hard findings pre-empt the turn floor; a soft finding is deferred until
//! the floor has been checked.

use triage_core::profile::is_filled;
use triage_core::{ArbiterResult, ArbiterSignal, ClinicalProfile, SymptomCategory};

#[derive(Debug, Clone, PartialEq)]
pub enum SanityOutcome {
    /// Return immediately
    Hard(ArbiterResult),
    /// Apply after the turn floor
    Soft(ArbiterResult),
    Clear,
}

pub fn check(
    profile: &ClinicalProfile,
    clarification_attempts: u32,
    max_clarifications: u32,
) -> SanityOutcome {
    if profile.ambiguity_detected && !profile.uncertainty_accepted {
        return SanityOutcome::Hard(ArbiterResult::new(
            ArbiterSignal::ResolveAmbiguity,
            "Unresolved ambiguity in reported symptoms",
        ));
    }

    if profile.internal_inconsistency_detected && clarification_attempts < max_clarifications {
        return SanityOutcome::Hard(ArbiterResult::new(
            ArbiterSignal::RequireClarification,
            "Contradictory reports need re-verification",
        ));
    }

    if profile.symptom_category == Some(SymptomCategory::Critical)
        && !(is_filled(&profile.severity) && is_filled(&profile.progression))
    {
        let mut missing = Vec::new();
        if !is_filled(&profile.severity) {
            missing.push("severity".to_string());
        }
        if !is_filled(&profile.progression) {
            missing.push("progression".to_string());
        }
        return SanityOutcome::Hard(
            ArbiterResult::new(
                ArbiterSignal::DrillDown,
                "Critical presentation lacks severity or progression detail",
            )
            .with_next_steps(missing),
        );
    }

    if profile.clinical_friction_detected && !profile.uncertainty_accepted {
        let reason = match profile.clinical_friction_details.as_deref() {
            Some(details) if !details.trim().is_empty() => {
                format!("Clinical friction: {}", details.trim())
            },
            _ => "Reported severity conflicts with the clinical picture".to_string(),
        };
        return SanityOutcome::Hard(ArbiterResult::new(ArbiterSignal::DrillDown, reason));
    }

    if !is_filled(&profile.progression) {
        return SanityOutcome::Soft(
            ArbiterResult::new(ArbiterSignal::Continue, "Symptom progression not yet established")
                .with_next_steps(vec!["progression".to_string()]),
        );
    }

    SanityOutcome::Clear
}
