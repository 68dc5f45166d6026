//! Merge planner-extracted profiles with deterministic slots

use triage_core::{profile::is_filled, ClinicalProfile, ClinicalSlots};

/// Planner values win; parsed slots only fill fields the planner left empty.
/// A parsed temperature feeds the fever sub-protocol's maximum temperature.
pub fn reconcile(mut profile: ClinicalProfile, slots: &ClinicalSlots) -> ClinicalProfile {
    if !is_filled(&profile.age) {
        if let Some(age) = slots.age {
            profile.age = Some(age.to_string());
        }
    }
    if !is_filled(&profile.duration) {
        profile.duration = slots.duration.clone().or(profile.duration);
    }
    if !is_filled(&profile.severity) {
        profile.severity = slots.severity.clone().or(profile.severity);
    }
    if profile.fever.fever_max_temp.is_none() {
        profile.fever.fever_max_temp = slots.temperature;
    }
    profile
}
