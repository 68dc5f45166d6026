//! Clinical profile: the shared fact sheet built up across a session
//!
//! The profile is produced by the planner (structured extraction over the
//! conversation history) and reconciled with deterministic slots parsed
//! from user text. Every field is optional or defaults to "not yet
//! established"; nothing missing is ever read as negative or resolved.

use serde::{Deserialize, Serialize};

/// Acuity category of the presenting complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomCategory {
    Simple,
    Complex,
    Critical,
}

impl SymptomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomCategory::Simple => "simple",
            SymptomCategory::Complex => "complex",
            SymptomCategory::Critical => "critical",
        }
    }
}

/// Confidence label on a user's negative answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialConfidence {
    Low,
    Medium,
    High,
}

/// Fever-specific sub-protocol slots
///
/// Only consulted when the case is fever-related. Serialized flat into the
/// profile so planner output can populate them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeverProtocol {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_duration: Option<String>,
    /// Highest recorded temperature in degrees Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_max_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_antipyretic_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_hydration_ability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_functional_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_cognitive_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_red_flags_checklist: Option<String>,
}

impl FeverProtocol {
    /// Number of fever slots in the sub-protocol
    pub const SLOT_COUNT: usize = 7;

    /// Count of filled (non-blank) fever slots
    pub fn filled_count(&self) -> usize {
        let texts = [
            &self.fever_duration,
            &self.fever_antipyretic_response,
            &self.fever_hydration_ability,
            &self.fever_functional_status,
            &self.fever_cognitive_status,
            &self.fever_red_flags_checklist,
        ];
        texts.iter().filter(|s| is_filled(s)).count() + usize::from(self.fever_max_temp.is_some())
    }

    /// All seven fever slots are present
    pub fn is_complete(&self) -> bool {
        self.filled_count() == Self::SLOT_COUNT
    }
}

/// Shared clinical fact sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalProfile {
    // Core slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<String>,
    /// Main presenting complaint in the patient's words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_complaint: Option<String>,

    // Safety slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flag_denials: Option<String>,
    /// Must be explicitly set; `None` means red flags were never addressed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flags_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_confidence: Option<DenialConfidence>,

    // Acuity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_category: Option<SymptomCategory>,
    #[serde(default)]
    pub is_complex_case: bool,
    #[serde(default)]
    pub is_vulnerable: bool,

    // Coherence
    #[serde(default)]
    pub ambiguity_detected: bool,
    #[serde(default)]
    pub uncertainty_accepted: bool,
    #[serde(default)]
    pub clinical_friction_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_friction_details: Option<String>,
    #[serde(default)]
    pub internal_inconsistency_detected: bool,
    /// 0.0 - 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_consistency_score: Option<f64>,

    // Readiness
    /// 0.0 - 1.0, proxy for "enough information gathered"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage_readiness_score: Option<f64>,

    #[serde(flatten)]
    pub fever: FeverProtocol,
}

impl ClinicalProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted or transmitted snapshot
    ///
    /// Malformed snapshots are treated as "no prior profile".
    pub fn from_snapshot(json: &str) -> Option<Self> {
        if json.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<ClinicalProfile>(json) {
            Ok(profile) => Some(profile.clamped()),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparseable profile snapshot");
                None
            },
        }
    }

    /// Serialize to a snapshot string
    pub fn to_snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Clamp every numeric score into its documented range
    pub fn clamped(mut self) -> Self {
        self.internal_consistency_score = self.internal_consistency_score.map(clamp_unit);
        self.triage_readiness_score = self.triage_readiness_score.map(clamp_unit);
        self
    }

    /// Readiness score, 0.0 when absent
    pub fn readiness(&self) -> f64 {
        self.triage_readiness_score.map(clamp_unit).unwrap_or(0.0)
    }

    /// Consistency score, 0.0 when absent
    pub fn consistency(&self) -> f64 {
        self.internal_consistency_score.map(clamp_unit).unwrap_or(0.0)
    }

    /// Red flags were explicitly resolved
    pub fn red_flags_explicitly_resolved(&self) -> bool {
        self.red_flags_resolved == Some(true)
    }

    /// Age in years after numeric normalization
    pub fn age_years(&self) -> Option<f64> {
        self.age.as_deref().and_then(parse_age_years)
    }

    /// Names of the core slots that are still missing
    pub fn missing_core_slots(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !is_filled(&self.age) {
            missing.push("age");
        }
        if !is_filled(&self.duration) {
            missing.push("duration");
        }
        if !is_filled(&self.severity) {
            missing.push("severity");
        }
        if !is_filled(&self.red_flag_denials) {
            missing.push("red_flag_denials");
        }
        missing
    }

    /// Complex or critical acuity (or flagged as complex)
    pub fn is_high_acuity(&self) -> bool {
        self.is_complex_case
            || matches!(
                self.symptom_category,
                Some(SymptomCategory::Complex) | Some(SymptomCategory::Critical)
            )
    }
}

/// A text slot is filled when it holds non-whitespace content
pub fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// First decimal number found in free text
pub fn first_number(text: &str) -> Option<f64> {
    let mut buf = String::new();
    let mut seen_digit = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            buf.push(c);
            seen_digit = true;
        } else if c == '.' && seen_digit && !buf.contains('.') {
            buf.push(c);
        } else if seen_digit {
            break;
        }
    }
    buf.trim_end_matches('.').parse().ok()
}

/// Parse a free-text age ("45", "45 years", "18 months") into years
pub fn parse_age_years(text: &str) -> Option<f64> {
    let value = first_number(text)?;
    let lower = text.to_lowercase();
    if lower.contains("month") || lower.contains("mahine") || lower.contains("meses") {
        Some(value / 12.0)
    } else if lower.contains("week") {
        Some(value / 52.0)
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip_flattens_fever() {
        let mut profile = ClinicalProfile::new();
        profile.age = Some("34".to_string());
        profile.fever.fever_max_temp = Some(39.2);
        let json = profile.to_snapshot();
        assert!(json.contains("\"fever_max_temp\":39.2"));
        assert_eq!(ClinicalProfile::from_snapshot(&json), Some(profile));
    }

    #[test]
    fn test_malformed_snapshot_is_no_profile() {
        assert!(ClinicalProfile::from_snapshot("{not json").is_none());
        assert!(ClinicalProfile::from_snapshot("").is_none());
    }

    #[test]
    fn test_snapshot_scores_are_clamped() {
        let profile = ClinicalProfile::from_snapshot(
            r#"{"triage_readiness_score": 1.7, "internal_consistency_score": -0.3}"#,
        )
        .unwrap();
        assert_eq!(profile.triage_readiness_score, Some(1.0));
        assert_eq!(profile.internal_consistency_score, Some(0.0));
    }

    #[test]
    fn test_planner_style_json() {
        let profile: ClinicalProfile = serde_json::from_str(
            r#"{
                "age": "70",
                "symptom_category": "complex",
                "denial_confidence": "low",
                "red_flags_resolved": true,
                "fever_duration": "2 days"
            }"#,
        )
        .unwrap();
        assert_eq!(profile.symptom_category, Some(SymptomCategory::Complex));
        assert_eq!(profile.denial_confidence, Some(DenialConfidence::Low));
        assert!(profile.red_flags_explicitly_resolved());
        assert_eq!(profile.fever.fever_duration.as_deref(), Some("2 days"));
    }

    #[test]
    fn test_missing_core_slots() {
        let mut profile = ClinicalProfile::new();
        profile.age = Some("  ".to_string());
        profile.duration = Some("3 days".to_string());
        assert_eq!(
            profile.missing_core_slots(),
            vec!["age", "severity", "red_flag_denials"]
        );
    }

    #[test]
    fn test_age_normalization() {
        assert_eq!(parse_age_years("45"), Some(45.0));
        assert_eq!(parse_age_years("45 years old"), Some(45.0));
        assert_eq!(parse_age_years("18 months"), Some(1.5));
        assert_eq!(parse_age_years("unknown"), None);
    }

    #[test]
    fn test_fever_protocol_completeness() {
        let mut fever = FeverProtocol::default();
        assert_eq!(fever.filled_count(), 0);
        fever.fever_duration = Some("2 days".into());
        fever.fever_max_temp = Some(38.9);
        fever.fever_antipyretic_response = Some("responds".into());
        fever.fever_hydration_ability = Some("drinking".into());
        fever.fever_functional_status = Some("normal".into());
        fever.fever_cognitive_status = Some("alert".into());
        assert!(!fever.is_complete());
        fever.fever_red_flags_checklist = Some("none".into());
        assert!(fever.is_complete());
    }
}
