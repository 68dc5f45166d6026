//! Session boundary payloads consumed by recommendation rendering

use serde::{Deserialize, Serialize};

use crate::emergency::EmergencyDetectionResult;
use crate::profile::ClinicalProfile;

/// One question/answer exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
}

impl AnswerRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Payload produced when an interview finalizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub symptoms: String,
    pub answers: Vec<AnswerRecord>,
    #[serde(rename = "extractedProfile")]
    pub extracted_profile: ClinicalProfile,
    /// An emergency symptom was reported as recently resolved
    #[serde(rename = "isRecentResolved", default, skip_serializing_if = "Option::is_none")]
    pub is_recent_resolved: Option<bool>,
    #[serde(rename = "resolvedKeyword", default, skip_serializing_if = "Option::is_none")]
    pub resolved_keyword: Option<String>,
    /// Why the interview ended
    #[serde(default)]
    pub termination_reason: String,
    /// The interview ended conservatively after a collaborator failure
    #[serde(default)]
    pub safety_fail: bool,
    /// Streamed planner narrative, empty when unavailable
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub narrative: String,
}

/// Payload that bypasses the interview entirely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyOverride {
    pub recommended_level: String,
    pub user_advice: String,
    pub clinical_soap: String,
    pub key_concerns: Vec<String>,
    pub critical_warnings: Vec<String>,
    pub relevant_services: Vec<String>,
    pub red_flags: Vec<String>,
    pub triage_logic: String,
}

impl EmergencyOverride {
    pub const LEVEL: &'static str = "emergency";

    /// Build the override from a confirmed detection
    pub fn from_detection(symptoms: &str, detection: &EmergencyDetectionResult) -> Self {
        let systems: Vec<String> = detection
            .affected_systems
            .iter()
            .map(|s| s.display_name().to_string())
            .collect();

        Self {
            recommended_level: Self::LEVEL.to_string(),
            user_advice: "Call your local emergency number or go to the nearest emergency \
                          department now. Do not drive yourself."
                .to_string(),
            clinical_soap: format!(
                "S: {}. O: patient-reported, not examined. A: possible emergency ({}). \
                 P: immediate in-person emergency evaluation.",
                symptoms.trim(),
                if systems.is_empty() {
                    "unspecified".to_string()
                } else {
                    systems.join(", ")
                }
            ),
            key_concerns: detection.matched_keywords.clone(),
            critical_warnings: vec![
                "Symptoms reported as happening now may be life-threatening.".to_string(),
            ],
            relevant_services: vec!["Emergency services".to_string()],
            red_flags: detection.matched_keywords.clone(),
            triage_logic: format!(
                "Emergency score {}/10 confirmed by patient. {}",
                detection.score, detection.medical_justification
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::BodySystem;

    #[test]
    fn test_override_from_detection() {
        let mut detection = EmergencyDetectionResult::none();
        detection.is_emergency = true;
        detection.score = 10;
        detection.matched_keywords = vec!["chest pain".into()];
        detection.affected_systems.insert(BodySystem::Cardiac);
        detection.medical_justification = "Cardiac red flag".into();

        let payload = EmergencyOverride::from_detection("crushing chest pain", &detection);
        assert_eq!(payload.recommended_level, "emergency");
        assert_eq!(payload.red_flags, vec!["chest pain"]);
        assert!(payload.clinical_soap.contains("Cardiac"));
        assert!(payload.triage_logic.contains("10/10"));
    }

    #[test]
    fn test_summary_wire_names() {
        let summary = SessionSummary {
            symptoms: "cough".into(),
            answers: vec![AnswerRecord::new("How long?", "3 days")],
            extracted_profile: ClinicalProfile::default(),
            is_recent_resolved: Some(true),
            resolved_keyword: Some("fainting".into()),
            termination_reason: "complete".into(),
            safety_fail: false,
            narrative: String::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("extractedProfile").is_some());
        assert_eq!(json["isRecentResolved"], true);
        assert_eq!(json["resolvedKeyword"], "fainting");
        assert!(json.get("narrative").is_none());
    }
}
