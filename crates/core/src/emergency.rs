//! Emergency/crisis detection result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Body system a keyword belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySystem {
    Cardiac,
    Respiratory,
    Neurological,
    Trauma,
    Other,
}

impl BodySystem {
    pub fn display_name(&self) -> &'static str {
        match self {
            BodySystem::Cardiac => "Cardiac",
            BodySystem::Respiratory => "Respiratory",
            BodySystem::Neurological => "Neurological",
            BodySystem::Trauma => "Trauma",
            BodySystem::Other => "Other",
        }
    }
}

impl std::fmt::Display for BodySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What happened to a keyword match during evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDisposition {
    /// Counted towards the score
    Active,
    /// Denial phrasing around the term
    Negated,
    /// Hypothetical, familial or preventive context
    Excluded,
    /// Denied earlier in the session
    Suppressed,
    /// Contained in a longer active match
    Overlapped,
}

/// Evidence for a single keyword match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEvidence {
    pub term: String,
    pub system: BodySystem,
    pub score: u8,
    pub segment: usize,
    pub disposition: MatchDisposition,
    /// Negation cue or exclusion phrase responsible for the disposition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

/// One sentence segment of the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTrace {
    pub index: usize,
    pub text: String,
    /// Empty or degenerate segment, recorded but not scored
    pub rejected: bool,
}

/// Segment-level diagnostic trace returned with every evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionTrace {
    pub segments: Vec<SegmentTrace>,
    pub evidence: Vec<TermEvidence>,
    /// Human-readable score adjustments in application order
    pub adjustments: Vec<String>,
    pub absolute_present: bool,
    pub authority_override: bool,
    /// Score before context adjustments
    pub base_score: u8,
}

impl DetectionTrace {
    /// Evidence entries with the given disposition
    pub fn with_disposition(&self, disposition: MatchDisposition) -> impl Iterator<Item = &TermEvidence> {
        self.evidence.iter().filter(move |e| e.disposition == disposition)
    }
}

/// Result of a single detector evaluation
///
/// Immutable value produced fresh per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyDetectionResult {
    pub is_emergency: bool,
    /// 0 - 10
    pub score: u8,
    /// Matched keyword labels in order of first appearance
    pub matched_keywords: Vec<String>,
    pub affected_systems: BTreeSet<BodySystem>,
    pub medical_justification: String,
    pub debug: DetectionTrace,
}

impl EmergencyDetectionResult {
    /// Result for text with nothing to report
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_system(&self, system: BodySystem) -> bool {
        self.affected_systems.contains(&system)
    }

    /// First matched keyword, used as the label in verification prompts
    pub fn primary_keyword(&self) -> Option<&str> {
        self.matched_keywords.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_systems_are_ordered_and_displayed() {
        let mut result = EmergencyDetectionResult::none();
        result.affected_systems.insert(BodySystem::Respiratory);
        result.affected_systems.insert(BodySystem::Cardiac);
        let names: Vec<String> = result.affected_systems.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Cardiac", "Respiratory"]);
        assert!(result.has_system(BodySystem::Cardiac));
        assert!(!result.has_system(BodySystem::Trauma));
    }

    #[test]
    fn test_trace_filter() {
        let trace = DetectionTrace {
            evidence: vec![
                TermEvidence {
                    term: "chest pain".into(),
                    system: BodySystem::Cardiac,
                    score: 8,
                    segment: 0,
                    disposition: MatchDisposition::Negated,
                    cue: Some("no".into()),
                },
                TermEvidence {
                    term: "fainting".into(),
                    system: BodySystem::Neurological,
                    score: 7,
                    segment: 1,
                    disposition: MatchDisposition::Active,
                    cue: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(trace.with_disposition(MatchDisposition::Negated).count(), 1);
        assert_eq!(trace.with_disposition(MatchDisposition::Active).next().unwrap().term, "fainting");
    }
}
