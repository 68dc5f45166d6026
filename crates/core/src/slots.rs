//! Deterministic clinical slots parsed from free text

use serde::{Deserialize, Serialize};

/// Regex-derived clinical facts
///
/// Merge rule: a newly parsed value always overwrites the aggregate for its
/// field ("latest wins"); fields absent from the new parse keep their prior
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSlots {
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Normalized duration phrase ("3 days", "yesterday")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Numeric ("7/10") or qualitative ("severe") severity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Temperature in degrees Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ClinicalSlots {
    /// No field is set
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.duration.is_none()
            && self.severity.is_none()
            && self.temperature.is_none()
    }

    /// Merge a newer parse over this aggregate
    pub fn merged_with(&self, newer: &ClinicalSlots) -> ClinicalSlots {
        ClinicalSlots {
            age: newer.age.or(self.age),
            duration: newer.duration.clone().or_else(|| self.duration.clone()),
            severity: newer.severity.clone().or_else(|| self.severity.clone()),
            temperature: newer.temperature.or(self.temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_wins() {
        let old = ClinicalSlots {
            age: Some(40),
            duration: Some("2 days".into()),
            severity: Some("mild".into()),
            temperature: None,
        };
        let newer = ClinicalSlots {
            severity: Some("8/10".into()),
            temperature: Some(38.5),
            ..Default::default()
        };
        let merged = old.merged_with(&newer);
        assert_eq!(merged.age, Some(40));
        assert_eq!(merged.duration.as_deref(), Some("2 days"));
        assert_eq!(merged.severity.as_deref(), Some("8/10"));
        assert_eq!(merged.temperature, Some(38.5));
    }

    #[test]
    fn test_empty_merge_is_identity() {
        let old = ClinicalSlots {
            age: Some(7),
            ..Default::default()
        };
        assert_eq!(old.merged_with(&ClinicalSlots::default()), old);
        assert!(ClinicalSlots::default().is_empty());
    }
}
