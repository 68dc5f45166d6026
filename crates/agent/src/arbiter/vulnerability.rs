//! Vulnerable-group detection
//!
//! Pediatric (< 5 years), geriatric (>= 65 years) and maternal patients
//! get the higher turn floor. The flag is one-way: once set it is never
//! cleared within a session.

use regex::Regex;

use triage_core::{ClinicalProfile, Turn};

pub const PEDIATRIC_MAX_AGE: f64 = 5.0;
pub const GERIATRIC_MIN_AGE: f64 = 65.0;

/// Why a profile is considered vulnerable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VulnerableGroup {
    Pediatric,
    Geriatric,
    Maternal,
}

/// Compiled maternal-context vocabulary
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityRules {
    maternal: Vec<Regex>,
}

impl VulnerabilityRules {
    pub fn new(maternal_keywords: &[String]) -> Self {
        let maternal = maternal_keywords
            .iter()
            .filter_map(|k| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k))).ok())
            .collect();
        Self { maternal }
    }

    /// Group the patient belongs to, if any
    pub fn classify(&self, profile: &ClinicalProfile, history: &[Turn]) -> Option<VulnerableGroup> {
        if let Some(age) = profile.age_years() {
            if age < PEDIATRIC_MAX_AGE {
                return Some(VulnerableGroup::Pediatric);
            }
            if age >= GERIATRIC_MIN_AGE {
                return Some(VulnerableGroup::Geriatric);
            }
        }

        let maternal = history
            .iter()
            .filter(|t| t.is_user())
            .any(|t| self.maternal.iter().any(|re| re.is_match(&t.content)));
        maternal.then_some(VulnerableGroup::Maternal)
    }

    /// Profile with `is_vulnerable` set when a group applies
    pub fn apply(&self, profile: &ClinicalProfile, history: &[Turn]) -> ClinicalProfile {
        let mut updated = profile.clone();
        if !updated.is_vulnerable {
            if let Some(group) = self.classify(profile, history) {
                tracing::info!(group = ?group, "Vulnerable patient group detected");
                updated.is_vulnerable = true;
            }
        }
        updated
    }
}
