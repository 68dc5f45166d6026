//! Semantic profile stability for saturation detection
//!
//! Two profiles are equivalent when a re-extraction produced no clinically
//! meaningful change:
//! - age and severity match numerically, falling back to case-insensitive text
//! - duration and progression match as normalized text
//! - red-flag denials match as sets of content words
//! - resolution, category and acuity flags match exactly

use std::collections::BTreeSet;

use triage_core::profile::{first_number, parse_age_years};
use triage_core::ClinicalProfile;

/// Words that carry no clinical content in a denial summary
const DENIAL_FILLER: &[&str] = &[
    "reports", "reported", "symptoms", "symptom", "patient", "any", "and", "or", "the", "of",
    "has", "have", "had", "with",
];

/// Negation words collapse into one marker so polarity survives tokenizing
const DENIAL_NEGATIONS: &[&str] = &["denies", "denied", "deny", "no", "not", "without", "none"];
const NEGATION_MARKER: &str = "no";

fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|v| !v.is_empty())
}

fn text_equal(a: Option<&str>, b: Option<&str>) -> bool {
    normalize_text(a) == normalize_text(b)
}

fn numeric_equal(
    a: Option<&str>,
    b: Option<&str>,
    parse: impl Fn(&str) -> Option<f64>,
) -> bool {
    match (a.and_then(&parse), b.and_then(&parse)) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => text_equal(a, b),
    }
}

fn denial_tokens(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or_default()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !DENIAL_FILLER.contains(w))
        .map(|w| {
            if DENIAL_NEGATIONS.contains(&w) {
                NEGATION_MARKER.to_string()
            } else {
                w.to_string()
            }
        })
        .collect()
}

/// Whether two profiles are equivalent for saturation purposes
pub fn profiles_equivalent(a: &ClinicalProfile, b: &ClinicalProfile) -> bool {
    numeric_equal(a.age.as_deref(), b.age.as_deref(), parse_age_years)
        && numeric_equal(a.severity.as_deref(), b.severity.as_deref(), first_number)
        && text_equal(a.duration.as_deref(), b.duration.as_deref())
        && text_equal(a.progression.as_deref(), b.progression.as_deref())
        && denial_tokens(a.red_flag_denials.as_deref()) == denial_tokens(b.red_flag_denials.as_deref())
        && a.red_flags_resolved == b.red_flags_resolved
        && a.symptom_category == b.symptom_category
        && a.is_complex_case == b.is_complex_case
        && a.is_vulnerable == b.is_vulnerable
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::SymptomCategory;

    fn base() -> ClinicalProfile {
        ClinicalProfile {
            age: Some("45".into()),
            duration: Some("3 days".into()),
            severity: Some("7/10".into()),
            progression: Some("worsening".into()),
            red_flag_denials: Some("Denies chest pain and fainting".into()),
            red_flags_resolved: Some(true),
            symptom_category: Some(SymptomCategory::Simple),
            ..Default::default()
        }
    }

    #[test]
    fn test_numeric_normalization() {
        let mut other = base();
        other.age = Some("45 years".into());
        other.severity = Some("7 out of 10".into());
        assert!(profiles_equivalent(&base(), &other));

        other.age = Some("46".into());
        assert!(!profiles_equivalent(&base(), &other));
    }

    #[test]
    fn test_text_fields_are_whitespace_and_case_insensitive() {
        let mut other = base();
        other.duration = Some("  3   Days ".into());
        assert!(profiles_equivalent(&base(), &other));

        other.progression = Some("improving".into());
        assert!(!profiles_equivalent(&base(), &other));
    }

    #[test]
    fn test_denials_compare_as_word_sets() {
        let mut other = base();
        other.red_flag_denials = Some("fainting, chest pain: patient reports none".into());
        assert!(profiles_equivalent(&base(), &other));

        other.red_flag_denials = Some("denies chest pain".into());
        assert!(!profiles_equivalent(&base(), &other));
    }

    #[test]
    fn test_denial_polarity_flip_is_a_change() {
        let mut affirmed = base();
        affirmed.red_flag_denials = Some("chest pain and fainting".into());
        assert!(!profiles_equivalent(&base(), &affirmed));

        let mut rephrased = base();
        rephrased.red_flag_denials = Some("no chest pain, no fainting".into());
        assert!(profiles_equivalent(&base(), &rephrased));
    }

    #[test]
    fn test_flags_are_strict() {
        let mut other = base();
        other.is_vulnerable = true;
        assert!(!profiles_equivalent(&base(), &other));

        let mut other = base();
        other.red_flags_resolved = None;
        assert!(!profiles_equivalent(&base(), &other));
    }
}
