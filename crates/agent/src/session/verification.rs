//! Emergency verification sub-protocol
//!
//! When the detector fires mid-session the interview halts and the patient
//! is asked whether the symptom is happening right now.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use triage_core::EmergencyDetectionResult;

/// Patient's answer to the verification prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAnswer {
    /// Escalate immediately and end the session
    HappeningNow,
    /// Resume with a sticky conservative flag
    RecentlyResolved,
    /// Resume with the keyword suppressed for the rest of the session
    Denied,
}

// Ongoing cues win over everything else: "it hasn't stopped" is not a
// resolution. After that, "it went away" must not read as a plain "no".
static ONGOING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(still|right now|currently|hasn'?t stopped|has not stopped|not stopped|not gone|isn'?t gone|won'?t stop|keeps? happening|abhi bhi|ab bhi|todav[ií]a|sigue)\b",
    )
    .unwrap()
});

static RESOLVED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(earlier|before|went away|gone now|it'?s gone|has passed|passed now|stopped|resolved|not anymore|no longer|used to|pehle|ab nahi|chala gaya|antes|ya pas[oó]|ya no)\b",
    )
    .unwrap()
});

static NOW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(yes|yeah|yep|right now|now|currently|still|happening|abhi|haan|s[ií]|ahora|ahorita)\b",
    )
    .unwrap()
});

static DENIED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(no|nope|nah|never|not really|i don'?t|wrong|mistake|nahi|nahin|nunca)\b")
        .unwrap()
});

/// Classify a free-text reply; `None` when nothing recognizable was said
pub fn classify_answer(text: &str) -> Option<VerificationAnswer> {
    let text = text.replace('\u{2019}', "'");
    if ONGOING_PATTERN.is_match(&text) {
        Some(VerificationAnswer::HappeningNow)
    } else if RESOLVED_PATTERN.is_match(&text) {
        Some(VerificationAnswer::RecentlyResolved)
    } else if DENIED_PATTERN.is_match(&text) {
        Some(VerificationAnswer::Denied)
    } else if NOW_PATTERN.is_match(&text) {
        Some(VerificationAnswer::HappeningNow)
    } else {
        None
    }
}

/// A detection awaiting the patient's confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingVerification {
    /// The text that triggered detection
    pub text: String,
    pub detection: EmergencyDetectionResult,
    /// Detection fired on the opening complaint, before any plan existed
    pub during_intake: bool,
}

impl PendingVerification {
    pub fn prompt(&self) -> String {
        let subject = self
            .detection
            .primary_keyword()
            .unwrap_or("these symptoms");
        format!(
            "You mentioned {}. Is this happening right now, did it happen earlier and has since stopped, or did I misunderstand?",
            subject
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_answers() {
        assert_eq!(classify_answer("Yes, right now"), Some(VerificationAnswer::HappeningNow));
        assert_eq!(classify_answer("haan abhi"), Some(VerificationAnswer::HappeningNow));
        assert_eq!(
            classify_answer("it happened earlier but went away"),
            Some(VerificationAnswer::RecentlyResolved)
        );
        assert_eq!(
            classify_answer("no, it's not like that"),
            Some(VerificationAnswer::Denied)
        );
        assert_eq!(classify_answer("ya no"), Some(VerificationAnswer::RecentlyResolved));
        assert_eq!(classify_answer("hmm"), None);
    }

    #[test]
    fn test_ongoing_cues_beat_resolution_words() {
        let ongoing = [
            "Yes, it is still happening, it hasn't stopped",
            "it hasn\u{2019}t stopped since before lunch",
            "no, it's not gone",
            "it won't stop",
            "abhi bhi ho raha hai",
            "todavía me duele",
        ];
        for reply in ongoing {
            assert_eq!(
                classify_answer(reply),
                Some(VerificationAnswer::HappeningNow),
                "{}",
                reply
            );
        }
        assert_eq!(
            classify_answer("it stopped an hour ago"),
            Some(VerificationAnswer::RecentlyResolved)
        );
    }

    #[test]
    fn test_prompt_names_keyword() {
        let mut detection = EmergencyDetectionResult::none();
        detection.matched_keywords = vec!["chest pain".into()];
        let pending = PendingVerification {
            text: "chest pain".into(),
            detection,
            during_intake: false,
        };
        assert!(pending.prompt().contains("chest pain"));
    }
}
