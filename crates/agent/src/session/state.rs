//! Per-session mutable state
//!
//! Owned exclusively by one `TriageSession`; nothing here is shared across
//! sessions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use triage_core::{AnswerRecord, ArbiterState, AssessmentQuestion, ClinicalProfile, Turn};
use triage_text_processing::ClinicalSlotParser;

use super::verification::PendingVerification;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the opening complaint and plan
    Intake,
    /// Asking planned and expanded questions
    FollowUp,
    /// Final profile extraction in progress
    Review,
    /// Terminal; payload produced
    Generating,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Intake => "intake",
            SessionPhase::FollowUp => "follow_up",
            SessionPhase::Review => "review",
            SessionPhase::Generating => "generating",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether questions come from the planner or the static offline graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Planned,
    Offline { node_id: String },
}

/// What the question currently awaiting an answer is
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Asking {
    Planned(AssessmentQuestion),
    Expansion(AssessmentQuestion),
    /// Forced yes/no re-check; does not consume a turn slot
    Clarification(AssessmentQuestion),
    Offline {
        node_id: String,
        text: String,
        options: Vec<String>,
    },
}

impl Asking {
    pub fn text(&self) -> &str {
        match self {
            Asking::Planned(q) | Asking::Expansion(q) | Asking::Clarification(q) => &q.text,
            Asking::Offline { text, .. } => text,
        }
    }

    pub fn is_red_flag(&self) -> bool {
        match self {
            Asking::Planned(q) | Asking::Expansion(q) => q.is_red_flag,
            Asking::Clarification(_) | Asking::Offline { .. } => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub phase: SessionPhase,
    pub mode: SessionMode,
    pub symptoms: String,
    pub patient_name: Option<String>,
    pub history: Vec<Turn>,
    pub answers: Vec<AnswerRecord>,
    pub queue: VecDeque<AssessmentQuestion>,
    pub asking: Option<Asking>,
    /// A drill-down interrupted the plan; bridge when it resumes
    pub queue_suspended: bool,
    pub profile: ClinicalProfile,
    pub last_evaluated: Option<ClinicalProfile>,
    pub arbiter_state: ArbiterState,
    pub slots: ClinicalSlotParser,
    /// Planned and expanded questions answered
    pub turn_count: u32,
    pub answers_since_extraction: u32,
    pub clarification_attempts: u32,
    pub expansions: u32,
    pub pending_verification: Option<PendingVerification>,
    pub suppressed_keywords: Vec<String>,
    pub recently_resolved: bool,
    pub resolved_keyword: Option<String>,
    pub started: bool,
    pub ended: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Intake,
            mode: SessionMode::Planned,
            symptoms: String::new(),
            patient_name: None,
            history: Vec::new(),
            answers: Vec::new(),
            queue: VecDeque::new(),
            asking: None,
            queue_suspended: false,
            profile: ClinicalProfile::new(),
            last_evaluated: None,
            arbiter_state: ArbiterState::new(),
            slots: ClinicalSlotParser::new(),
            turn_count: 0,
            answers_since_extraction: 0,
            clarification_attempts: 0,
            expansions: 0,
            pending_verification: None,
            suppressed_keywords: Vec::new(),
            recently_resolved: false,
            resolved_keyword: None,
            started: false,
            ended: false,
        }
    }

    /// Total planned length: answered plus still queued
    pub fn total_planned(&self) -> u32 {
        self.turn_count + self.queue.len() as u32
    }

    pub fn suppress(&mut self, keywords: &[String]) {
        for keyword in keywords {
            if !self.suppressed_keywords.contains(keyword) {
                self.suppressed_keywords.push(keyword.clone());
            }
        }
    }

    /// Move red-flag questions (and any named ids) to the front, keeping
    /// relative order within each group
    pub fn prioritize_red_flags(&mut self, ids: &[String]) {
        let (front, back): (Vec<_>, Vec<_>) = self
            .queue
            .drain(..)
            .partition(|q| q.is_red_flag || ids.contains(&q.id));
        self.queue = front.into_iter().chain(back).collect();
    }

    /// Move deeper (higher tier) questions to the front
    pub fn prioritize_depth(&mut self) {
        let mut questions: Vec<_> = self.queue.drain(..).collect();
        questions.sort_by(|a, b| b.tier.cmp(&a.tier));
        self.queue = questions.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(state: &SessionState) -> Vec<&str> {
        state.queue.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_prioritize_red_flags_is_stable() {
        let mut state = SessionState::new();
        state.queue = vec![
            AssessmentQuestion::new("q1", "How long?"),
            AssessmentQuestion::new("rf1", "Fainting?").red_flag(),
            AssessmentQuestion::new("q2", "Severity?"),
            AssessmentQuestion::new("rf2", "Chest pain?").red_flag(),
        ]
        .into();
        state.prioritize_red_flags(&["q2".to_string()]);
        assert_eq!(queued(&state), vec!["rf1", "q2", "rf2", "q1"]);
    }

    #[test]
    fn test_prioritize_depth() {
        let mut state = SessionState::new();
        state.queue = vec![
            AssessmentQuestion::new("a", "?"),
            AssessmentQuestion::new("b", "?").with_tier(3),
            AssessmentQuestion::new("c", "?").with_tier(2),
        ]
        .into();
        state.prioritize_depth();
        assert_eq!(queued(&state), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_suppress_deduplicates() {
        let mut state = SessionState::new();
        state.suppress(&["chest pain".to_string()]);
        state.suppress(&["chest pain".to_string(), "fainting".to_string()]);
        assert_eq!(state.suppressed_keywords, vec!["chest pain", "fainting"]);
    }
}
