//! Triage arbiter signals, results and per-session state

use serde::{Deserialize, Serialize};

/// Closed set of control decisions the triage policy may emit each turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArbiterSignal {
    /// Finalize the assessment
    Terminate,
    /// Proceed with the next planned question
    Continue,
    /// Move ambiguity-resolution questions to the front
    ResolveAmbiguity,
    /// Move red-flag questions to the front
    PrioritizeRedFlags,
    /// Ask a forced yes/no re-check
    RequireClarification,
    /// Ask one immediate follow-up question
    DrillDown,
}

impl ArbiterSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArbiterSignal::Terminate => "TERMINATE",
            ArbiterSignal::Continue => "CONTINUE",
            ArbiterSignal::ResolveAmbiguity => "RESOLVE_AMBIGUITY",
            ArbiterSignal::PrioritizeRedFlags => "PRIORITIZE_RED_FLAGS",
            ArbiterSignal::RequireClarification => "REQUIRE_CLARIFICATION",
            ArbiterSignal::DrillDown => "DRILL_DOWN",
        }
    }

    /// Signals that pre-empt the turn floor
    pub fn is_hard_override(&self) -> bool {
        matches!(
            self,
            ArbiterSignal::ResolveAmbiguity
                | ArbiterSignal::RequireClarification
                | ArbiterSignal::DrillDown
        )
    }
}

impl std::fmt::Display for ArbiterSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision emitted by the arbiter for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbiterResult {
    pub signal: ArbiterSignal,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
    /// Completeness is suspected to be a false positive
    #[serde(default)]
    pub needs_reset: bool,
    /// Consecutive stable turns observed (diagnostic)
    #[serde(default)]
    pub saturation_count: u32,
}

impl ArbiterResult {
    pub fn new(signal: ArbiterSignal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
            next_steps: None,
            needs_reset: false,
            saturation_count: 0,
        }
    }

    pub fn with_next_steps(mut self, steps: Vec<String>) -> Self {
        self.next_steps = Some(steps);
        self
    }

    pub fn with_reset(mut self) -> Self {
        self.needs_reset = true;
        self
    }

    pub fn with_saturation(mut self, count: u32) -> Self {
        self.saturation_count = count;
        self
    }
}

/// Arbiter state owned by a single session
///
/// Threaded explicitly through every evaluation so sessions never share
/// saturation tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbiterState {
    /// Consecutive turns in which the profile did not change
    pub stable_turn_count: u32,
}

impl ArbiterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next state after observing a stable or changed profile
    pub fn observe(self, stable: bool) -> Self {
        Self {
            stable_turn_count: if stable {
                self.stable_turn_count.saturating_add(1)
            } else {
                0
            },
        }
    }
}
