//! Centralized defaults for the triage core
//!
//! Single source of truth for the policy numbers the settings layer falls
//! back to when a value is not configured.

/// Emergency detector scoring
pub mod detector {
    /// Scores strictly above this are emergencies
    pub const EMERGENCY_THRESHOLD: u8 = 7;

    /// Score ceiling; absolute keywords force it
    pub const MAX_SCORE: u8 = 10;

    /// Words inspected before a keyword for a negation cue
    pub const NEGATION_WINDOW_WORDS: usize = 4;

    /// Words inspected after a keyword for a post-positioned cue
    pub const POST_NEGATION_WINDOW_WORDS: usize = 3;

    /// Points removed when viral context accompanies a non-critical score
    pub const VIRAL_DAMPENING: u8 = 2;

    /// Points added for a chronic presentation
    pub const CHRONIC_BOOST: u8 = 1;

    /// Points added when cardiac and respiratory systems co-occur
    pub const CARDIO_RESPIRATORY_BOOST: u8 = 3;
}

/// Triage arbiter turn policy
pub mod arbiter {
    /// Total turns after which the interview always finalizes
    pub const HARD_CAP_TURNS: u32 = 12;

    /// Minimum turns for simple cases
    pub const SIMPLE_FLOOR_TURNS: u32 = 4;

    /// Minimum turns for complex, critical or unclassified cases
    pub const COMPLEX_FLOOR_TURNS: u32 = 7;

    /// Turn at which the final-turn completeness check applies
    pub const FINAL_TURN_LIMIT: u32 = 10;

    /// Readiness score required for non-critical termination
    pub const READINESS_THRESHOLD: f64 = 0.90;

    /// Internal consistency required for fever-case termination
    pub const FEVER_CONSISTENCY_THRESHOLD: f64 = 0.85;

    /// Stable turns required to call the interview saturated
    pub const SATURATION_TURNS: u32 = 2;
}

/// Session orchestration
pub mod session {
    /// Profile is re-extracted every N answers
    pub const PROFILE_EXTRACTION_INTERVAL: u32 = 2;

    /// Maximum clarification questions per session
    pub const MAX_CLARIFICATIONS: u32 = 2;

    /// Maximum dynamic follow-up expansions per session
    pub const MAX_EXPANSIONS: u32 = 3;

    /// A turn lock older than this is considered stuck and released
    pub const TURN_LOCK_TIMEOUT_MS: u64 = 45_000;
}

/// Default data document locations (relative to the working directory)
pub mod paths {
    pub const SETTINGS_DIR: &str = "config";
    pub const KEYWORDS: &str = "config/keywords.yaml";
    pub const OFFLINE_FLOW: &str = "config/offline_flow.json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floors_below_cap() {
        assert!(arbiter::SIMPLE_FLOOR_TURNS < arbiter::COMPLEX_FLOOR_TURNS);
        assert!(arbiter::COMPLEX_FLOOR_TURNS < arbiter::FINAL_TURN_LIMIT);
        assert!(arbiter::FINAL_TURN_LIMIT < arbiter::HARD_CAP_TURNS);
    }

    #[test]
    fn test_threshold_within_scale() {
        assert!(detector::EMERGENCY_THRESHOLD < detector::MAX_SCORE);
    }
}
