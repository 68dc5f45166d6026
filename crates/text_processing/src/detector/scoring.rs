//! Clamped score accumulation with an adjustment log

use once_cell::sync::Lazy;
use regex::Regex;

use crate::detector::context::PhraseSet;

pub(crate) const MAX_SCORE: u8 = 10;

static WEEKS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:weeks?|wks?|hafte|semanas?)").unwrap());

/// Weeks at or above which a duration counts as chronic
const CHRONIC_WEEKS: u32 = 4;

/// Running score; every operation clamps to `0..=MAX_SCORE`
#[derive(Debug, Clone, Default)]
pub(crate) struct ScoreState {
    score: u8,
    adjustments: Vec<String>,
}

impl ScoreState {
    pub fn new(base: u8) -> Self {
        Self {
            score: base.min(MAX_SCORE),
            adjustments: Vec::new(),
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn add(&mut self, delta: u8, reason: impl Into<String>) {
        let before = self.score;
        self.score = self.score.saturating_add(delta).min(MAX_SCORE);
        self.log(before, reason);
    }

    pub fn subtract(&mut self, delta: u8, reason: impl Into<String>) {
        let before = self.score;
        self.score = self.score.saturating_sub(delta);
        self.log(before, reason);
    }

    /// Raise to at least `floor`
    pub fn raise_to(&mut self, floor: u8, reason: impl Into<String>) {
        let before = self.score;
        self.score = self.score.max(floor.min(MAX_SCORE));
        self.log(before, reason);
    }

    /// Lower to at most `ceiling`
    pub fn cap_at(&mut self, ceiling: u8, reason: impl Into<String>) {
        let before = self.score;
        self.score = self.score.min(ceiling);
        self.log(before, reason);
    }

    pub fn force(&mut self, value: u8, reason: impl Into<String>) {
        let before = self.score;
        self.score = value.min(MAX_SCORE);
        self.log(before, reason);
    }

    fn log(&mut self, before: u8, reason: impl Into<String>) {
        self.adjustments
            .push(format!("{} ({} -> {})", reason.into(), before, self.score));
    }

    pub fn into_parts(self) -> (u8, Vec<String>) {
        (self.score, self.adjustments)
    }
}

/// A free-text duration describes a long-standing presentation
pub(crate) fn is_chronic_duration(duration: &str, markers: &PhraseSet) -> bool {
    if markers.contains_any(duration) {
        return true;
    }
    WEEKS_PATTERN
        .captures(duration)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|weeks| weeks >= CHRONIC_WEEKS)
        .unwrap_or(false)
}
