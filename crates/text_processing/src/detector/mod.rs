//! Emergency/Crisis Detector
//!
//! Scores free text for emergency risk on a 0-10 scale using the versioned
//! keyword table:
//!
//! 1. Split into sentence segments (degenerate segments are traced, not scored)
//! 2. Match keywords per segment and classify each match as active, negated,
//!    excluded (familial/hypothetical framing) or session-suppressed
//! 3. Drop matches contained in a longer active match
//! 4. Take the maximum active score and apply context adjustments
//! 5. Apply the authority override for explicitly resolved red flags
//!
//! The detector is a stateless value built from an explicit table, so
//! several locales or table versions can be used side by side.

mod context;
mod scoring;

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use triage_config::{DetectorConfig, KeywordEntry, KeywordTable};
use triage_core::{
    BodySystem, ClinicalProfile, DetectionTrace, EmergencyDetectionResult, MatchDisposition,
    SegmentTrace, TermEvidence,
};

use context::{phrase_regex, ContextRules, PhraseSet};
use scoring::{is_chronic_duration, ScoreState, MAX_SCORE};

const POST_NEGATION_WINDOW: usize = 3;
const VIRAL_DAMPENING: u8 = 2;
const CHRONIC_BOOST: u8 = 1;
const CARDIO_RESPIRATORY_BOOST: u8 = 3;

/// Per-call inputs that shape scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionOptions<'a> {
    /// Current clinical profile, for chronic duration and authority override
    pub profile: Option<&'a ClinicalProfile>,
    /// The question being answered is the dedicated red-flag question
    pub is_red_flag_question: bool,
    /// Keywords the patient denied during verification earlier in the session
    pub suppressed_keywords: &'a [String],
}

impl<'a> DetectionOptions<'a> {
    pub fn with_profile(mut self, profile: &'a ClinicalProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn red_flag_question(mut self, value: bool) -> Self {
        self.is_red_flag_question = value;
        self
    }

    pub fn suppressing(mut self, keywords: &'a [String]) -> Self {
        self.suppressed_keywords = keywords;
        self
    }

    fn is_suppressed(&self, term: &str) -> bool {
        self.suppressed_keywords
            .iter()
            .any(|k| k.trim().eq_ignore_ascii_case(term))
    }
}

#[derive(Debug, Clone)]
struct CompiledKeyword {
    entry: KeywordEntry,
    pattern: Regex,
}

#[derive(Debug, Clone)]
struct CompiledCombination {
    symptoms: Vec<Vec<(String, Regex)>>,
    severity: u8,
    reason: String,
}

/// Match with its position, before conversion into trace evidence
#[derive(Debug, Clone)]
struct RawMatch {
    keyword: usize,
    segment: usize,
    start: usize,
    end: usize,
    disposition: MatchDisposition,
    cue: Option<String>,
}

/// Keyword-table driven emergency detector
#[derive(Debug, Clone)]
pub struct EmergencyDetector {
    table: Arc<KeywordTable>,
    keywords: Vec<CompiledKeyword>,
    rules: ContextRules,
    danger: Vec<(String, Regex, u8)>,
    viral: PhraseSet,
    chronic: PhraseSet,
    denial_prefixes: Vec<String>,
    combinations: Vec<CompiledCombination>,
    threshold: u8,
}

impl EmergencyDetector {
    /// Detector with default window and threshold
    pub fn new(table: Arc<KeywordTable>) -> Self {
        Self::with_config(table, &DetectorConfig::default())
    }

    pub fn with_config(table: Arc<KeywordTable>, config: &DetectorConfig) -> Self {
        let keywords: Vec<CompiledKeyword> = table
            .keywords
            .iter()
            .filter_map(|entry| {
                phrase_regex(&entry.term).map(|pattern| CompiledKeyword {
                    entry: entry.clone(),
                    pattern,
                })
            })
            .collect();

        let danger = table
            .danger_indicators
            .iter()
            .filter_map(|d| phrase_regex(&d.term).map(|re| (d.term.clone(), re, d.boost)))
            .collect();

        let combinations = table
            .combinations
            .iter()
            .map(|combo| CompiledCombination {
                symptoms: combo
                    .symptoms
                    .iter()
                    .map(|alts| {
                        alts.iter()
                            .filter_map(|a| phrase_regex(a).map(|re| (a.clone(), re)))
                            .collect()
                    })
                    .collect(),
                severity: combo.severity,
                reason: combo.reason.clone(),
            })
            .collect();

        tracing::debug!(
            version = %table.version,
            keywords = keywords.len(),
            "Emergency detector compiled"
        );

        Self {
            rules: ContextRules::new(&table, config.negation_window_words, POST_NEGATION_WINDOW),
            viral: PhraseSet::compile(&table.viral_indicators),
            chronic: PhraseSet::compile(&table.chronic_markers),
            denial_prefixes: table.denial_prefixes.clone(),
            keywords,
            danger,
            combinations,
            threshold: config.emergency_threshold,
            table,
        }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Score `text` for emergency risk
    ///
    /// Never fails; empty or unmatched input yields a zero score.
    pub fn evaluate(&self, text: &str, options: &DetectionOptions<'_>) -> EmergencyDetectionResult {
        let unified = unify_apostrophes(text);
        let mut trace = DetectionTrace::default();
        let mut segments: Vec<(usize, String)> = Vec::new();

        // Segment before lowercasing; sentence starts rely on capitalization
        for raw in unified.split_sentence_bounds() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let index = trace.segments.len();
            let rejected = !trimmed.chars().any(char::is_alphanumeric);
            trace.segments.push(SegmentTrace {
                index,
                text: trimmed.to_string(),
                rejected,
            });
            if !rejected {
                segments.push((index, trimmed.to_lowercase()));
            }
        }

        let matches = self.scan(&segments, options);
        for m in &matches {
            let entry = &self.keywords[m.keyword].entry;
            tracing::debug!(
                segment = m.segment,
                term = %entry.term,
                disposition = ?m.disposition,
                cue = ?m.cue,
                "Keyword match"
            );
            trace.evidence.push(TermEvidence {
                term: entry.term.clone(),
                system: entry.system,
                score: entry.score,
                segment: m.segment,
                disposition: m.disposition,
                cue: m.cue.clone(),
            });
        }

        let active: Vec<&KeywordEntry> = matches
            .iter()
            .filter(|m| m.disposition == MatchDisposition::Active)
            .map(|m| &self.keywords[m.keyword].entry)
            .collect();

        let mut matched_keywords: Vec<String> = Vec::new();
        let mut systems: BTreeSet<BodySystem> = BTreeSet::new();
        for entry in &active {
            if !matched_keywords.contains(&entry.term) {
                matched_keywords.push(entry.term.clone());
            }
            systems.insert(entry.system);
        }

        let base = active.iter().map(|e| e.score).max().unwrap_or(0);
        let absolute = active.iter().any(|e| e.is_absolute());
        trace.base_score = base;
        trace.absolute_present = absolute;

        let mut state = ScoreState::new(base);
        let mut combination_reason = None;

        if absolute {
            state.force(MAX_SCORE, "absolute emergency keyword");
        } else {
            self.apply_danger(&mut state, &segments, &matches);
            self.apply_viral(&mut state, &segments, options);
            self.apply_chronic(&mut state, options);
            apply_system_overlap(&mut state, &systems);
            combination_reason =
                self.apply_combinations(&mut state, &segments, options, &mut matched_keywords);
        }

        let authority = !absolute && self.authority_override(&matched_keywords, options);
        if authority {
            state.cap_at(self.threshold, "red flags explicitly resolved");
            trace.authority_override = true;
        }

        let (score, adjustments) = state.into_parts();
        trace.adjustments = adjustments;

        let is_emergency = !authority && score > self.threshold;
        let medical_justification = justification(
            score,
            &matched_keywords,
            &systems,
            absolute,
            combination_reason.as_deref(),
            authority,
        );

        if is_emergency {
            tracing::info!(
                score,
                keywords = ?matched_keywords,
                systems = ?systems,
                "Emergency indicators detected"
            );
        }

        EmergencyDetectionResult {
            is_emergency,
            score,
            matched_keywords,
            affected_systems: systems,
            medical_justification,
            debug: trace,
        }
    }

    /// Find and classify all keyword matches across segments
    fn scan(&self, segments: &[(usize, String)], options: &DetectionOptions<'_>) -> Vec<RawMatch> {
        let mut matches = Vec::new();

        for (index, segment) in segments {
            let mut in_segment: Vec<RawMatch> = Vec::new();
            for (k, keyword) in self.keywords.iter().enumerate() {
                for m in keyword.pattern.find_iter(segment) {
                    let (mut disposition, cue) = self.rules.classify(segment, m.start(), m.end());
                    if disposition == MatchDisposition::Active
                        && options.is_suppressed(&keyword.entry.term)
                    {
                        tracing::warn!(term = %keyword.entry.term, "Suppressed keyword matched");
                        disposition = MatchDisposition::Suppressed;
                    }
                    in_segment.push(RawMatch {
                        keyword: k,
                        segment: *index,
                        start: m.start(),
                        end: m.end(),
                        disposition,
                        cue,
                    });
                }
            }
            mark_overlaps(&mut in_segment);
            in_segment.sort_by_key(|m| (m.start, std::cmp::Reverse(m.end)));
            matches.extend(in_segment);
        }

        matches
    }

    /// Danger words in segments that carry at least one active match
    fn apply_danger(&self, state: &mut ScoreState, segments: &[(usize, String)], matches: &[RawMatch]) {
        if state.score() == 0 {
            return;
        }
        let mut applied: Vec<&str> = Vec::new();
        for (index, segment) in segments {
            let live = matches
                .iter()
                .any(|m| m.segment == *index && m.disposition == MatchDisposition::Active);
            if !live {
                continue;
            }
            for (term, pattern, boost) in &self.danger {
                if !applied.contains(&term.as_str()) && pattern.is_match(segment) {
                    applied.push(term);
                    state.add(*boost, format!("danger indicator '{}'", term));
                }
            }
        }
    }

    fn apply_viral(
        &self,
        state: &mut ScoreState,
        segments: &[(usize, String)],
        options: &DetectionOptions<'_>,
    ) {
        if state.score() == 0 || state.score() > self.threshold || options.is_red_flag_question {
            return;
        }
        let indicator = segments.iter().find_map(|(_, s)| self.viral.first_in(s));
        if let Some(term) = indicator {
            state.subtract(VIRAL_DAMPENING, format!("viral context '{}'", term));
        }
    }

    fn apply_chronic(&self, state: &mut ScoreState, options: &DetectionOptions<'_>) {
        if state.score() == 0 || state.score() > self.threshold {
            return;
        }
        let duration = options
            .profile
            .and_then(|p| p.duration.as_deref())
            .map(str::to_lowercase);
        if let Some(duration) = duration {
            if is_chronic_duration(&duration, &self.chronic) {
                state.add(CHRONIC_BOOST, format!("chronic duration '{}'", duration));
            }
        }
    }

    /// First combination whose every symptom is affirmed somewhere in the text
    ///
    /// Session-suppressed labels never count towards a combination.
    fn apply_combinations(
        &self,
        state: &mut ScoreState,
        segments: &[(usize, String)],
        options: &DetectionOptions<'_>,
        matched_keywords: &mut Vec<String>,
    ) -> Option<String> {
        for combo in &self.combinations {
            let found: Option<Vec<&str>> = combo
                .symptoms
                .iter()
                .map(|alternatives| {
                    alternatives.iter().find_map(|(label, pattern)| {
                        if options.is_suppressed(label) {
                            return None;
                        }
                        segments
                            .iter()
                            .any(|(_, s)| self.rules.affirmed(pattern, s))
                            .then_some(label.as_str())
                    })
                })
                .collect();

            if let Some(labels) = found {
                state.raise_to(combo.severity, format!("combination: {}", combo.reason));
                for label in labels {
                    if !matched_keywords.iter().any(|k| k == label) {
                        matched_keywords.push(label.to_string());
                    }
                }
                return Some(combo.reason.clone());
            }
        }
        None
    }

    /// Explicitly resolved red flags override non-absolute matches
    fn authority_override(&self, matched: &[String], options: &DetectionOptions<'_>) -> bool {
        let Some(profile) = options.profile else {
            return false;
        };
        if !profile.red_flags_explicitly_resolved() {
            return false;
        }
        let Some(denials) = profile.red_flag_denials.as_deref() else {
            return false;
        };
        let denials = normalize(denials);
        let denials = denials.trim();

        if self.starts_with_denial_prefix(denials) {
            return true;
        }

        !matched.is_empty()
            && matched.iter().all(|term| {
                phrase_regex(term)
                    .map(|re| self.rules.negated(&re, denials))
                    .unwrap_or(false)
            })
    }

    fn starts_with_denial_prefix(&self, text: &str) -> bool {
        self.denial_prefixes.iter().any(|prefix| {
            text.strip_prefix(prefix.as_str())
                .map(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
                .unwrap_or(false)
        })
    }
}

/// Mark active matches fully contained in a longer active match
fn mark_overlaps(matches: &mut [RawMatch]) {
    let spans: Vec<(usize, usize)> = matches
        .iter()
        .filter(|m| m.disposition == MatchDisposition::Active)
        .map(|m| (m.start, m.end))
        .collect();

    for m in matches.iter_mut() {
        if m.disposition != MatchDisposition::Active {
            continue;
        }
        let contained = spans.iter().any(|&(start, end)| {
            start <= m.start && m.end <= end && (end - start) > (m.end - m.start)
        });
        if contained {
            m.disposition = MatchDisposition::Overlapped;
        }
    }
}

fn apply_system_overlap(state: &mut ScoreState, systems: &BTreeSet<BodySystem>) {
    if state.score() == 0 {
        return;
    }
    if systems.contains(&BodySystem::Cardiac) && systems.contains(&BodySystem::Respiratory) {
        state.add(CARDIO_RESPIRATORY_BOOST, "cardiac and respiratory involvement");
    }
    if systems.contains(&BodySystem::Neurological) && systems.contains(&BodySystem::Trauma) {
        state.force(MAX_SCORE, "neurological and trauma involvement");
    }
}

fn unify_apostrophes(text: &str) -> String {
    text.replace(|c: char| matches!(c, '\u{2019}' | '\u{2018}' | '`'), "'")
}

/// Lowercase and unify apostrophes so table phrases match
fn normalize(text: &str) -> String {
    unify_apostrophes(text).to_lowercase()
}

fn justification(
    score: u8,
    keywords: &[String],
    systems: &BTreeSet<BodySystem>,
    absolute: bool,
    combination: Option<&str>,
    authority: bool,
) -> String {
    if keywords.is_empty() && score == 0 {
        return "No emergency indicators detected".to_string();
    }

    let mut parts = Vec::new();
    if !systems.is_empty() {
        let names: Vec<&str> = systems.iter().map(|s| s.display_name()).collect();
        parts.push(format!("{} involvement", names.join(", ")));
    }
    if !keywords.is_empty() {
        parts.push(format!("reported: {}", keywords.join(", ")));
    }
    if absolute {
        parts.push("absolute emergency keyword present".to_string());
    }
    if let Some(reason) = combination {
        parts.push(reason.to_string());
    }
    if authority {
        parts.push("red flags explicitly denied by patient".to_string());
    }
    format!("{} (score {}/10)", parts.join("; "), score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> EmergencyDetector {
        EmergencyDetector::new(Arc::new(KeywordTable::builtin().unwrap()))
    }

    fn evaluate(text: &str) -> EmergencyDetectionResult {
        detector().evaluate(text, &DetectionOptions::default())
    }

    #[test]
    fn test_chest_pain_and_breathing_is_maximal() {
        let result = evaluate("I have severe chest pain and difficulty breathing");
        assert!(result.is_emergency);
        assert_eq!(result.score, 10);
        assert!(result.has_system(BodySystem::Cardiac));
        assert!(result.has_system(BodySystem::Respiratory));
        assert_eq!(result.debug.base_score, 8);
    }

    #[test]
    fn test_negation_removes_keyword() {
        let negated = evaluate("No chest pain");
        assert_eq!(negated.score, 0);
        assert!(!negated.is_emergency);
        assert!(negated.matched_keywords.is_empty());
        assert_eq!(
            negated.debug.with_disposition(MatchDisposition::Negated).count(),
            1
        );

        let affirmed = evaluate("chest pain");
        assert_eq!(affirmed.score, 8);
        assert!(affirmed.is_emergency);
        assert_eq!(affirmed.matched_keywords, vec!["chest pain"]);
    }

    #[test]
    fn test_absolute_keyword_wins() {
        let result = evaluate("He is not breathing, just a runny nose before");
        assert!(result.is_emergency);
        assert_eq!(result.score, 10);
        assert!(result.debug.absolute_present);
    }

    #[test]
    fn test_crisis_language() {
        let result = evaluate("I want to kill myself");
        assert!(result.is_emergency);
        assert!(result.has_system(BodySystem::Other));

        let spanish = evaluate("quiero morir");
        assert!(spanish.is_emergency);
    }

    #[test]
    fn test_familial_context_excluded() {
        let result = evaluate("My father had a heart attack last year");
        assert_eq!(result.score, 0);
        let result = evaluate("family history of stroke");
        assert!(!result.is_emergency);
        assert_eq!(result.debug.with_disposition(MatchDisposition::Excluded).count(), 1);
    }

    #[test]
    fn test_overlap_keeps_longer_match() {
        let result = evaluate("crushing chest pain");
        assert_eq!(result.matched_keywords, vec!["crushing chest pain"]);
        assert_eq!(result.debug.with_disposition(MatchDisposition::Overlapped).count(), 1);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn test_viral_dampening() {
        let result = evaluate("I have wheezing and a runny nose");
        assert_eq!(result.debug.base_score, 5);
        assert_eq!(result.score, 3);

        let detector = detector();
        let options = DetectionOptions::default().red_flag_question(true);
        let result = detector.evaluate("I have wheezing and a runny nose", &options);
        assert_eq!(result.score, 5);
    }

    #[test]
    fn test_chronic_boost() {
        let detector = detector();
        let mut profile = ClinicalProfile::new();
        profile.duration = Some("for 3 months".into());
        let options = DetectionOptions::default().with_profile(&profile);
        let result = detector.evaluate("palpitations", &options);
        assert_eq!(result.score, 6);
    }

    #[test]
    fn test_neuro_trauma_forced_max() {
        let result = evaluate("I hit my head and now have numbness");
        assert_eq!(result.score, 10);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_combination_floor() {
        let result = evaluate("I have a fever and a stiff neck");
        assert!(result.score >= 9);
        assert!(result.is_emergency);
        assert!(result.medical_justification.contains("meningitis"));
        assert!(result.matched_keywords.contains(&"fever".to_string()));
    }

    #[test]
    fn test_combination_ignores_negated_symptom() {
        let result = evaluate("I have a fever. No stiff neck.");
        assert!(result.score < 9);
        assert!(!result.is_emergency);
    }

    #[test]
    fn test_combination_respects_suppressed_labels() {
        let detector = detector();
        let first = detector.evaluate("I have a fever and a stiff neck", &DetectionOptions::default());
        assert!(first.is_emergency);

        let denied = first.matched_keywords.clone();
        let options = DetectionOptions::default().suppressing(&denied);
        let again = detector.evaluate("the fever and stiff neck are still there", &options);
        assert!(!again.is_emergency);
        assert!(again.score < 9);
        assert!(!again.matched_keywords.contains(&"fever".to_string()));

        // One denied symptom is enough to break the combination
        let only_fever = vec!["fever".to_string()];
        let options = DetectionOptions::default().suppressing(&only_fever);
        let partial = detector.evaluate("fever and stiff neck", &options);
        assert!(partial.score < 9);
    }

    #[test]
    fn test_suppressed_keyword() {
        let detector = detector();
        let suppressed = vec!["chest pain".to_string()];
        let options = DetectionOptions::default().suppressing(&suppressed);
        let result = detector.evaluate("the chest pain again", &options);
        assert_eq!(result.score, 0);
        assert_eq!(result.debug.with_disposition(MatchDisposition::Suppressed).count(), 1);
    }

    #[test]
    fn test_authority_override_caps_score() {
        let detector = detector();
        let mut profile = ClinicalProfile::new();
        profile.red_flags_resolved = Some(true);
        profile.red_flag_denials = Some("no chest pain".into());
        let options = DetectionOptions::default().with_profile(&profile);

        let result = detector.evaluate("I had some chest pain earlier", &options);
        assert!(!result.is_emergency);
        assert!(result.score <= 7);
        assert!(result.debug.authority_override);
    }

    #[test]
    fn test_authority_override_by_individual_negation() {
        let detector = detector();
        let mut profile = ClinicalProfile::new();
        profile.red_flags_resolved = Some(true);
        profile.red_flag_denials = Some("patient denies chest pain".into());
        let options = DetectionOptions::default().with_profile(&profile);

        let result = detector.evaluate("chest pain", &options);
        assert!(result.debug.authority_override);
        assert!(!result.is_emergency);

        let result = detector.evaluate("chest pain and shortness of breath", &options);
        assert!(!result.debug.authority_override);
        assert!(result.is_emergency);
    }

    #[test]
    fn test_authority_never_beats_absolute() {
        let detector = detector();
        let mut profile = ClinicalProfile::new();
        profile.red_flags_resolved = Some(true);
        profile.red_flag_denials = Some("none".into());
        let options = DetectionOptions::default().with_profile(&profile);

        let result = detector.evaluate("she is unconscious", &options);
        assert!(result.is_emergency);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn test_unresolved_flags_do_not_override() {
        let detector = detector();
        let mut profile = ClinicalProfile::new();
        profile.red_flag_denials = Some("no chest pain".into());
        let options = DetectionOptions::default().with_profile(&profile);
        assert!(detector.evaluate("chest pain", &options).is_emergency);
    }

    #[test]
    fn test_degenerate_segments_traced() {
        let result = evaluate("... !!! Chest pain.");
        assert!(result.debug.segments.iter().any(|s| s.rejected));
        assert_eq!(result.score, 8);
    }

    #[test]
    fn test_empty_input() {
        let result = evaluate("");
        assert_eq!(result.score, 0);
        assert!(!result.is_emergency);
        assert!(result.debug.segments.is_empty());
        assert_eq!(result.medical_justification, "No emergency indicators detected");
    }

    #[test]
    fn test_multilingual_matches() {
        assert!(evaluate("mujhe seene mein dard ho raha hai").is_emergency);
        assert!(!evaluate("seene mein dard nahi hai").is_emergency);
        assert!(evaluate("tengo dolor de pecho").is_emergency);
        assert!(!evaluate("sin dolor de pecho").is_emergency);
    }

    #[test]
    fn test_score_always_clamped() {
        let result = evaluate(
            "sudden severe worst crushing radiating chest pain, shortness of breath, \
             seizure and a car accident, getting worse rapidly",
        );
        assert!(result.score <= 10);
    }
}
