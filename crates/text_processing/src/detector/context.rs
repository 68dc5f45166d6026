//! Clause windows, negation and exclusion classification

use regex::Regex;

use triage_config::KeywordTable;
use triage_core::MatchDisposition;

/// Compile a literal phrase into a case-insensitive word-bounded pattern
pub(crate) fn phrase_regex(phrase: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))).ok()
}

/// A list of literal phrases compiled once
#[derive(Debug, Clone, Default)]
pub(crate) struct PhraseSet {
    entries: Vec<(String, Regex)>,
}

impl PhraseSet {
    pub fn compile<'a>(phrases: impl IntoIterator<Item = &'a String>) -> Self {
        let entries = phrases
            .into_iter()
            .filter(|p| !p.is_empty())
            .filter_map(|p| phrase_regex(p).map(|re| (p.clone(), re)))
            .collect();
        Self { entries }
    }

    /// First phrase (in table order) present in `text`
    pub fn first_in(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(p, _)| p.as_str())
    }

    pub fn contains_any(&self, text: &str) -> bool {
        self.first_in(text).is_some()
    }

    /// Every phrase present in `text`
    pub fn all_in<'s>(&'s self, text: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.entries
            .iter()
            .filter(move |(_, re)| re.is_match(text))
            .map(|(p, _)| p.as_str())
    }

    /// Byte offset just past the last occurrence of any phrase
    fn last_end_in(&self, text: &str) -> Option<usize> {
        self.entries
            .iter()
            .filter_map(|(_, re)| re.find_iter(text).last().map(|m| m.end()))
            .max()
    }

    /// Byte offset of the first occurrence of any phrase
    fn first_start_in(&self, text: &str) -> Option<usize> {
        self.entries
            .iter()
            .filter_map(|(_, re)| re.find(text).map(|m| m.start()))
            .min()
    }
}

fn is_clause_punct(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '(' | ')')
}

fn last_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    words[words.len().saturating_sub(n)..].join(" ")
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Negation and exclusion rules compiled from the keyword table
#[derive(Debug, Clone)]
pub(crate) struct ContextRules {
    pre_cues: PhraseSet,
    post_cues: PhraseSet,
    breakers: PhraseSet,
    exclusions: PhraseSet,
    pre_window: usize,
    post_window: usize,
}

impl ContextRules {
    pub fn new(table: &KeywordTable, pre_window: usize, post_window: usize) -> Self {
        Self {
            pre_cues: PhraseSet::compile(&table.negation.pre),
            post_cues: PhraseSet::compile(&table.negation.post),
            breakers: PhraseSet::compile(&table.negation.scope_breakers),
            exclusions: PhraseSet::compile(&table.exclusions),
            pre_window,
            post_window,
        }
    }

    /// Clause text preceding a match, cut at punctuation or a scope breaker
    fn clause_before<'s>(&self, segment: &'s str, start: usize) -> &'s str {
        let prefix = &segment[..start];
        let punct = prefix
            .rfind(is_clause_punct)
            .map(|i| i + 1)
            .unwrap_or(0);
        let breaker = self.breakers.last_end_in(prefix).unwrap_or(0);
        &prefix[punct.max(breaker)..]
    }

    /// Clause text following a match
    fn clause_after<'s>(&self, segment: &'s str, end: usize) -> &'s str {
        let suffix = &segment[end..];
        let punct = suffix.find(is_clause_punct).unwrap_or(suffix.len());
        let breaker = self.breakers.first_start_in(suffix).unwrap_or(suffix.len());
        &suffix[..punct.min(breaker)]
    }

    /// Classify the match at `start..end` of `segment`
    ///
    /// Exclusion takes precedence over negation; the returned cue names the
    /// responsible phrase.
    pub fn classify(
        &self,
        segment: &str,
        start: usize,
        end: usize,
    ) -> (MatchDisposition, Option<String>) {
        let before = self.clause_before(segment, start);

        if let Some(phrase) = self.exclusions.first_in(before) {
            return (MatchDisposition::Excluded, Some(phrase.to_string()));
        }

        let window = last_words(before, self.pre_window);
        if let Some(cue) = self.pre_cues.first_in(&window) {
            return (MatchDisposition::Negated, Some(cue.to_string()));
        }

        let after = first_words(self.clause_after(segment, end), self.post_window);
        if let Some(cue) = self.post_cues.first_in(&after) {
            return (MatchDisposition::Negated, Some(cue.to_string()));
        }

        (MatchDisposition::Active, None)
    }

    /// Whether `pattern` occurs in `text` in at least one non-negated,
    /// non-excluded position
    pub fn affirmed(&self, pattern: &Regex, text: &str) -> bool {
        pattern
            .find_iter(text)
            .any(|m| self.classify(text, m.start(), m.end()).0 == MatchDisposition::Active)
    }

    /// Whether `pattern` occurs in `text` and every occurrence is negated
    pub fn negated(&self, pattern: &Regex, text: &str) -> bool {
        let mut seen = false;
        for m in pattern.find_iter(text) {
            seen = true;
            if self.classify(text, m.start(), m.end()).0 != MatchDisposition::Negated {
                return false;
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ContextRules {
        let table = KeywordTable::builtin().unwrap();
        ContextRules::new(&table, 4, 3)
    }

    fn classify(rules: &ContextRules, text: &str, term: &str) -> MatchDisposition {
        let start = text.find(term).unwrap();
        rules.classify(text, start, start + term.len()).0
    }

    #[test]
    fn test_pre_negation_window() {
        let rules = rules();
        assert_eq!(classify(&rules, "i have no chest pain", "chest pain"), MatchDisposition::Negated);
        assert_eq!(
            classify(&rules, "i don't have any chest pain", "chest pain"),
            MatchDisposition::Negated
        );
        assert_eq!(classify(&rules, "i have chest pain", "chest pain"), MatchDisposition::Active);
    }

    #[test]
    fn test_window_is_bounded() {
        let rules = rules();
        let text = "no fever at all over the last week and now chest pain";
        assert_eq!(classify(&rules, text, "chest pain"), MatchDisposition::Active);
    }

    #[test]
    fn test_scope_breaker_ends_negation() {
        let rules = rules();
        assert_eq!(
            classify(&rules, "no fever but chest pain", "chest pain"),
            MatchDisposition::Active
        );
        assert_eq!(
            classify(&rules, "no fever, chest pain since morning", "chest pain"),
            MatchDisposition::Active
        );
    }

    #[test]
    fn test_post_negation() {
        let rules = rules();
        assert_eq!(
            classify(&rules, "seene mein dard nahi hai", "seene mein dard"),
            MatchDisposition::Negated
        );
        assert_eq!(
            classify(&rules, "the chest pain went away", "chest pain"),
            MatchDisposition::Negated
        );
    }

    #[test]
    fn test_exclusion_beats_negation() {
        let rules = rules();
        let text = "family history of heart attack";
        assert_eq!(classify(&rules, text, "heart attack"), MatchDisposition::Excluded);
        let (_, cue) = rules.classify(text, 18, 30);
        assert_eq!(cue.as_deref(), Some("family history of"));
    }

    #[test]
    fn test_negated_requires_presence() {
        let rules = rules();
        let re = phrase_regex("chest pain").unwrap();
        assert!(rules.negated(&re, "no chest pain"));
        assert!(!rules.negated(&re, "no fever"));
        assert!(!rules.negated(&re, "chest pain"));
        assert!(rules.affirmed(&re, "bad chest pain"));
    }
}
