//! Versioned emergency keyword table
//!
//! All detector vocabulary lives in `config/keywords.yaml`: scored keywords
//! per body system, negation cues, exclusion phrases, context modifiers,
//! authority-denial prefixes and the symptom combination table. The table
//! is immutable once loaded and shared across sessions behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use triage_core::BodySystem;

use crate::constants::detector::MAX_SCORE;
use crate::ConfigError;

const BUILTIN_KEYWORDS: &str = include_str!("../../../config/keywords.yaml");

/// One scored emergency term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub term: String,
    /// 1 - 10; 10 marks an absolute emergency
    pub score: u8,
    pub system: BodySystem,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl KeywordEntry {
    pub fn is_absolute(&self) -> bool {
        self.score >= MAX_SCORE
    }
}

/// Denial cue vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegationRules {
    /// Cues that precede the negated term ("no", "sin", "bina")
    #[serde(default)]
    pub pre: Vec<String>,
    /// Cues that follow the negated term ("nahi", "went away")
    #[serde(default)]
    pub post: Vec<String>,
    /// Words that end a negation scope ("but", "pero", "lekin")
    #[serde(default)]
    pub scope_breakers: Vec<String>,
}

/// Context word that raises a non-zero score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerIndicator {
    pub term: String,
    #[serde(default = "default_boost")]
    pub boost: u8,
}

fn default_boost() -> u8 {
    1
}

/// Symptom co-occurrence with a fixed severity floor
///
/// Each inner list holds interchangeable phrasings of one symptom; the
/// combination fires when every symptom is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub symptoms: Vec<Vec<String>>,
    pub severity: u8,
    pub reason: String,
}

/// Complete detector vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,

    #[serde(default)]
    pub negation: NegationRules,

    /// Familial, hypothetical or preventive framing
    #[serde(default)]
    pub exclusions: Vec<String>,

    #[serde(default)]
    pub danger_indicators: Vec<DangerIndicator>,

    /// Self-limiting upper respiratory context
    #[serde(default)]
    pub viral_indicators: Vec<String>,

    /// Long-standing presentation markers
    #[serde(default)]
    pub chronic_markers: Vec<String>,

    /// Answer prefixes that mark an explicit red-flag denial
    #[serde(default)]
    pub denial_prefixes: Vec<String>,

    /// Pregnancy and postpartum vocabulary
    #[serde(default)]
    pub maternal_keywords: Vec<String>,

    /// Fever vocabulary used to route fever-specific policy
    #[serde(default)]
    pub fever_terms: Vec<String>,

    /// Evaluated in order, first match wins
    #[serde(default)]
    pub combinations: Vec<Combination>,
}

impl KeywordTable {
    /// Load and validate a keyword table from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// The table embedded at compile time
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_KEYWORDS)
    }

    /// Load from `path` when given, falling back to the embedded table
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if Path::new(p).exists() => Self::load(p),
            _ => Self::builtin(),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let table: KeywordTable =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let table = table.normalized();
        table.validate()?;

        tracing::debug!(
            version = %table.version,
            keywords = table.keywords.len(),
            combinations = table.combinations.len(),
            "Loaded keyword table"
        );
        Ok(table)
    }

    /// Reject entries the detector cannot score
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::MissingField("keywords".to_string()));
        }
        for entry in &self.keywords {
            if entry.term.is_empty() {
                return Err(ConfigError::invalid("keywords.term", "empty term"));
            }
            if entry.score == 0 || entry.score > MAX_SCORE {
                return Err(ConfigError::invalid(
                    format!("keywords[{}].score", entry.term),
                    format!("{} is outside 1..={}", entry.score, MAX_SCORE),
                ));
            }
        }
        for indicator in &self.danger_indicators {
            if indicator.boost == 0 || indicator.boost > MAX_SCORE {
                return Err(ConfigError::invalid(
                    format!("danger_indicators[{}].boost", indicator.term),
                    "boost outside 1..=10",
                ));
            }
        }
        for combo in &self.combinations {
            if combo.symptoms.is_empty() || combo.symptoms.iter().any(|alts| alts.is_empty()) {
                return Err(ConfigError::invalid(
                    "combinations.symptoms",
                    format!("combination '{}' has an empty symptom", combo.reason),
                ));
            }
            if combo.severity == 0 || combo.severity > MAX_SCORE {
                return Err(ConfigError::invalid(
                    "combinations.severity",
                    format!("{} is outside 1..={}", combo.severity, MAX_SCORE),
                ));
            }
        }
        Ok(())
    }

    /// Keywords that force the maximum score
    pub fn absolute_terms(&self) -> impl Iterator<Item = &KeywordEntry> {
        self.keywords.iter().filter(|k| k.is_absolute())
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.keywords.iter().map(|k| k.language.as_str()).collect();
        langs.sort_unstable();
        langs.dedup();
        langs
    }

    /// Lowercase and trim every phrase so matching can work on lowercased input
    fn normalized(mut self) -> Self {
        fn norm(list: &mut [String]) {
            for s in list.iter_mut() {
                *s = s.trim().to_lowercase();
            }
        }

        for entry in &mut self.keywords {
            entry.term = entry.term.trim().to_lowercase();
        }
        norm(&mut self.negation.pre);
        norm(&mut self.negation.post);
        norm(&mut self.negation.scope_breakers);
        norm(&mut self.exclusions);
        for indicator in &mut self.danger_indicators {
            indicator.term = indicator.term.trim().to_lowercase();
        }
        norm(&mut self.viral_indicators);
        norm(&mut self.chronic_markers);
        norm(&mut self.denial_prefixes);
        norm(&mut self.maternal_keywords);
        norm(&mut self.fever_terms);
        for combo in &mut self.combinations {
            for alts in &mut combo.symptoms {
                norm(alts);
            }
        }
        self
    }
}
