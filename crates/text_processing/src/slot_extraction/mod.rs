//! Clinical slot extraction
//!
//! Rule-based extraction of age, duration, severity and temperature from
//! patient utterances in English, Hinglish and Spanish. Static patterns are
//! compiled once at program start using `once_cell::sync::Lazy`.
//!
//! The `regex` crate has no look-around, so "not followed by" constraints
//! (a duration immediately followed by "old" is an age) are checked on the
//! text after each match.

use once_cell::sync::Lazy;
use regex::Regex;

use triage_core::ClinicalSlots;

// =============================================================================
// STATIC REGEX PATTERNS
// =============================================================================

const NUM: &str = r"(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)";
const UNIT: &str = r"(minutes?|mins?|hours?|hrs?|days?|weeks?|wks?|months?|years?|yrs?|din|ghante|ghanta|hafte|hafta|mahine|mahina|saal|minutos?|horas?|d[ií]as?|semanas?|meses|mes|años?)";

// Age in years
static AGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| vec![
    Regex::new(r"\b(\d{1,3})\s*-?\s*(?:years?|yrs?|yr)[\s-]*old\b").unwrap(),
    Regex::new(r"\b(\d{1,3})\s*(?:y/o|y\.o|yo)\b").unwrap(),
    Regex::new(r"\bage(?:d|\s+is|:)?\s*(\d{1,3})\b").unwrap(),
    Regex::new(r"\b(\d{1,3})\s*(?:saal|sal|varsh)\s*(?:ka|ki|ke)\b").unwrap(),
    Regex::new(r"\bumar\s*(?:hai|is)?\s*(\d{1,3})\b").unwrap(),
    Regex::new(r"\btengo\s+(\d{1,3})\s+años\b").unwrap(),
    Regex::new(r"\b(\d{1,3})\s+años\s+de\s+edad\b").unwrap(),
]);

// Infants: "<n> months old" / "<n> weeks old" are under one year
static INFANT_AGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-?\s*(?:months?|mahine|meses|weeks?)[\s-]*(?:old|ka|ki|de edad)\b").unwrap()
});

// "I am 45" / "I'm 45"; trailing-unit check applied separately
static SELF_AGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:i am|i'm|im)\s+(\d{1,3})\b").unwrap());

static STARTED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:started|began|start(?:ed)? on|shuru hua|empez[oó])\s+([^.,;!?]+)").unwrap()
});

static SINCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:since|desde)\s+([^.,;!?]+)").unwrap());

static FOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bfor\s+(?:the\s+(?:last|past)\s+)?{}\s+{}\b",
        NUM, UNIT
    ))
    .unwrap()
});

static BARE_DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{}\s+{}\b", NUM, UNIT)).unwrap());

static NUMERIC_SEVERITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| vec![
    Regex::new(r"\b(\d{1,2})\s*(?:/|out of|of|de)\s*10\b").unwrap(),
    Regex::new(r"\b10\s*(?:mein se|me se|main se)\s*(\d{1,2})\b").unwrap(),
]);

static QUALITATIVE_SEVERITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(mild|slight|moderate|severe|excruciating|unbearable|halka|halki|leve|moderad[oa]|sever[oa]|fuerte|insoportable|asahniya)\b").unwrap()
});

static EXPLICIT_TEMPERATURE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:temperature|temp|fever|bukhar|bukhaar|fiebre|tapman)\s*(?:is|was|of|at|reading|de|hai|tha|:|=)?\s*(?:about|around|almost|of)?\s*(\d{2,3}(?:\.\d{1,2})?)").unwrap()
});

static BARE_TEMPERATURE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2,3}(?:\.\d{1,2})?)").unwrap());

// Anchored at the text following a temperature value
static TEMPERATURE_UNIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(°|º|degrees?\b|deg\b)?\s*(celsius|centigrade|fahrenheit|c\b|f\b)?").unwrap()
});

/// Fahrenheit range accepted for explicit readings
const FAHRENHEIT_RANGE: std::ops::RangeInclusive<f64> = 93.0..=110.0;
/// Celsius range accepted for explicit readings
const CELSIUS_RANGE: std::ops::RangeInclusive<f64> = 34.0..=43.0;
/// Plausible fever range for values without a temperature word
const BARE_CELSIUS_RANGE: std::ops::RangeInclusive<f64> = 36.0..=42.0;

const MAX_AGE: u32 = 120;

// =============================================================================
// EXTRACTOR
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// Stateless per-utterance clinical slot extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicalSlotExtractor;

impl ClinicalSlotExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every slot present in `utterance`
    pub fn extract(&self, utterance: &str) -> ClinicalSlots {
        let text = utterance.to_lowercase().replace('\u{2019}', "'");
        ClinicalSlots {
            age: self.extract_age(&text),
            duration: self.extract_duration(&text),
            severity: self.extract_severity(&text),
            temperature: self.extract_temperature(&text),
        }
    }

    /// Age in whole years
    pub fn extract_age(&self, text: &str) -> Option<u32> {
        if INFANT_AGE_PATTERN.is_match(text) {
            return Some(0);
        }

        for pattern in AGE_PATTERNS.iter() {
            if let Some(age) = pattern
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|age| *age <= MAX_AGE)
            {
                return Some(age);
            }
        }

        for caps in SELF_AGE_PATTERN.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            if starts_with_measure(&text[m.end()..]) {
                continue;
            }
            if let Some(age) = m.as_str().parse::<u32>().ok().filter(|a| *a <= MAX_AGE) {
                return Some(age);
            }
        }

        None
    }

    /// Normalized duration phrase
    pub fn extract_duration(&self, text: &str) -> Option<String> {
        if let Some(phrase) = STARTED_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| leading_words(m.as_str(), 4))
            .filter(|p| !p.is_empty())
        {
            return Some(normalize_duration_phrase(&phrase));
        }

        if let Some(anchor) = SINCE_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| leading_words(m.as_str(), 3))
            .filter(|p| !p.is_empty())
        {
            return Some(format!("since {}", anchor));
        }

        if let Some(caps) = FOR_PATTERN.captures(text) {
            if let (Some(n), Some(u)) = (caps.get(1), caps.get(2)) {
                return quantity(n.as_str(), u.as_str());
            }
        }

        for caps in BARE_DURATION_PATTERN.captures_iter(text) {
            let (Some(whole), Some(n), Some(u)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            if is_age_context(text, whole.start(), whole.end()) {
                continue;
            }
            if let Some(duration) = quantity(n.as_str(), u.as_str()) {
                return Some(duration);
            }
        }

        None
    }

    /// "7/10" style numeric severity, else the most recent qualitative term
    pub fn extract_severity(&self, text: &str) -> Option<String> {
        for pattern in NUMERIC_SEVERITY_PATTERNS.iter() {
            if let Some(n) = pattern
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .filter(|n| *n <= 10)
            {
                return Some(format!("{}/10", n));
            }
        }

        QUALITATIVE_SEVERITY_PATTERN
            .find_iter(text)
            .last()
            .map(|m| canonical_severity(m.as_str()).to_string())
    }

    /// Temperature in degrees Celsius, rounded to one decimal
    pub fn extract_temperature(&self, text: &str) -> Option<f64> {
        for caps in EXPLICIT_TEMPERATURE_PATTERN.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let Ok(value) = m.as_str().parse::<f64>() else { continue };
            let (_, unit) = unit_after(&text[m.end()..]);
            if let Some(celsius) = to_celsius(value, unit, &CELSIUS_RANGE) {
                return Some(celsius);
            }
        }

        for caps in BARE_TEMPERATURE_PATTERN.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let raw = m.as_str();
            let Ok(value) = raw.parse::<f64>() else { continue };
            let (degree, unit) = unit_after(&text[m.end()..]);

            // Bare integers collide with ages and counts
            if !raw.contains('.') && !degree && unit.is_none() {
                continue;
            }
            if let Some(celsius) = to_celsius(value, unit, &BARE_CELSIUS_RANGE) {
                return Some(celsius);
            }
        }

        None
    }
}

// =============================================================================
// STATEFUL PARSER
// =============================================================================

/// Result of parsing one turn
#[derive(Debug, Clone, PartialEq)]
pub struct SlotParseOutcome {
    /// Slots found in this turn only
    pub parsed: ClinicalSlots,
    /// Session aggregate after merging
    pub aggregated: ClinicalSlots,
}

/// Per-session slot aggregate
///
/// Owned exclusively by one session. Newly parsed values overwrite the
/// aggregate ("latest wins"); fields absent from a turn keep their value.
#[derive(Debug, Clone, Default)]
pub struct ClinicalSlotParser {
    extractor: ClinicalSlotExtractor,
    aggregate: ClinicalSlots,
}

impl ClinicalSlotParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_turn(&mut self, text: &str) -> SlotParseOutcome {
        let parsed = self.extractor.extract(text);
        if !parsed.is_empty() {
            tracing::debug!(
                age = ?parsed.age,
                duration = ?parsed.duration,
                severity = ?parsed.severity,
                temperature = ?parsed.temperature,
                "Parsed clinical slots"
            );
            self.aggregate = self.aggregate.merged_with(&parsed);
        }
        SlotParseOutcome {
            parsed,
            aggregated: self.aggregate.clone(),
        }
    }

    pub fn slots(&self) -> &ClinicalSlots {
        &self.aggregate
    }

    /// Clear all state for a session restart
    pub fn reset(&mut self) {
        self.aggregate = ClinicalSlots::default();
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn leading_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

fn word_number(token: &str) -> Option<u32> {
    let value = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        other => return other.parse().ok(),
    };
    Some(value)
}

fn canonical_unit(unit: &str) -> Option<&'static str> {
    let unit = match unit {
        "minute" | "minutes" | "min" | "mins" | "minuto" | "minutos" => "minute",
        "hour" | "hours" | "hr" | "hrs" | "ghante" | "ghanta" | "hora" | "horas" => "hour",
        "day" | "days" | "din" | "dia" | "dias" | "día" | "días" => "day",
        "week" | "weeks" | "wk" | "wks" | "hafte" | "hafta" | "semana" | "semanas" => "week",
        "month" | "months" | "mahine" | "mahina" | "mes" | "meses" => "month",
        "year" | "years" | "yr" | "yrs" | "saal" | "año" | "años" => "year",
        _ => return None,
    };
    Some(unit)
}

/// "3" + "días" -> "3 days"
fn quantity(number: &str, unit: &str) -> Option<String> {
    let n = word_number(number)?;
    let unit = canonical_unit(unit)?;
    Some(if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    })
}

/// Rewrite a quantity inside a free phrase ("3 days ago") to canonical form
fn normalize_duration_phrase(phrase: &str) -> String {
    match BARE_DURATION_PATTERN.captures(phrase) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(n), Some(u)) => quantity(n.as_str(), u.as_str())
                .map(|q| format!("{} ago", q))
                .unwrap_or_else(|| phrase.to_string()),
            _ => phrase.to_string(),
        },
        None => phrase.to_string(),
    }
}

/// Quantity that belongs to an age statement rather than a duration
fn is_age_context(text: &str, start: usize, end: usize) -> bool {
    let after = text[end..].trim_start();
    let after = after.strip_prefix('-').unwrap_or(after).trim_start();
    if after.starts_with("old")
        || after.starts_with("ka ")
        || after.starts_with("ki ")
        || after.starts_with("de edad")
    {
        return true;
    }
    text[..start].trim_end().ends_with("tengo")
}

/// Text after "I am <n>" continues with a unit, so the number is not an age
fn starts_with_measure(rest: &str) -> bool {
    let rest = rest.trim_start();
    if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    if rest.starts_with(|c: char| matches!(c, '/' | '%' | '°' | 'º')) {
        return true;
    }
    let word = rest
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("");
    canonical_unit(word).is_some()
        || matches!(word, "out" | "of" | "degrees" | "degree" | "f" | "c" | "kg" | "kgs" | "lbs" | "cm")
}

fn canonical_severity(term: &str) -> &'static str {
    match term {
        "mild" | "slight" | "halka" | "halki" | "leve" => "mild",
        "moderate" | "moderado" | "moderada" => "moderate",
        "excruciating" => "excruciating",
        "unbearable" | "insoportable" | "asahniya" => "unbearable",
        _ => "severe",
    }
}

/// (degree marker present, explicit unit)
fn unit_after(rest: &str) -> (bool, Option<TemperatureUnit>) {
    let Some(caps) = TEMPERATURE_UNIT_PATTERN.captures(rest) else {
        return (false, None);
    };
    let degree = caps.get(1).is_some();
    let unit = caps.get(2).map(|m| match m.as_str() {
        "f" | "fahrenheit" => TemperatureUnit::Fahrenheit,
        _ => TemperatureUnit::Celsius,
    });
    (degree, unit)
}

fn to_celsius(
    value: f64,
    unit: Option<TemperatureUnit>,
    celsius_range: &std::ops::RangeInclusive<f64>,
) -> Option<f64> {
    let unit = unit.unwrap_or(if value >= 90.0 {
        TemperatureUnit::Fahrenheit
    } else {
        TemperatureUnit::Celsius
    });
    let celsius = match unit {
        TemperatureUnit::Fahrenheit if FAHRENHEIT_RANGE.contains(&value) => (value - 32.0) * 5.0 / 9.0,
        TemperatureUnit::Fahrenheit => return None,
        TemperatureUnit::Celsius => value,
    };
    let celsius = (celsius * 10.0).round() / 10.0;
    match unit {
        TemperatureUnit::Celsius if !celsius_range.contains(&celsius) => None,
        _ => Some(celsius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_extraction() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_age("i am 45 years old"), Some(45));
        assert_eq!(extractor.extract_age("34 y/o male"), Some(34));
        assert_eq!(extractor.extract_age("age 70"), Some(70));
        assert_eq!(extractor.extract_age("i'm 29 and have a cough"), Some(29));
        assert_eq!(extractor.extract_age("mera beta 6 saal ka hai"), Some(6));
        assert_eq!(extractor.extract_age("tengo 52 años"), Some(52));
        assert_eq!(extractor.extract_age("my baby is 8 months old"), Some(0));
    }

    #[test]
    fn test_self_statement_with_unit_is_not_age() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_age("i am 3 days into this cough"), None);
        assert_eq!(extractor.extract_age("i'm 38.5 today"), None);
    }

    #[test]
    fn test_duration_extraction() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_duration("it started yesterday").as_deref(), Some("yesterday"));
        assert_eq!(
            extractor.extract_duration("started 3 days ago").as_deref(),
            Some("3 days ago")
        );
        assert_eq!(
            extractor.extract_duration("since last night, getting worse").as_deref(),
            Some("since last night")
        );
        assert_eq!(extractor.extract_duration("for two weeks").as_deref(), Some("2 weeks"));
        assert_eq!(extractor.extract_duration("for a week").as_deref(), Some("1 week"));
        assert_eq!(extractor.extract_duration("5 days ago").as_deref(), Some("5 days"));
        assert_eq!(extractor.extract_duration("3 din se bukhar hai").as_deref(), Some("3 days"));
        assert_eq!(extractor.extract_duration("hace 4 días").as_deref(), Some("4 days"));
    }

    #[test]
    fn test_duration_skips_age() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_duration("he is 45 years old"), None);
        assert_eq!(
            extractor.extract_duration("45 years old, pain for 2 days").as_deref(),
            Some("2 days")
        );
        assert_eq!(extractor.extract_duration("tengo 30 años"), None);
    }

    #[test]
    fn test_numeric_severity_has_priority() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_severity("severe, maybe 7/10").as_deref(), Some("7/10"));
        assert_eq!(extractor.extract_severity("6 out of 10").as_deref(), Some("6/10"));
        assert_eq!(extractor.extract_severity("10 mein se 8").as_deref(), Some("8/10"));
        assert_eq!(extractor.extract_severity("it is 15/10").as_deref(), None);
    }

    #[test]
    fn test_qualitative_severity() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_severity("pretty mild").as_deref(), Some("mild"));
        assert_eq!(
            extractor.extract_severity("mild at first, now unbearable").as_deref(),
            Some("unbearable")
        );
        assert_eq!(extractor.extract_severity("dolor fuerte").as_deref(), Some("severe"));
    }

    #[test]
    fn test_temperature_extraction() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_temperature("temperature is 38.5"), Some(38.5));
        assert_eq!(extractor.extract_temperature("temp of 39"), Some(39.0));
        assert_eq!(extractor.extract_temperature("fever of 102"), Some(38.9));
        assert_eq!(extractor.extract_temperature("it was 101.3 f"), Some(38.5));
        assert_eq!(extractor.extract_temperature("around 38.2 this morning"), Some(38.2));
        assert_eq!(extractor.extract_temperature("39°c"), Some(39.0));
    }

    #[test]
    fn test_bare_integers_are_not_temperatures() {
        let extractor = ClinicalSlotExtractor::new();
        assert_eq!(extractor.extract_temperature("i am 38 years old"), None);
        assert_eq!(extractor.extract_temperature("pain is 40 percent better"), None);
        assert_eq!(extractor.extract_temperature("temperature 12"), None);
    }

    #[test]
    fn test_merge_keeps_prior_age() {
        let mut parser = ClinicalSlotParser::new();
        let first = parser.parse_turn("I'm 40 years old with a cough for 3 days");
        assert_eq!(first.parsed.age, Some(40));
        assert_eq!(first.aggregated.duration.as_deref(), Some("3 days"));

        let second = parser.parse_turn("the pain is 8/10 now");
        assert_eq!(second.parsed.age, None);
        assert_eq!(second.aggregated.age, Some(40));
        assert_eq!(second.aggregated.severity.as_deref(), Some("8/10"));
    }

    #[test]
    fn test_latest_value_wins() {
        let mut parser = ClinicalSlotParser::new();
        parser.parse_turn("it is mild");
        let outcome = parser.parse_turn("actually severe now");
        assert_eq!(outcome.aggregated.severity.as_deref(), Some("severe"));
    }

    #[test]
    fn test_empty_turn_is_identity() {
        let mut parser = ClinicalSlotParser::new();
        parser.parse_turn("age 30, temperature 38.4");
        let before = parser.slots().clone();
        let outcome = parser.parse_turn("");
        assert!(outcome.parsed.is_empty());
        assert_eq!(outcome.aggregated, before);
        assert_eq!(parser.slots(), &before);
    }

    #[test]
    fn test_reset() {
        let mut parser = ClinicalSlotParser::new();
        parser.parse_turn("age 30");
        parser.reset();
        assert!(parser.slots().is_empty());
    }
}
