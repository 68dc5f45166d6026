//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{arbiter, detector, paths, session};
use crate::ConfigError;

/// Runtime environment for validation strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Emergency detector configuration
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Turn policy thresholds
    #[serde(default)]
    pub arbiter: ArbiterConfig,

    /// Session orchestration limits
    #[serde(default)]
    pub session: SessionConfig,

    /// Keyword table override; the embedded table is used when unset
    #[serde(default)]
    pub keywords_path: Option<String>,

    /// Offline flow override; the embedded flow is used when unset
    #[serde(default)]
    pub offline_flow_path: Option<String>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings, rejecting inconsistent policy values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_detector()?;
        self.validate_arbiter()?;
        self.validate_session()?;
        self.validate_paths()?;
        Ok(())
    }

    fn validate_detector(&self) -> Result<(), ConfigError> {
        if self.detector.emergency_threshold >= detector::MAX_SCORE {
            return Err(ConfigError::invalid(
                "detector.emergency_threshold",
                format!("must be below {}", detector::MAX_SCORE),
            ));
        }
        if self.detector.negation_window_words == 0 {
            return Err(ConfigError::invalid(
                "detector.negation_window_words",
                "window must cover at least one word",
            ));
        }
        Ok(())
    }

    fn validate_arbiter(&self) -> Result<(), ConfigError> {
        let a = &self.arbiter;
        if a.simple_floor_turns > a.complex_floor_turns {
            return Err(ConfigError::invalid(
                "arbiter.simple_floor_turns",
                "simple floor cannot exceed complex floor",
            ));
        }
        if a.complex_floor_turns > a.hard_cap_turns {
            return Err(ConfigError::invalid(
                "arbiter.complex_floor_turns",
                "floor cannot exceed the hard cap",
            ));
        }
        if a.final_turn_limit > a.hard_cap_turns {
            return Err(ConfigError::invalid(
                "arbiter.final_turn_limit",
                "final turn limit cannot exceed the hard cap",
            ));
        }
        for (field, value) in [
            ("arbiter.readiness_threshold", a.readiness_threshold),
            ("arbiter.fever_consistency_threshold", a.fever_consistency_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be within [0, 1]"));
            }
        }
        if a.saturation_turns == 0 {
            return Err(ConfigError::invalid(
                "arbiter.saturation_turns",
                "at least one stable turn is required",
            ));
        }
        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.profile_extraction_interval == 0 {
            return Err(ConfigError::invalid(
                "session.profile_extraction_interval",
                "interval must be positive",
            ));
        }
        if self.session.turn_lock_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "session.turn_lock_timeout_ms",
                "timeout must be positive",
            ));
        }
        Ok(())
    }

    /// Overrides must exist in strict environments; elsewhere a missing file
    /// falls back to the embedded document
    fn validate_paths(&self) -> Result<(), ConfigError> {
        for path in [&self.keywords_path, &self.offline_flow_path]
            .into_iter()
            .flatten()
        {
            if std::path::Path::new(path).exists() {
                continue;
            }
            if self.environment.is_strict() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            tracing::warn!(path = %path, "Configured data file missing, embedded default will be used");
        }
        Ok(())
    }
}

/// Emergency detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Words before a keyword inspected for negation cues
    #[serde(default = "default_negation_window")]
    pub negation_window_words: usize,

    /// Scores strictly above this are emergencies
    #[serde(default = "default_emergency_threshold")]
    pub emergency_threshold: u8,
}

fn default_negation_window() -> usize {
    detector::NEGATION_WINDOW_WORDS
}
fn default_emergency_threshold() -> u8 {
    detector::EMERGENCY_THRESHOLD
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            negation_window_words: default_negation_window(),
            emergency_threshold: default_emergency_threshold(),
        }
    }
}

/// Arbiter turn policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterConfig {
    #[serde(default = "default_hard_cap")]
    pub hard_cap_turns: u32,
    #[serde(default = "default_simple_floor")]
    pub simple_floor_turns: u32,
    #[serde(default = "default_complex_floor")]
    pub complex_floor_turns: u32,
    #[serde(default = "default_final_turn_limit")]
    pub final_turn_limit: u32,
    #[serde(default = "default_readiness_threshold")]
    pub readiness_threshold: f64,
    #[serde(default = "default_fever_consistency")]
    pub fever_consistency_threshold: f64,
    #[serde(default = "default_saturation_turns")]
    pub saturation_turns: u32,
    #[serde(default = "default_max_clarifications")]
    pub max_clarifications: u32,
}

fn default_hard_cap() -> u32 {
    arbiter::HARD_CAP_TURNS
}
fn default_simple_floor() -> u32 {
    arbiter::SIMPLE_FLOOR_TURNS
}
fn default_complex_floor() -> u32 {
    arbiter::COMPLEX_FLOOR_TURNS
}
fn default_final_turn_limit() -> u32 {
    arbiter::FINAL_TURN_LIMIT
}
fn default_readiness_threshold() -> f64 {
    arbiter::READINESS_THRESHOLD
}
fn default_fever_consistency() -> f64 {
    arbiter::FEVER_CONSISTENCY_THRESHOLD
}
fn default_saturation_turns() -> u32 {
    arbiter::SATURATION_TURNS
}
fn default_max_clarifications() -> u32 {
    session::MAX_CLARIFICATIONS
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            hard_cap_turns: default_hard_cap(),
            simple_floor_turns: default_simple_floor(),
            complex_floor_turns: default_complex_floor(),
            final_turn_limit: default_final_turn_limit(),
            readiness_threshold: default_readiness_threshold(),
            fever_consistency_threshold: default_fever_consistency(),
            saturation_turns: default_saturation_turns(),
            max_clarifications: default_max_clarifications(),
        }
    }
}

/// Session orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Re-extract the profile every N answers
    #[serde(default = "default_extraction_interval")]
    pub profile_extraction_interval: u32,

    #[serde(default = "default_max_clarifications")]
    pub max_clarifications: u32,

    /// Dynamic follow-ups allowed when the queue runs dry
    #[serde(default = "default_max_expansions")]
    pub max_expansions: u32,

    /// Turn lock self-heal timeout
    #[serde(default = "default_lock_timeout")]
    pub turn_lock_timeout_ms: u64,
}

fn default_extraction_interval() -> u32 {
    session::PROFILE_EXTRACTION_INTERVAL
}
fn default_max_expansions() -> u32 {
    session::MAX_EXPANSIONS
}
fn default_lock_timeout() -> u64 {
    session::TURN_LOCK_TIMEOUT_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_extraction_interval: default_extraction_interval(),
            max_clarifications: default_max_clarifications(),
            max_expansions: default_max_expansions(),
            turn_lock_timeout_ms: default_lock_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from `config/default`, `config/{env}` and `TRIAGE__*`
/// environment variables, in increasing priority
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(paths::SETTINGS_DIR, env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&format!("{}/default", dir)).required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("{}/{}", dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("TRIAGE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
