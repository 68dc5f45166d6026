//! Configuration management for the triage core
//!
//! Supports loading:
//! - Layered settings (YAML files, then `TRIAGE__` environment variables)
//! - The versioned emergency keyword table (`keywords.yaml`)
//! - The offline decision-tree document (`offline_flow.json`)
//!
//! Both data documents are embedded at compile time and can be replaced
//! by a path in `Settings`.

pub mod constants;
pub mod flow;
pub mod keywords;
pub mod settings;

pub use flow::{builtin_flow, load_flow, parse_flow};
pub use keywords::{Combination, DangerIndicator, KeywordEntry, KeywordTable, NegationRules};
pub use settings::{
    load_settings, load_settings_from, ArbiterConfig, DetectorConfig, ObservabilityConfig,
    RuntimeEnvironment, SessionConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
