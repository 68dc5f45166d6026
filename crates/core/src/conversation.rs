//! Conversation turns and assessment questions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Patient / user message
    User,
    /// Assistant message (question, bridge, clarification)
    Assistant,
    /// System message
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// A planned interview question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    /// Stable identifier
    pub id: String,
    /// Question text shown to the user
    pub text: String,
    /// Depth tier (1 = broad, 3 = systematic ambiguity resolution)
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Whether this is a red-flag screening question
    #[serde(default)]
    pub is_red_flag: bool,
    /// Optional fixed answer choices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

fn default_tier() -> u8 {
    1
}

impl AssessmentQuestion {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            tier: 1,
            is_red_flag: false,
            options: Vec::new(),
        }
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn red_flag(mut self) -> Self {
        self.is_red_flag = true;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Tier-3 questions resolve ambiguity systematically
    pub fn is_tier3(&self) -> bool {
        self.tier >= 3
    }
}

/// Plan returned by the planner at session start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPlan {
    /// Ordered question list
    pub questions: Vec<AssessmentQuestion>,
    /// Introductory message shown before the first question
    #[serde(default)]
    pub intro: String,
}
