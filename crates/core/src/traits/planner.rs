//! Planner trait: the adaptive question-planning service

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::conversation::{AssessmentPlan, AssessmentQuestion, Turn};
use crate::profile::ClinicalProfile;

/// Stream of text chunks produced by the planner
pub type TextStream = BoxStream<'static, Result<String, PlannerError>>;

/// Planner failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("Planner unreachable: {0}")]
    Unavailable(String),

    #[error("Planner call timed out after {0}ms")]
    Timeout(u64),

    #[error("Planner returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Planner error: {0}")]
    Other(String),
}

impl PlannerError {
    /// Network-level failure (as opposed to a malformed response)
    pub fn is_connectivity(&self) -> bool {
        matches!(self, PlannerError::Unavailable(_) | PlannerError::Timeout(_))
    }
}

/// Adaptive planner capabilities consumed by the session protocol
///
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
///
/// ```ignore
/// struct OfflinePlanner;
///
/// #[async_trait]
/// impl Planner for OfflinePlanner {
///     async fn generate_assessment_plan(&self, _: &str, _: Option<&str>, _: Option<&str>)
///         -> Result<AssessmentPlan, PlannerError> {
///         Err(PlannerError::Unavailable("no network".into()))
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce the ordered question plan for a new session
    async fn generate_assessment_plan(
        &self,
        symptom_text: &str,
        context: Option<&str>,
        patient_name: Option<&str>,
    ) -> Result<AssessmentPlan, PlannerError>;

    /// Extract a structured clinical profile from the conversation so far
    async fn extract_clinical_profile(
        &self,
        history: &[Turn],
        context: Option<&str>,
    ) -> Result<ClinicalProfile, PlannerError>;

    /// Generate one immediate drill-down question
    async fn generate_immediate_follow_up(
        &self,
        profile: &ClinicalProfile,
        context: &str,
    ) -> Result<AssessmentQuestion, PlannerError>;

    /// Short transition text between the last answer and the next question
    async fn generate_bridge_message(
        &self,
        last_answer: &str,
        next_question: &str,
    ) -> Result<String, PlannerError>;

    /// Stream a free-text response; the stream is finite
    async fn stream_response(&self, prompt: &str) -> Result<TextStream, PlannerError>;
}

/// Consume a planner stream fully before use
pub async fn collect_stream(mut stream: TextStream) -> Result<String, PlannerError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}
