//! Interactive triage session on stdin/stdout
//!
//! No remote planner is wired in, so every session runs on the offline
//! decision tree after the emergency screen.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use triage_agent::{SessionError, TriageEngine, TurnOutcome};
use triage_config::{load_settings, Settings};
use triage_core::{
    AssessmentPlan, AssessmentQuestion, ClinicalProfile, Planner, PlannerError, TextStream, Turn,
};

/// Planner stand-in that is never reachable
struct UnavailablePlanner;

impl UnavailablePlanner {
    fn error() -> PlannerError {
        PlannerError::Unavailable("no planner configured".into())
    }
}

#[async_trait]
impl Planner for UnavailablePlanner {
    async fn generate_assessment_plan(
        &self,
        _symptom_text: &str,
        _context: Option<&str>,
        _patient_name: Option<&str>,
    ) -> Result<AssessmentPlan, PlannerError> {
        Err(Self::error())
    }

    async fn extract_clinical_profile(
        &self,
        _history: &[Turn],
        _context: Option<&str>,
    ) -> Result<ClinicalProfile, PlannerError> {
        Err(Self::error())
    }

    async fn generate_immediate_follow_up(
        &self,
        _profile: &ClinicalProfile,
        _context: &str,
    ) -> Result<AssessmentQuestion, PlannerError> {
        Err(Self::error())
    }

    async fn generate_bridge_message(
        &self,
        _last_answer: &str,
        _next_question: &str,
    ) -> Result<String, PlannerError> {
        Err(Self::error())
    }

    async fn stream_response(&self, _prompt: &str) -> Result<TextStream, PlannerError> {
        Err(Self::error())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("TRIAGE_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "Starting triage session"
    );

    let engine = TriageEngine::from_settings(&settings)?;
    let session = engine.session(Arc::new(UnavailablePlanner));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Describe your symptoms:");
    let mut outcome = loop {
        let Some(symptoms) = lines.next_line().await? else {
            return Ok(());
        };
        if !symptoms.trim().is_empty() {
            break session.start(&symptoms, None).await;
        }
    };

    loop {
        match outcome {
            Ok(TurnOutcome::Question(prompt)) => {
                if let Some(bridge) = &prompt.bridge {
                    println!("{}", bridge);
                }
                if prompt.options.is_empty() {
                    println!("{}", prompt.text);
                } else {
                    println!("{} [{}]", prompt.text, prompt.options.join("/"));
                }
            },
            Ok(TurnOutcome::VerifyEmergency { prompt, .. }) => println!("{}", prompt),
            Ok(TurnOutcome::Emergency(payload)) => {
                println!("{}", payload.user_advice);
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            },
            Ok(TurnOutcome::Complete(summary)) => {
                if !summary.narrative.is_empty() {
                    println!("{}", summary.narrative);
                }
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            },
            Err(SessionError::VerificationPending) => {
                if let Some(pending) = session.pending_verification() {
                    println!("{}", pending.prompt());
                }
            },
            Err(SessionError::EmptyInput) => {},
            Err(SessionError::Flow(e)) => {
                tracing::warn!(code = e.code(), error = %e, "Answer not accepted");
                println!("Please answer with one of the listed options.");
            },
            Err(e) => return Err(e.into()),
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        outcome = session.submit(&line).await;
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("triage={},warn", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
