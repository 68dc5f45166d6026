//! Triage decision core
//!
//! Features:
//! - Triage Arbiter: deterministic per-turn policy (terminate, continue,
//!   reorder, clarify, drill down)
//! - Offline decision-tree engine used when the planner is unreachable
//! - Session protocol: emergency verification, slot parsing, profile
//!   reconciliation and signal branching, one turn at a time
//!
//! Text analysis lives in `triage-text-processing`; the async planner is a
//! collaborator behind `triage_core::Planner`.

pub mod arbiter;
pub mod engine;
pub mod offline;
pub mod session;

pub use arbiter::{ArbiterDecision, ArbiterInput, TriageArbiter};
pub use engine::TriageEngine;
pub use offline::{
    estimated_remaining_steps, process_step, start_node, validate_flow, OfflineEngine,
};
pub use session::{
    Prompt, PromptKind, SessionEvent, SessionMode, SessionPhase, TriageSession, TurnOutcome,
    VerificationAnswer,
};

use thiserror::Error;

use triage_config::ConfigError;
use triage_core::FlowError;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A turn is already in progress")]
    Busy,

    #[error("Session has ended")]
    Ended,

    #[error("Session has not started")]
    NotStarted,

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Emergency verification answer required")]
    VerificationPending,

    #[error("No emergency verification is pending")]
    NoPendingVerification,

    #[error("Empty input")]
    EmptyInput,

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
