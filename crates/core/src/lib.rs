//! Core traits and types for the symptom triage decision core
//!
//! This crate provides foundational types used across all other crates:
//! - Clinical profile and deterministic slot types
//! - Emergency detection results and body systems
//! - Arbiter signals, results and per-session arbiter state
//! - Offline decision-tree graph types and their typed errors
//! - Conversation turns and assessment questions
//! - Session boundary payloads (summary, emergency override)
//! - The asynchronous `Planner` collaborator trait

pub mod arbiter;
pub mod conversation;
pub mod emergency;
pub mod flow;
pub mod payload;
pub mod profile;
pub mod slots;
pub mod traits;

pub use arbiter::{ArbiterResult, ArbiterSignal, ArbiterState};
pub use conversation::{AssessmentPlan, AssessmentQuestion, Turn, TurnRole};
pub use emergency::{
    BodySystem, DetectionTrace, EmergencyDetectionResult, MatchDisposition, SegmentTrace,
    TermEvidence,
};
pub use flow::{FlowError, FlowNode, FlowOption, FlowStep, TriageFlow};
pub use payload::{AnswerRecord, EmergencyOverride, SessionSummary};
pub use profile::{ClinicalProfile, DenialConfidence, FeverProtocol, SymptomCategory};
pub use slots::ClinicalSlots;
pub use traits::{collect_stream, Planner, PlannerError, TextStream};
