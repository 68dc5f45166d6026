//! Collaborator traits for the triage core
//!
//! The core treats the adaptive question planner purely as an asynchronous
//! collaborator. Everything it produces (plans, profiles, follow-ups,
//! bridge text, streamed replies) may fail or be unreachable.

mod planner;

pub use planner::{collect_stream, Planner, PlannerError, TextStream};
