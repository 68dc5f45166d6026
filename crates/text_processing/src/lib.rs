//! Text processing for the triage core
//!
//! This crate provides the deterministic text analysis run on every
//! patient turn:
//! - **Emergency/Crisis Detection**: keyword-table scoring with negation,
//!   exclusion, context adjustments and authority override
//! - **Clinical Slot Extraction**: age, duration, severity and temperature
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use triage_config::KeywordTable;
//! use triage_text_processing::{DetectionOptions, EmergencyDetector};
//!
//! let detector = EmergencyDetector::new(Arc::new(KeywordTable::builtin()?));
//! let result = detector.evaluate("crushing chest pain", &DetectionOptions::default());
//! assert!(result.is_emergency);
//! ```

pub mod detector;
pub mod slot_extraction;

pub use detector::{DetectionOptions, EmergencyDetector};
pub use slot_extraction::{ClinicalSlotExtractor, ClinicalSlotParser, SlotParseOutcome};
