//! Shared, read-only triage components
//!
//! The keyword table, detector, arbiter policy and offline flow are built
//! once and shared by every session.

use std::sync::Arc;

use triage_config::{builtin_flow, load_flow, KeywordTable, SessionConfig, Settings};
use triage_core::{Planner, TriageFlow};
use triage_text_processing::EmergencyDetector;

use crate::arbiter::TriageArbiter;
use crate::offline::OfflineEngine;
use crate::session::TriageSession;
use crate::SessionError;

#[derive(Debug, Clone)]
pub struct TriageEngine {
    detector: Arc<EmergencyDetector>,
    arbiter: Arc<TriageArbiter>,
    offline: OfflineEngine,
    session: SessionConfig,
}

impl TriageEngine {
    /// Build from settings, loading overridden data files where configured
    pub fn from_settings(settings: &Settings) -> Result<Self, SessionError> {
        let table = KeywordTable::load_or_builtin(settings.keywords_path.as_deref())?;
        let flow = match settings.offline_flow_path.as_deref() {
            Some(path) => load_flow(path)?,
            None => builtin_flow()?,
        };
        Self::new(Arc::new(table), flow, settings)
    }

    pub fn new(
        table: Arc<KeywordTable>,
        flow: TriageFlow,
        settings: &Settings,
    ) -> Result<Self, SessionError> {
        let arbiter = TriageArbiter::new(settings.arbiter.clone(), &table);
        let detector = EmergencyDetector::with_config(table, &settings.detector);
        let offline = OfflineEngine::new(flow)?;

        tracing::info!(
            environment = ?settings.environment,
            keyword_table = %detector.table().version,
            offline_flow = %offline.flow().name,
            "Triage engine ready"
        );

        Ok(Self {
            detector: Arc::new(detector),
            arbiter: Arc::new(arbiter),
            offline,
            session: settings.session.clone(),
        })
    }

    /// Engine over the embedded keyword table and offline flow with default settings
    pub fn builtin() -> Result<Self, SessionError> {
        Self::from_settings(&Settings::default())
    }

    pub fn detector(&self) -> &EmergencyDetector {
        &self.detector
    }

    pub fn arbiter(&self) -> &TriageArbiter {
        &self.arbiter
    }

    pub fn offline(&self) -> &OfflineEngine {
        &self.offline
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    /// Open a new session backed by `planner`
    pub fn session<P: Planner + ?Sized>(&self, planner: Arc<P>) -> TriageSession<P> {
        TriageSession::new(planner, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_engine() {
        let engine = TriageEngine::builtin().unwrap();
        assert!(engine.offline().start().is_ok());
        assert_eq!(engine.session_config().max_clarifications, 2);
    }

    #[test]
    fn test_missing_flow_override_is_an_error() {
        let settings = Settings {
            offline_flow_path: Some("/nonexistent/flow.json".into()),
            ..Default::default()
        };
        assert!(matches!(
            TriageEngine::from_settings(&settings),
            Err(SessionError::Config(_))
        ));
    }
}
