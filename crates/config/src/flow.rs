//! Offline flow document loading
//!
//! The document is JSON: `{ "name", "startNode", "nodes": { id: node } }`.
//! Structural validation (dangling edges, outcomes without a
//! recommendation) is performed by the offline engine when it takes
//! ownership of the graph.

use std::path::Path;

use triage_core::TriageFlow;

use crate::ConfigError;

const BUILTIN_FLOW: &str = include_str!("../../../config/offline_flow.json");

/// Parse a flow document
pub fn parse_flow(content: &str) -> Result<TriageFlow, ConfigError> {
    let flow: TriageFlow =
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    if flow.start_node.is_empty() {
        return Err(ConfigError::MissingField("startNode".to_string()));
    }
    tracing::debug!(flow = %flow.name, nodes = flow.nodes.len(), "Parsed offline flow");
    Ok(flow)
}

/// Load a flow document from disk
pub fn load_flow<P: AsRef<Path>>(path: P) -> Result<TriageFlow, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_flow(&content)
}

/// The general triage flow embedded at compile time
pub fn builtin_flow() -> Result<TriageFlow, ConfigError> {
    parse_flow(BUILTIN_FLOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_flow_parses() {
        let flow = builtin_flow().unwrap();
        assert!(flow.node(&flow.start_node).is_some());
        assert!(flow.nodes.values().any(|n| n.is_outcome()));
        for node in flow.nodes.values() {
            for option in node.options() {
                assert!(flow.node(&option.next).is_some(), "dangling edge {}", option.next);
            }
            if node.is_outcome() {
                assert!(node.recommendation().is_some());
            }
        }
    }

    #[test]
    fn test_missing_start_rejected() {
        let result = parse_flow(r#"{"name": "x", "startNode": "", "nodes": {}}"#);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(parse_flow("{not json"), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_flow_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");
        std::fs::write(
            &path,
            r#"{"name": "tiny", "start_node": "o", "nodes": {"o": {"type": "outcome", "text": "Rest", "recommendation": "self_care"}}}"#,
        )
        .unwrap();
        let flow = load_flow(&path).unwrap();
        assert_eq!(flow.name, "tiny");
        assert!(load_flow(dir.path().join("missing.json")).is_err());
    }
}
