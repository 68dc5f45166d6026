//! Offline decision-tree graph types
//!
//! A `TriageFlow` is a named, immutable directed graph loaded once from a
//! static document and shared read-only across sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answer choice on a question node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOption {
    pub label: String,
    /// Id of the node this option leads to
    pub next: String,
}

impl FlowOption {
    pub fn new(label: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next: next.into(),
        }
    }
}

/// A node in the offline graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowNode {
    Question {
        text: String,
        #[serde(default)]
        options: Vec<FlowOption>,
    },
    Outcome {
        text: String,
        /// Required on every outcome; validated at load time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recommendation: Option<String>,
    },
}

impl FlowNode {
    pub fn text(&self) -> &str {
        match self {
            FlowNode::Question { text, .. } | FlowNode::Outcome { text, .. } => text,
        }
    }

    pub fn is_outcome(&self) -> bool {
        matches!(self, FlowNode::Outcome { .. })
    }

    pub fn options(&self) -> &[FlowOption] {
        match self {
            FlowNode::Question { options, .. } => options,
            FlowNode::Outcome { .. } => &[],
        }
    }

    pub fn recommendation(&self) -> Option<&str> {
        match self {
            FlowNode::Outcome { recommendation, .. } => recommendation.as_deref(),
            FlowNode::Question { .. } => None,
        }
    }
}

/// Named offline triage graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageFlow {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "startNode", alias = "start_node")]
    pub start_node: String,
    pub nodes: HashMap<String, FlowNode>,
}

impl TriageFlow {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.get(id)
    }
}

/// A resolved position in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStep<'a> {
    pub id: &'a str,
    pub node: &'a FlowNode,
    pub is_outcome: bool,
}

impl<'a> FlowStep<'a> {
    pub fn new(id: &'a str, node: &'a FlowNode) -> Self {
        Self {
            id,
            node,
            is_outcome: node.is_outcome(),
        }
    }
}

/// Offline engine errors
///
/// All are fatal to the current step and indicate a malformed static
/// asset or an answer the graph cannot route; callers must not retry with
/// the same input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("INVALID_NODE: {0}")]
    InvalidNode(String),

    #[error("INVALID_ANSWER: '{answer}' matches no option of node {node}")]
    InvalidAnswer { node: String, answer: String },

    #[error("FLOW_NOT_FOUND: start node '{0}' is missing")]
    FlowNotFound(String),

    #[error("OUTCOME_REACHED: node {0} is terminal")]
    OutcomeReached(String),
}

impl FlowError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::InvalidNode(_) => "INVALID_NODE",
            FlowError::InvalidAnswer { .. } => "INVALID_ANSWER",
            FlowError::FlowNotFound(_) => "FLOW_NOT_FOUND",
            FlowError::OutcomeReached(_) => "OUTCOME_REACHED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_document_shape() {
        let flow: TriageFlow = serde_json::from_str(
            r#"{
                "name": "mini",
                "startNode": "q1",
                "nodes": {
                    "q1": {"type": "question", "text": "Fever?", "options": [{"label": "Yes", "next": "o1"}]},
                    "o1": {"type": "outcome", "text": "Rest", "recommendation": "self_care"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(flow.start_node, "q1");
        assert_eq!(flow.node("q1").unwrap().options().len(), 1);
        assert!(flow.node("o1").unwrap().is_outcome());
        assert_eq!(flow.node("o1").unwrap().recommendation(), Some("self_care"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FlowError::InvalidNode("x".into()).code(), "INVALID_NODE");
        assert_eq!(
            FlowError::InvalidAnswer {
                node: "q".into(),
                answer: "maybe".into()
            }
            .code(),
            "INVALID_ANSWER"
        );
        assert!(FlowError::OutcomeReached("o1".into()).to_string().starts_with("OUTCOME_REACHED"));
    }
}
