//! Offline Decision-Tree Engine
//!
//! Deterministic fallback that walks a static `TriageFlow` when the planner
//! is unreachable. Stepping is a pure function of `(flow, node, answer)`;
//! the flow itself is loaded once and shared read-only.

use std::collections::HashSet;
use std::sync::Arc;

use triage_core::{FlowError, FlowNode, FlowStep, TriageFlow};

const YES_SYNONYMS: &[&str] = &["yes", "y", "yeah", "yep", "correct", "true", "haan", "sí", "si"];
const NO_SYNONYMS: &[&str] = &["no", "n", "nope", "nah", "incorrect", "false", "nahi"];

/// Entry step of a flow
pub fn start_node(flow: &TriageFlow) -> Result<FlowStep<'_>, FlowError> {
    let (id, node) = flow
        .nodes
        .get_key_value(flow.start_node.as_str())
        .ok_or_else(|| FlowError::FlowNotFound(flow.start_node.clone()))?;
    Ok(FlowStep::new(id, node))
}

/// Advance from `current_node_id` using the user's answer
///
/// Answers match option labels case-insensitively after trimming; "yes"/"no"
/// labels also accept common synonyms.
pub fn process_step<'f>(
    flow: &'f TriageFlow,
    current_node_id: &str,
    answer: &str,
) -> Result<FlowStep<'f>, FlowError> {
    let node = flow
        .node(current_node_id)
        .ok_or_else(|| FlowError::InvalidNode(current_node_id.to_string()))?;

    if node.is_outcome() {
        return Err(FlowError::OutcomeReached(current_node_id.to_string()));
    }

    let normalized = answer.trim().to_lowercase();
    let option = node
        .options()
        .iter()
        .find(|opt| label_matches(&opt.label, &normalized))
        .ok_or_else(|| FlowError::InvalidAnswer {
            node: current_node_id.to_string(),
            answer: answer.to_string(),
        })?;

    let (next_id, next) = flow
        .nodes
        .get_key_value(option.next.as_str())
        .ok_or_else(|| FlowError::InvalidNode(option.next.clone()))?;

    if lacks_recommendation(next) {
        tracing::warn!(node = %next_id, "Outcome node has no recommendation");
        return Err(FlowError::InvalidNode(next_id.clone()));
    }

    tracing::debug!(from = %current_node_id, to = %next_id, answer = %normalized, "Offline flow step");
    Ok(FlowStep::new(next_id, next))
}

/// Outcome with a missing or blank recommendation
fn lacks_recommendation(node: &FlowNode) -> bool {
    node.is_outcome()
        && node
            .recommendation()
            .map(|r| r.trim().is_empty())
            .unwrap_or(true)
}

fn label_matches(label: &str, normalized_answer: &str) -> bool {
    let label = label.trim().to_lowercase();
    if label == normalized_answer {
        return true;
    }
    match label.as_str() {
        "yes" => YES_SYNONYMS.contains(&normalized_answer),
        "no" => NO_SYNONYMS.contains(&normalized_answer),
        _ => false,
    }
}

/// Structural problems in a flow: missing start node, dangling edges,
/// dead-end questions and outcomes without a recommendation
pub fn validate_flow(flow: &TriageFlow) -> Vec<String> {
    let mut problems = Vec::new();

    if flow.node(&flow.start_node).is_none() {
        problems.push(format!("start node '{}' does not exist", flow.start_node));
    }

    let mut ids: Vec<&String> = flow.nodes.keys().collect();
    ids.sort();
    for id in ids {
        match &flow.nodes[id] {
            FlowNode::Question { options, .. } => {
                if options.is_empty() {
                    problems.push(format!("question '{}' has no options", id));
                }
                for opt in options {
                    if flow.node(&opt.next).is_none() {
                        problems.push(format!(
                            "option '{}' of '{}' points to missing node '{}'",
                            opt.label, id, opt.next
                        ));
                    }
                }
            },
            node @ FlowNode::Outcome { .. } => {
                if lacks_recommendation(node) {
                    problems.push(format!("outcome '{}' has no recommendation", id));
                }
            },
        }
    }

    problems
}

/// Upper bound on questions left before an outcome, following the longest
/// acyclic path from `node_id`
pub fn estimated_remaining_steps(flow: &TriageFlow, node_id: &str) -> usize {
    fn longest(flow: &TriageFlow, id: &str, visiting: &mut HashSet<String>) -> usize {
        let Some(node) = flow.node(id) else {
            return 0;
        };
        if node.is_outcome() || !visiting.insert(id.to_string()) {
            return 0;
        }
        let deepest = node
            .options()
            .iter()
            .map(|opt| longest(flow, &opt.next, visiting))
            .max()
            .unwrap_or(0);
        visiting.remove(id);
        deepest + 1
    }

    longest(flow, node_id, &mut HashSet::new())
}

/// A validated flow shared across sessions
#[derive(Debug, Clone)]
pub struct OfflineEngine {
    flow: Arc<TriageFlow>,
}

impl OfflineEngine {
    /// Wrap a flow after structural validation
    pub fn new(flow: TriageFlow) -> Result<Self, FlowError> {
        Self::from_shared(Arc::new(flow))
    }

    pub fn from_shared(flow: Arc<TriageFlow>) -> Result<Self, FlowError> {
        if flow.node(&flow.start_node).is_none() {
            return Err(FlowError::FlowNotFound(flow.start_node.clone()));
        }
        let problems = validate_flow(&flow);
        if let Some(first) = problems.first() {
            tracing::error!(flow = %flow.name, problems = ?problems, "Offline flow failed validation");
            return Err(FlowError::InvalidNode(first.clone()));
        }
        tracing::info!(flow = %flow.name, nodes = flow.nodes.len(), "Offline flow loaded");
        Ok(Self { flow })
    }

    pub fn flow(&self) -> &TriageFlow {
        &self.flow
    }

    pub fn start(&self) -> Result<FlowStep<'_>, FlowError> {
        start_node(&self.flow)
    }

    pub fn step(&self, current_node_id: &str, answer: &str) -> Result<FlowStep<'_>, FlowError> {
        process_step(&self.flow, current_node_id, answer)
    }

    pub fn remaining_steps(&self, node_id: &str) -> usize {
        estimated_remaining_steps(&self.flow, node_id)
    }
}
