//! The importable workflow document and its structural invariants.
//!
//! The serialized shape matches the automation platform's import format:
//! nodes reference each other by name, and `connections[source].main` is
//! indexed first by output branch, then by target.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{is_respond_type, is_trigger_type};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One synthesized automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub id: String,
    pub name: String,
    /// Canonical display order; the trigger comes first.
    pub nodes: Vec<Node>,
    /// Outgoing edges keyed by source node name.
    #[serde(default)]
    pub connections: BTreeMap<String, NodeConnections>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub settings: WorkflowSettings,
    #[serde(default)]
    pub meta: WorkflowMeta,
}

/// One processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_type_version")]
    pub type_version: u32,
    pub position: [i32; 2],
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_type_version() -> u32 {
    1
}

/// Outgoing edges of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConnections {
    /// Outer index: output branch (0 = default / true, 1 = false).
    pub main: Vec<Vec<ConnectionTarget>>,
}

/// The receiving end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub node: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Input slot on the target.
    pub index: usize,
}

impl ConnectionTarget {
    pub fn main(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            kind: "main".into(),
            index: 0,
        }
    }
}

/// A flattened view of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub output_index: usize,
    pub input_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    pub execution_order: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            execution_order: "v1".into(),
        }
    }
}

/// Which stage produced the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    #[default]
    Rules,
    Ai,
}

/// Informational metadata.  Nothing downstream reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowMeta {
    pub services_detected: Vec<String>,
    pub workflow_type: String,
    pub trigger_type: String,
    pub complexity: String,
    /// RFC 3339.
    pub generated_at: String,
    pub source: GenerationSource,
    /// Weighted keyword score per workflow type.
    pub scores: BTreeMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A broken structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("expected at least 2 nodes, found {count}")]
    TooFewNodes { count: usize },

    #[error("expected exactly one trigger node, found {count}")]
    TriggerCount { count: usize },

    #[error("trigger node `{name}` has an incoming connection")]
    TriggerHasIncoming { name: String },

    #[error("node `{name}` has no incoming connection")]
    Orphan { name: String },

    #[error("connection references unknown node `{name}`")]
    DanglingReference { name: String },

    #[error("node `{name}` connects to itself")]
    SelfLoop { name: String },

    #[error("node name `{name}` is used more than once")]
    DuplicateName { name: String },

    #[error("node id `{id}` is used more than once")]
    DuplicateId { id: String },

    #[error("connection from `{from}` has type `{kind}`, expected `main`")]
    ConnectionKind { from: String, kind: String },
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl WorkflowDocument {
    /// Every edge in the document, in key order.
    pub fn edges(&self) -> impl Iterator<Item = Connection<'_>> + '_ {
        self.connections.iter().flat_map(|(source, outs)| {
            outs.main.iter().enumerate().flat_map(move |(output_index, targets)| {
                targets.iter().map(move |t| Connection {
                    source: source.as_str(),
                    target: t.node.as_str(),
                    output_index,
                    input_index: t.index,
                })
            })
        })
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// The first trigger-typed node.
    pub fn trigger(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| is_trigger_type(&n.node_type))
    }

    /// Nodes that answer a webhook caller.
    pub fn respond_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| is_respond_type(&n.node_type))
    }

    /// Distinct targets reachable from `name` on `output_index`.
    pub fn targets(&self, name: &str, output_index: usize) -> Vec<&str> {
        self.connections
            .get(name)
            .and_then(|c| c.main.get(output_index))
            .map(|targets| targets.iter().map(|t| t.node.as_str()).collect())
            .unwrap_or_default()
    }

    /// Check every structural invariant, collecting all violations.
    pub fn check_invariants(&self) -> std::result::Result<(), Vec<Violation>> {
        let mut violations = Vec::new();

        if self.nodes.len() < 2 {
            violations.push(Violation::TooFewNodes {
                count: self.nodes.len(),
            });
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                violations.push(Violation::DuplicateName {
                    name: node.name.clone(),
                });
            }
            if !ids.insert(node.id.as_str()) {
                violations.push(Violation::DuplicateId {
                    id: node.id.clone(),
                });
            }
        }

        let triggers: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| is_trigger_type(&n.node_type))
            .collect();
        if triggers.len() != 1 {
            violations.push(Violation::TriggerCount {
                count: triggers.len(),
            });
        }

        for source in self.connections.keys() {
            if !names.contains(source.as_str()) {
                violations.push(Violation::DanglingReference {
                    name: source.clone(),
                });
            }
        }
        for (from, outs) in &self.connections {
            for target in outs.main.iter().flatten() {
                if target.kind != "main" {
                    violations.push(Violation::ConnectionKind {
                        from: from.clone(),
                        kind: target.kind.clone(),
                    });
                }
            }
        }

        let mut incoming: HashMap<&str, usize> = HashMap::new();
        for edge in self.edges() {
            if edge.source == edge.target {
                violations.push(Violation::SelfLoop {
                    name: edge.source.to_string(),
                });
            }
            if !names.contains(edge.target) {
                violations.push(Violation::DanglingReference {
                    name: edge.target.to_string(),
                });
            }
            *incoming.entry(edge.target).or_default() += 1;
        }

        for node in &self.nodes {
            let has_incoming = incoming.contains_key(node.name.as_str());
            if is_trigger_type(&node.node_type) {
                if has_incoming {
                    violations.push(Violation::TriggerHasIncoming {
                        name: node.name.clone(),
                    });
                }
            } else if !has_incoming {
                violations.push(Violation::Orphan {
                    name: node.name.clone(),
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, node_type: &str) -> Node {
        Node {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            type_version: 1,
            position: [0, 0],
            parameters: Map::new(),
        }
    }

    fn link(doc: &mut WorkflowDocument, from: &str, branches: &[&[&str]]) {
        doc.connections.insert(
            from.into(),
            NodeConnections {
                main: branches
                    .iter()
                    .map(|b| b.iter().map(|t| ConnectionTarget::main(*t)).collect())
                    .collect(),
            },
        );
    }

    fn two_node_doc() -> WorkflowDocument {
        let mut doc = WorkflowDocument {
            id: "w".into(),
            name: "Test".into(),
            nodes: vec![
                node("1", "Webhook", "n8n-nodes-base.webhook"),
                node("2", "Respond", "n8n-nodes-base.respondToWebhook"),
            ],
            connections: BTreeMap::new(),
            active: false,
            settings: WorkflowSettings::default(),
            meta: WorkflowMeta::default(),
        };
        link(&mut doc, "Webhook", &[&["Respond"]]);
        doc
    }

    #[test]
    fn valid_document_passes() {
        assert_eq!(two_node_doc().check_invariants(), Ok(()));
    }

    #[test]
    fn orphan_is_reported() {
        let mut doc = two_node_doc();
        doc.connections.clear();
        let errs = doc.check_invariants().unwrap_err();
        assert!(errs.contains(&Violation::Orphan {
            name: "Respond".into()
        }));
    }

    #[test]
    fn dangling_and_self_loop_are_reported() {
        let mut doc = two_node_doc();
        link(&mut doc, "Respond", &[&["Respond", "Ghost"]]);
        let errs = doc.check_invariants().unwrap_err();
        assert!(errs.contains(&Violation::SelfLoop {
            name: "Respond".into()
        }));
        assert!(errs.contains(&Violation::DanglingReference {
            name: "Ghost".into()
        }));
    }

    #[test]
    fn second_trigger_is_reported() {
        let mut doc = two_node_doc();
        doc.nodes.push(node("3", "Cron", "n8n-nodes-base.scheduleTrigger"));
        let errs = doc.check_invariants().unwrap_err();
        assert!(errs.contains(&Violation::TriggerCount { count: 2 }));
    }

    #[test]
    fn duplicate_names_are_reported() {
        let mut doc = two_node_doc();
        doc.nodes[1].name = "Webhook".into();
        let errs = doc.check_invariants().unwrap_err();
        assert!(errs.iter().any(|v| matches!(v, Violation::DuplicateName { .. })));
    }

    #[test]
    fn single_node_is_degenerate() {
        let mut doc = two_node_doc();
        doc.nodes.truncate(1);
        doc.connections.clear();
        let errs = doc.check_invariants().unwrap_err();
        assert!(errs.contains(&Violation::TooFewNodes { count: 1 }));
    }

    #[test]
    fn serialized_shape_matches_import_format() {
        let doc = two_node_doc();
        let json: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["type"], "n8n-nodes-base.webhook");
        assert_eq!(json["nodes"][0]["typeVersion"], 1);
        assert_eq!(json["connections"]["Webhook"]["main"][0][0]["node"], "Respond");
        assert_eq!(json["connections"]["Webhook"]["main"][0][0]["type"], "main");
        assert_eq!(json["connections"]["Webhook"]["main"][0][0]["index"], 0);
        assert_eq!(json["settings"]["executionOrder"], "v1");
        assert_eq!(json["active"], false);
        assert_eq!(json["meta"]["source"], "rules");
    }

    #[test]
    fn minimal_import_json_deserializes() {
        let raw = r#"{
            "id": "x", "name": "y",
            "nodes": [
                {"id": "1", "name": "A", "type": "n8n-nodes-base.manualTrigger", "position": [0, 0]}
            ],
            "connections": {}
        }"#;
        let doc: WorkflowDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.nodes[0].type_version, 1);
        assert_eq!(doc.settings.execution_order, "v1");
        assert_eq!(doc.meta.source, GenerationSource::Rules);
    }

    #[test]
    fn edges_flatten_branches() {
        let mut doc = two_node_doc();
        doc.nodes.push(node("3", "Other", "n8n-nodes-base.noOp"));
        link(&mut doc, "Webhook", &[&["Respond"], &["Other"]]);
        let edges: Vec<_> = doc.edges().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].output_index, 1);
        assert_eq!(doc.targets("Webhook", 1), vec!["Other"]);
    }
}
