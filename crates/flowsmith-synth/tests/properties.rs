//! Structural properties of synthesized workflows.
//!
//! Every document the pipeline produces, for any description, trigger and
//! complexity, must be a single-trigger connected graph.  These tests run
//! the whole pipeline over a spread of inputs and check the invariants on
//! the resulting documents.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use flowsmith_synth::{
    Complexity, FixedSource, GenerationRequest, Synthesizer, TriggerKind, WorkflowDocument,
    is_respond_type, is_trigger_type,
};

const DESCRIPTIONS: &[&str] = &[
    "Send a Slack message when a new lead is added to Google Sheets",
    "",
    "alert if response time exceeds 2 seconds",
    "Every morning at 7am fetch https://api.example.com/stats and email the report to ops@example.com",
    "When a Shopify order is paid, create a HubSpot contact, add a row to the orders sheet, \
     post to #sales on Slack, send an SMS to +15551234567 and open a Trello card",
    "Summarize new GitHub issues with OpenAI and save them in Notion",
    "sync mysql and postgres and mongodb databases",
    "xyzzy plugh",
];

const TRIGGERS: [TriggerKind; 3] = [
    TriggerKind::Webhook,
    TriggerKind::Schedule,
    TriggerKind::Manual,
];
const TIERS: [Complexity; 3] = [Complexity::Simple, Complexity::Medium, Complexity::Complex];

// ── helpers ──────────────────────────────────────────────────────────────────

fn synthesizer() -> Synthesizer {
    Synthesizer::builtin().expect("builtin synthesizer")
}

fn generate(
    synth: &Synthesizer,
    description: &str,
    trigger: TriggerKind,
    complexity: Complexity,
) -> WorkflowDocument {
    synth.synthesize(&GenerationRequest::new(description, trigger, complexity))
}

fn every_document() -> Vec<(String, WorkflowDocument)> {
    let synth = synthesizer();
    let mut docs = Vec::new();
    for description in DESCRIPTIONS {
        for trigger in TRIGGERS {
            for complexity in TIERS {
                let label = format!("{description:?} / {trigger} / {complexity}");
                docs.push((label, generate(&synth, description, trigger, complexity)));
            }
        }
    }
    docs
}

fn incoming(doc: &WorkflowDocument, name: &str) -> usize {
    doc.edges().filter(|e| e.target == name).count()
}

// ═══════════════════════════════════════════════════════════════════════
//  Invariants over the whole input grid
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn every_document_passes_the_invariant_checker() {
    for (label, doc) in every_document() {
        assert_eq!(doc.check_invariants(), Ok(()), "{label}");
    }
}

#[test]
fn connectivity_every_non_trigger_node_is_reached() {
    for (label, doc) in every_document() {
        let names: HashSet<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        for edge in doc.edges() {
            assert!(names.contains(edge.source), "{label}: {}", edge.source);
            assert!(names.contains(edge.target), "{label}: {}", edge.target);
        }
        for node in doc.nodes.iter().filter(|n| !is_trigger_type(&n.node_type)) {
            assert!(incoming(&doc, &node.name) >= 1, "{label}: orphan {}", node.name);
        }
    }
}

#[test]
fn single_trigger_without_incoming_edges() {
    for (label, doc) in every_document() {
        let triggers: Vec<_> = doc
            .nodes
            .iter()
            .filter(|n| is_trigger_type(&n.node_type))
            .collect();
        assert_eq!(triggers.len(), 1, "{label}");
        assert_eq!(triggers[0].name, doc.nodes[0].name, "{label}: trigger first");
        assert_eq!(incoming(&doc, &triggers[0].name), 0, "{label}");
    }
}

#[test]
fn no_self_loops() {
    for (label, doc) in every_document() {
        for edge in doc.edges() {
            assert_ne!(edge.source, edge.target, "{label}");
        }
    }
}

#[test]
fn node_count_stays_under_the_tier_ceiling() {
    for (label, doc) in every_document() {
        let tier: Complexity = doc.meta.complexity.parse().unwrap();
        assert!(doc.nodes.len() <= tier.max_nodes(), "{label}: {}", doc.nodes.len());
        assert!(doc.nodes.len() >= 2, "{label}");
    }
}

#[test]
fn complexity_is_monotonic() {
    let synth = synthesizer();
    for description in DESCRIPTIONS {
        for trigger in TRIGGERS {
            let counts: Vec<usize> = TIERS
                .iter()
                .map(|tier| generate(&synth, description, trigger, *tier).nodes.len())
                .collect();
            assert!(
                counts[0] <= counts[1] && counts[1] <= counts[2],
                "{description:?} / {trigger}: {counts:?}"
            );
        }
    }
}

#[test]
fn webhook_flows_end_in_exactly_one_respond_node() {
    for (label, doc) in every_document() {
        let responds = doc.respond_nodes().count();
        if doc.meta.trigger_type == "webhook" {
            assert_eq!(responds, 1, "{label}");
            let last = doc.nodes.last().unwrap();
            assert!(is_respond_type(&last.node_type), "{label}: respond is last");
            assert!(!doc.connections.contains_key(&last.name), "{label}: respond is terminal");
        } else {
            assert_eq!(responds, 0, "{label}");
        }
    }
}

#[test]
fn identical_inputs_share_shape_but_not_identity() {
    let synth = synthesizer();
    for description in DESCRIPTIONS {
        let a = generate(&synth, description, TriggerKind::Webhook, Complexity::Medium);
        let b = generate(&synth, description, TriggerKind::Webhook, Complexity::Medium);

        assert_eq!(a.nodes.len(), b.nodes.len());
        assert_eq!(a.meta.services_detected, b.meta.services_detected);
        let types = |d: &WorkflowDocument| -> Vec<String> {
            d.nodes.iter().map(|n| n.node_type.clone()).collect()
        };
        assert_eq!(types(&a), types(&b));
        assert_eq!(a.connections, b.connections);

        assert_ne!(a.id, b.id);
        assert_ne!(a.name, b.name);
    }
}

#[test]
fn fixed_uniqueness_source_makes_output_reproducible() {
    let make = || {
        let synth = Synthesizer::with_uniqueness(Arc::new(FixedSource::new(
            DateTime::<Utc>::UNIX_EPOCH,
        )))
        .unwrap();
        generate(&synth, DESCRIPTIONS[0], TriggerKind::Webhook, Complexity::Medium)
    };
    assert_eq!(make(), make());
}

// ═══════════════════════════════════════════════════════════════════════
//  Scenarios
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn scenario_slack_lead_from_google_sheets() {
    let doc = generate(
        &synthesizer(),
        "Send a Slack message when a new lead is added to Google Sheets",
        TriggerKind::Webhook,
        Complexity::Medium,
    );

    let tags: HashSet<&str> = doc.meta.services_detected.iter().map(String::as_str).collect();
    assert_eq!(tags, HashSet::from(["slack", "google_sheets"]));
    assert!((3..=8).contains(&doc.nodes.len()), "{}", doc.nodes.len());
    assert_eq!(doc.nodes[0].node_type, "n8n-nodes-base.webhook");
    assert!(doc.nodes.iter().any(|n| n.node_type == "n8n-nodes-base.slack"));
    assert!(doc.nodes.iter().any(|n| n.node_type == "n8n-nodes-base.googleSheets"));
    assert_eq!(
        doc.nodes.last().unwrap().node_type,
        "n8n-nodes-base.respondToWebhook"
    );
    assert_eq!(doc.check_invariants(), Ok(()));
}

#[test]
fn scenario_empty_description_simple_webhook() {
    let doc = generate(&synthesizer(), "", TriggerKind::Webhook, Complexity::Simple);
    assert!(doc.nodes.len() >= 2);
    assert_eq!(doc.check_invariants(), Ok(()));
    assert!(doc.nodes.iter().any(|n| n.node_type == "n8n-nodes-base.code"));
    assert_eq!(doc.meta.workflow_type, "general");
    assert!(doc.meta.services_detected.is_empty());
}

#[test]
fn scenario_threshold_alert_branches_two_ways() {
    let doc = synthesizer().synthesize(&GenerationRequest {
        description: "alert if response time exceeds 2 seconds".into(),
        trigger_type: None,
        complexity: Complexity::Complex,
    });

    let condition = doc
        .nodes
        .iter()
        .find(|n| n.node_type == "n8n-nodes-base.if")
        .expect("conditional node");

    let on_true = doc.targets(&condition.name, 0);
    let on_false = doc.targets(&condition.name, 1);
    assert_eq!(on_true.len(), 1);
    assert_eq!(on_false.len(), 1);
    assert_ne!(on_true[0], on_false[0]);

    let rule = &condition.parameters["conditions"]["number"][0];
    assert_eq!(rule["value1"], "={{ $json.responseTime }}");
    assert_eq!(rule["operation"], "larger");
    assert_eq!(rule["value2"], 2);
    assert_eq!(doc.check_invariants(), Ok(()));
}

#[test]
fn serialized_document_has_import_shape() {
    let doc = generate(&synthesizer(), DESCRIPTIONS[0], TriggerKind::Webhook, Complexity::Medium);
    let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

    for key in ["id", "name", "nodes", "connections", "meta"] {
        assert!(json.get(key).is_some(), "missing `{key}`");
    }
    let trigger = &json["nodes"][0]["name"];
    let first_branch = &json["connections"][trigger.as_str().unwrap()]["main"][0];
    assert!(first_branch.is_array());
    assert_eq!(first_branch[0]["type"], "main");
    assert!(json["nodes"][0]["position"].is_array());
    assert!(json["meta"]["services_detected"].is_array());
    assert!(json["meta"]["workflow_type"].is_string());
}
