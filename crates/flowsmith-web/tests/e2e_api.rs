//! End-to-end tests for the HTTP API.
//!
//! These tests spin up the **real** Axum server on an OS-assigned ephemeral
//! port and make actual HTTP requests via `reqwest`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use flowsmith_agent::{ValidationSection, WorkflowService};
use flowsmith_store::WorkflowCache;
use flowsmith_synth::{FixedSource, Synthesizer};
use flowsmith_web::{WebConfig, WebServer};

// ── helpers ──────────────────────────────────────────────────────────────────

/// Start the server on 127.0.0.1:0 and return its base URL.
async fn start_test_server() -> (String, tokio::task::JoinHandle<()>) {
    let synth = Synthesizer::with_uniqueness(Arc::new(FixedSource::new(
        DateTime::<Utc>::UNIX_EPOCH,
    )))
    .expect("synthesizer");
    let service = WorkflowService::new(Arc::new(synth)).with_cache(WorkflowCache::new(100, 60));

    let server = WebServer::new(
        WebConfig {
            bind_addr: "127.0.0.1".into(),
            port: 0,
        },
        Arc::new(service),
        ValidationSection::default(),
    );
    let (listener, addr) = server.bind().await.expect("bind to port 0");
    let base = format!("http://127.0.0.1:{}", addr.port());

    let handle = tokio::spawn(async move {
        server.serve(listener).await.ok();
    });

    (base, handle)
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("request failed");
    let status = resp.status().as_u16();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("{base}{path}"))
        .await
        .expect("request failed");
    let status = resp.status().as_u16();
    (status, resp.json().await.expect("invalid JSON"))
}

// ── POST /api/generate ───────────────────────────────────────────────────────

#[tokio::test]
async fn generate_returns_an_importable_workflow() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = post(
        &base,
        "/api/generate",
        json!({
            "description": "Send a Slack message when a new lead is added to Google Sheets",
            "triggerType": "webhook",
            "complexity": "medium"
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(json["cached"], false);
    assert!(json["quality"]["score"].as_u64().unwrap() > 0);

    let workflow = &json["workflow"];
    let nodes = workflow["nodes"].as_array().unwrap();
    assert_eq!(nodes[0]["type"], "n8n-nodes-base.webhook");
    assert_eq!(
        nodes.last().unwrap()["type"],
        "n8n-nodes-base.respondToWebhook"
    );
    let trigger = nodes[0]["name"].as_str().unwrap();
    assert_eq!(workflow["connections"][trigger]["main"][0][0]["type"], "main");
    assert_eq!(workflow["meta"]["source"], "rules");
}

#[tokio::test]
async fn repeated_generate_is_served_from_cache() {
    let (base, _srv) = start_test_server().await;
    let body = json!({
        "description": "Every morning email the sales report to the team",
        "triggerType": "schedule",
        "complexity": "simple"
    });

    let (_, first) = post(&base, "/api/generate", body.clone()).await;
    let (_, second) = post(&base, "/api/generate", body).await;

    assert_eq!(second["cached"], true);
    assert_eq!(first["workflow"], second["workflow"]);

    let (_, health) = get(&base, "/api/health").await;
    assert_eq!(health["cache"]["hits"], 1);
}

#[tokio::test]
async fn trigger_type_may_be_omitted() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = post(
        &base,
        "/api/generate",
        json!({
            "description": "alert if response time exceeds 2 seconds",
            "complexity": "complex"
        }),
    )
    .await;

    assert_eq!(status, 200);
    let types: Vec<&str> = json["workflow"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["type"].as_str())
        .collect();
    assert!(types.contains(&"n8n-nodes-base.if"));
}

#[tokio::test]
async fn short_description_is_rejected_with_field() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = post(
        &base,
        "/api/generate",
        json!({ "description": "  slack  ", "triggerType": "webhook" }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(json["field"], "description");
    assert!(json["error"].as_str().unwrap().contains("at least 10"));
}

#[tokio::test]
async fn missing_description_is_rejected() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = post(&base, "/api/generate", json!({ "complexity": "simple" })).await;

    assert_eq!(status, 422);
    assert_eq!(json["error"], "description is required");
}

#[tokio::test]
async fn unknown_complexity_is_a_client_error() {
    let (base, _srv) = start_test_server().await;
    let (status, _) = post(
        &base,
        "/api/generate",
        json!({ "description": "Send a Slack message every hour", "complexity": "extreme" }),
    )
    .await;

    assert!((400..500).contains(&status), "status {status}");
}

// ── POST /api/validate ───────────────────────────────────────────────────────

#[tokio::test]
async fn validate_scores_without_length_rules() {
    let (base, _srv) = start_test_server().await;

    let (status, empty) = post(&base, "/api/validate", json!({ "description": "" })).await;
    assert_eq!(status, 200);
    assert_eq!(empty["score"], 0);
    assert_eq!(empty["level"], "poor");

    let (_, rich) = post(
        &base,
        "/api/validate",
        json!({
            "description": "When a new order arrives in Shopify, send a Slack message \
                            and add a row to Google Sheets"
        }),
    )
    .await;
    assert!(rich["score"].as_u64().unwrap() >= 70);
    assert_eq!(rich["level"], "good");
}

// ── GET endpoints ────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = get(&base, "/api/health").await;

    assert_eq!(status, 200);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["cache"]["hits"], 0);
    assert_eq!(json["cache"]["misses"], 0);
}

#[tokio::test]
async fn catalog_lists_every_template() {
    let (base, _srv) = start_test_server().await;
    let (status, json) = get(&base, "/api/catalog").await;

    assert_eq!(status, 200);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 31);
    let slack = entries.iter().find(|e| e["key"] == "slack").unwrap();
    assert_eq!(slack["type"], "n8n-nodes-base.slack");
    assert_eq!(slack["category"], "slack");
    assert!(slack["name"].is_string());
}
