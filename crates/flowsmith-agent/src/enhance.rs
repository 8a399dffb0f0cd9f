//! Optional AI enhancement of rule-based workflows.
//!
//! An [`Enhancer`] receives the request and the deterministic baseline and
//! proposes a replacement document.  The proposal is untrusted: callers
//! pass it through [`validate_candidate`] and keep the baseline unless the
//! whole candidate passes.

use async_trait::async_trait;
use tracing::debug;

use flowsmith_synth::{GenerationRequest, GenerationSource, WorkflowDocument, is_respond_type};

use crate::error::{AgentError, Result};
use crate::llm::{ChatRequest, LlmClient, Message};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A second stage that may rewrite a rule-based workflow.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Propose an improved document.  The result is validated by the caller.
    async fn enhance(
        &self,
        request: &GenerationRequest,
        baseline: &WorkflowDocument,
    ) -> Result<WorkflowDocument>;
}

// ---------------------------------------------------------------------------
// LLM-backed enhancer
// ---------------------------------------------------------------------------

const SYSTEM_PROMPT: &str = "\
You improve automation workflows for an n8n-compatible platform.
You receive a user's description and a draft workflow as JSON.
Return ONE JSON object with the same top-level shape as the draft:
{\"id\", \"name\", \"nodes\", \"connections\", \"meta\"}.

Rules:
- Keep exactly one trigger node, of the same type as the draft's trigger, first in `nodes`.
- Every other node must have at least one incoming connection.
- `connections` is keyed by source node NAME; each `main` entry is a list of
  output branches, each a list of {\"node\": <target name>, \"type\": \"main\", \"index\": 0}.
- Never connect a node to itself.  Node names and ids must be unique.
- If the draft ends with a respondToWebhook node, keep exactly one, last, with no outgoing
  connections.
- Do not add more nodes than the limit given below.
- Fill node `parameters` with concrete values taken from the description.

Respond with the JSON object only.";

/// Sends the baseline to an LLM and parses its rewrite.
#[derive(Debug, Clone)]
pub struct LlmEnhancer {
    client: LlmClient,
}

impl LlmEnhancer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn build_user_prompt(request: &GenerationRequest, baseline_json: &str) -> String {
        format!(
            "Description:\n{}\n\nNode limit: {}\n\nDraft workflow:\n{baseline_json}",
            request.description.trim(),
            request.complexity.max_nodes(),
        )
    }
}

#[async_trait]
impl Enhancer for LlmEnhancer {
    fn name(&self) -> &str {
        self.client.provider().as_str()
    }

    async fn enhance(
        &self,
        request: &GenerationRequest,
        baseline: &WorkflowDocument,
    ) -> Result<WorkflowDocument> {
        let baseline_json = baseline.to_json()?;
        let mut chat = ChatRequest::new(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(Self::build_user_prompt(request, &baseline_json)),
        ]);
        chat.temperature = Some(0.2);

        let text = self.client.chat(&chat).await?;
        debug!(chars = text.len(), model = self.client.model(), "enhancement received");
        parse_candidate(&text)
    }
}

/// Parse an LLM answer into a document, tolerating markdown fences.
pub fn parse_candidate(text: &str) -> Result<WorkflowDocument> {
    let json = extract_json_block(text);
    serde_json::from_str(json).map_err(|e| AgentError::LlmParseFailed {
        reason: format!("response is not a workflow document: {e}"),
    })
}

fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body = &trimmed[start + fence.len()..];
            if let Some(end) = body.find("```") {
                return body[..end].trim();
            }
        }
    }

    trimmed
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Accept `candidate` only if it satisfies every structural rule the
/// baseline satisfies.
///
/// On success the candidate keeps its nodes and connections but takes the
/// baseline's identity, settings and metadata, with `meta.source` set to
/// [`GenerationSource::Ai`].
pub fn validate_candidate(
    request: &GenerationRequest,
    baseline: &WorkflowDocument,
    candidate: WorkflowDocument,
) -> Result<WorkflowDocument> {
    if let Err(violations) = candidate.check_invariants() {
        let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(rejected(reasons.join("; ")));
    }

    let expected = baseline
        .trigger()
        .map(|n| n.node_type.as_str())
        .unwrap_or_default();
    let actual = candidate
        .trigger()
        .map(|n| n.node_type.as_str())
        .unwrap_or_default();
    if actual != expected {
        return Err(rejected(format!(
            "trigger `{actual}` does not match requested `{expected}`"
        )));
    }
    if candidate.nodes.first().map(|n| n.node_type.as_str()) != Some(expected) {
        return Err(rejected("trigger is not the first node".into()));
    }

    let ceiling = request.complexity.max_nodes();
    if candidate.nodes.len() > ceiling {
        return Err(rejected(format!(
            "{} nodes exceed the {} limit of {ceiling}",
            candidate.nodes.len(),
            request.complexity,
        )));
    }

    let wants_respond = baseline.respond_nodes().next().is_some();
    let responds = candidate.respond_nodes().count();
    if wants_respond {
        let last = candidate.nodes.last();
        let last_responds = last.is_some_and(|n| is_respond_type(&n.node_type));
        let terminal = last.is_some_and(|n| !candidate.connections.contains_key(&n.name));
        if responds != 1 || !last_responds || !terminal {
            return Err(rejected(
                "webhook flow must end in exactly one terminal respond node".into(),
            ));
        }
    } else if responds != 0 {
        return Err(rejected("respond node in a flow without a webhook".into()));
    }

    let mut accepted = candidate;
    accepted.id.clone_from(&baseline.id);
    accepted.name.clone_from(&baseline.name);
    accepted.active = baseline.active;
    accepted.settings = baseline.settings.clone();
    accepted.meta = baseline.meta.clone();
    accepted.meta.source = GenerationSource::Ai;
    Ok(accepted)
}

fn rejected(reason: String) -> AgentError {
    AgentError::EnhancementRejected { reason }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
