//! The synthesis pipeline facade.
//!
//! [`Synthesizer`] owns the shared, read-only pieces (keyword automata,
//! catalog) and the injected uniqueness source, and runs
//! extract -> select -> fill -> connect -> assemble for each request.
//! It holds no per-request state and is cheap to share behind an `Arc`.

use std::sync::Arc;

use tracing::info;

use flowsmith_intent::{Intent, IntentExtractor};

use crate::assemble::Assembler;
use crate::catalog::Catalog;
use crate::connect::connect;
use crate::document::{GenerationSource, WorkflowDocument, WorkflowMeta};
use crate::error::Result;
use crate::params::{FillContext, ParameterFiller};
use crate::request::GenerationRequest;
use crate::selector::Selector;
use crate::uniqueness::{SystemSource, UniquenessSource};

#[derive(Debug, Clone)]
pub struct Synthesizer {
    extractor: Arc<IntentExtractor>,
    catalog: Arc<Catalog>,
    selector: Selector,
    filler: ParameterFiller,
    assembler: Assembler,
}

impl Synthesizer {
    pub fn new(
        extractor: Arc<IntentExtractor>,
        catalog: Arc<Catalog>,
        uniqueness: Arc<dyn UniquenessSource>,
    ) -> Self {
        Self {
            extractor,
            selector: Selector::new(Arc::clone(&catalog)),
            filler: ParameterFiller::new(Arc::clone(&catalog)),
            assembler: Assembler::new(uniqueness),
            catalog,
        }
    }

    /// Built-in dictionaries and catalog with the system clock.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(
            Arc::new(IntentExtractor::builtin()?),
            Arc::new(Catalog::builtin()),
            Arc::new(SystemSource),
        ))
    }

    /// Built-in dictionaries and catalog with a caller-chosen uniqueness
    /// source.
    pub fn with_uniqueness(uniqueness: Arc<dyn UniquenessSource>) -> Result<Self> {
        Ok(Self::new(
            Arc::new(IntentExtractor::builtin()?),
            Arc::new(Catalog::builtin()),
            uniqueness,
        ))
    }

    pub fn extractor(&self) -> &Arc<IntentExtractor> {
        &self.extractor
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Produce a connected workflow for any request.  Never fails.
    pub fn synthesize(&self, request: &GenerationRequest) -> WorkflowDocument {
        let intent = self.extractor.extract(&request.description);

        let selection = self
            .selector
            .select(&intent, request.trigger_type, request.complexity);

        let ctx = FillContext::new(&request.description, selection.has_respond_node());
        let nodes = selection
            .nodes
            .iter()
            .map(|instance| {
                let template = self.catalog.template(instance.kind);
                let parameters = self.filler.fill(instance, &ctx);
                self.assembler.node(instance, template, parameters)
            })
            .collect();

        let connections = connect(&selection.nodes);
        let meta = meta_for(&intent, &selection.trigger.to_string(), request);

        let doc = self
            .assembler
            .assemble(&request.description, nodes, connections, meta);
        info!(
            id = %doc.id,
            nodes = doc.nodes.len(),
            trigger = %selection.trigger,
            complexity = %request.complexity,
            "workflow synthesized"
        );
        doc
    }
}

fn meta_for(intent: &Intent, trigger: &str, request: &GenerationRequest) -> WorkflowMeta {
    WorkflowMeta {
        services_detected: intent.services.iter().map(|t| t.to_string()).collect(),
        workflow_type: intent.workflow_type.to_string(),
        trigger_type: trigger.to_string(),
        complexity: request.complexity.to_string(),
        generated_at: String::new(),
        source: GenerationSource::Rules,
        scores: intent
            .confidence
            .iter()
            .map(|(ty, score)| (ty.to_string(), *score))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::request::{Complexity, TriggerKind};
    use crate::uniqueness::FixedSource;

    fn fixed() -> Synthesizer {
        Synthesizer::with_uniqueness(Arc::new(FixedSource::new(DateTime::<Utc>::UNIX_EPOCH)))
            .unwrap()
    }

    #[test]
    fn synthesizer_is_debug() {
        let rendered = format!("{:?}", fixed());
        assert!(rendered.contains("IntentExtractor"));
    }

    #[test]
    fn meta_records_inputs() {
        let doc = fixed().synthesize(&GenerationRequest::new(
            "Send a Slack message when a new lead is added to Google Sheets",
            TriggerKind::Webhook,
            Complexity::Medium,
        ));
        assert_eq!(doc.meta.services_detected, vec!["slack", "google_sheets"]);
        assert_eq!(doc.meta.trigger_type, "webhook");
        assert_eq!(doc.meta.complexity, "medium");
        assert_eq!(doc.meta.source, GenerationSource::Rules);
        assert!(!doc.meta.generated_at.is_empty());
    }

    #[test]
    fn fixed_source_makes_ids_assertable() {
        let doc = fixed().synthesize(&GenerationRequest::new(
            "",
            TriggerKind::Manual,
            Complexity::Simple,
        ));
        // Node ids are drawn first, the document id last.
        assert_eq!(doc.nodes[0].id, "00000000-0000-0000-0000-000000000001");
        assert_eq!(
            doc.id,
            format!("00000000-0000-0000-0000-{:012x}", doc.nodes.len() + 1)
        );
        assert!(doc.name.starts_with("Generated Workflow #"));
    }

    #[test]
    fn inferred_trigger_is_recorded() {
        let doc = fixed().synthesize(&GenerationRequest {
            description: "every day at 8am export orders to a spreadsheet".into(),
            trigger_type: None,
            complexity: Complexity::Medium,
        });
        assert_eq!(doc.meta.trigger_type, "schedule");
        assert_eq!(doc.nodes[0].node_type, "n8n-nodes-base.scheduleTrigger");
        assert_eq!(
            doc.nodes[0].parameters["rule"]["interval"][0]["triggerAtHour"],
            8
        );
    }
}
