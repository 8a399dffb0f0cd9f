//! Node selection: intent in, ordered node instances out.
//!
//! The selector decides *which* nodes a workflow has and in what order.
//! It always emits exactly one trigger first, and for webhook triggers a
//! single "respond to caller" node last.  Both are reserved before any
//! service node is placed, so the complexity ceiling can never squeeze
//! them out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use flowsmith_intent::{Intent, ServiceTag, WorkflowType};

use crate::catalog::{Catalog, NodeKind};
use crate::request::{Complexity, TriggerKind};

/// Horizontal origin of the first node.
const ORIGIN_X: i32 = 240;
/// Horizontal distance between columns.
const COLUMN_WIDTH: i32 = 220;
const ROW_Y: i32 = 300;
const BRANCH_OFFSET_Y: i32 = 100;

/// Slots a conditional branch costs: the `If` node and its false-branch
/// sink.  The true branch reuses a service node.
const BRANCH_COST: usize = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A node stamped out of a template, named and positioned but without
/// parameters yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInstance {
    pub kind: NodeKind,
    /// Unique within the selection.
    pub name: String,
    pub position: [i32; 2],
}

/// The outcome of [`Selector::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The trigger actually used, explicit or inferred.
    pub trigger: TriggerKind,
    /// Canonical order; `nodes[0]` is the trigger.
    pub nodes: Vec<NodeInstance>,
}

impl Selection {
    pub fn has_respond_node(&self) -> bool {
        self.nodes
            .last()
            .is_some_and(|n| n.kind == NodeKind::RespondToWebhook)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Selector {
    catalog: Arc<Catalog>,
}

impl Selector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Default trigger when the caller did not choose one.
    ///
    /// A trigger hint in the text wins (first mention); otherwise the
    /// workflow type decides.
    pub fn infer_trigger(intent: &Intent) -> TriggerKind {
        let hint = intent.services.iter().find_map(|tag| match tag {
            ServiceTag::Schedule => Some(TriggerKind::Schedule),
            ServiceTag::Webhook => Some(TriggerKind::Webhook),
            _ => None,
        });
        if let Some(trigger) = hint {
            return trigger;
        }

        match intent.workflow_type {
            WorkflowType::Monitoring | WorkflowType::DataProcessing => TriggerKind::Schedule,
            WorkflowType::Integration | WorkflowType::Ecommerce | WorkflowType::Notification => {
                TriggerKind::Webhook
            }
            WorkflowType::Automation | WorkflowType::General => TriggerKind::Manual,
        }
    }

    /// Pick the ordered node list for one request.
    ///
    /// The node count never exceeds `complexity.max_nodes()`.
    pub fn select(
        &self,
        intent: &Intent,
        trigger: Option<TriggerKind>,
        complexity: Complexity,
    ) -> Selection {
        let trigger = trigger.unwrap_or_else(|| Self::infer_trigger(intent));
        let responds = trigger == TriggerKind::Webhook;

        let reserved = 1 + usize::from(responds);
        let room = complexity.max_nodes().saturating_sub(reserved);

        let mut services = self.service_kinds(intent);
        if services.is_empty() {
            services.push(NodeKind::ProcessData);
        }

        let wants_branch = intent.conditional || complexity.always_branches();
        let branch = wants_branch && room > BRANCH_COST;
        let body_room = room - if branch { BRANCH_COST } else { 0 };
        if services.len() > body_room {
            debug!(
                dropped = services.len() - body_room,
                complexity = %complexity,
                "service nodes over the complexity ceiling"
            );
            services.truncate(body_room.max(1));
        }

        let used = reserved + services.len() + if branch { BRANCH_COST } else { 0 };
        let wanted = complexity
            .target_nodes()
            .min(complexity.max_nodes())
            .saturating_sub(used);
        let padding: Vec<NodeKind> = NodeKind::PADDING.into_iter().take(wanted).collect();

        let mut kinds = Vec::with_capacity(used + padding.len());
        kinds.push(NodeKind::trigger(trigger));
        kinds.extend(padding);
        if branch {
            // `services` is never empty here: the fallback above guarantees
            // one entry and truncation keeps at least one.
            let true_branch = services.pop().unwrap_or(NodeKind::ProcessData);
            kinds.extend(services);
            kinds.push(NodeKind::If);
            kinds.push(true_branch);
            kinds.push(NodeKind::NoOp);
        } else {
            kinds.extend(services);
        }
        if responds {
            kinds.push(NodeKind::RespondToWebhook);
        }

        let nodes = self.instantiate(&kinds);
        debug!(
            trigger = %trigger,
            complexity = %complexity,
            nodes = nodes.len(),
            branch,
            "nodes selected"
        );
        Selection { trigger, nodes }
    }

    /// Catalog kinds for the detected tags: unknown tags skipped, one node
    /// per category, ordered by stage and then by first mention.
    fn service_kinds(&self, intent: &Intent) -> Vec<NodeKind> {
        let mut seen = HashSet::new();
        let mut picked: Vec<_> = intent
            .services
            .iter()
            .filter_map(|tag| {
                let template = self.catalog.lookup(*tag);
                if template.is_none() && !tag.is_trigger_hint() {
                    debug!(tag = %tag, "no template for tag, skipped");
                }
                template
            })
            .filter(|template| seen.insert(template.category))
            .map(|template| (template.stage, template.kind))
            .collect();
        picked.sort_by_key(|(stage, _)| *stage);
        picked.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Give every kind a unique name and a display position.
    ///
    /// The two targets of an `If` share a column, one row above and one
    /// below the main row.
    fn instantiate(&self, kinds: &[NodeKind]) -> Vec<NodeInstance> {
        let mut registry = NameRegistry::default();
        let mut nodes = Vec::with_capacity(kinds.len());
        let mut column = 0;
        let mut branch_row: Option<usize> = None;

        for kind in kinds {
            let x = ORIGIN_X + COLUMN_WIDTH * column;
            let y = match branch_row {
                Some(0) => ROW_Y - BRANCH_OFFSET_Y,
                Some(_) => ROW_Y + BRANCH_OFFSET_Y,
                None => ROW_Y,
            };
            nodes.push(NodeInstance {
                kind: *kind,
                name: registry.claim(self.catalog.template(*kind).name),
                position: [x, y],
            });

            branch_row = match (branch_row, kind.is_conditional()) {
                (_, true) => {
                    column += 1;
                    Some(0)
                }
                (Some(0), _) => Some(1),
                _ => {
                    column += 1;
                    None
                }
            };
        }
        nodes
    }
}

/// Hands out node names, suffixing repeats with " 2", " 3", ...
#[derive(Debug, Default)]
struct NameRegistry {
    counts: HashMap<String, usize>,
}

impl NameRegistry {
    fn claim(&mut self, base: &str) -> String {
        loop {
            let count = self.counts.entry(base.to_string()).or_insert(0);
            *count += 1;
            let candidate = if *count == 1 {
                base.to_string()
            } else {
                format!("{base} {count}")
            };
            // A suffixed candidate may collide with a literal base name.
            if *count == 1 || !self.counts.contains_key(&candidate) {
                self.counts.entry(candidate.clone()).or_insert(1);
                return candidate;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
