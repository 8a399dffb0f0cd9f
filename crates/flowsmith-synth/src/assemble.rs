//! Workflow assembly: named, identified document around nodes and edges.

use std::fmt::Write as _;
use std::sync::Arc;

use ring::digest;
use serde_json::{Map, Value};

use crate::catalog::NodeTemplate;
use crate::connect::ConnectionMap;
use crate::document::{Node, WorkflowDocument, WorkflowMeta, WorkflowSettings};
use crate::params::content_words;
use crate::selector::NodeInstance;
use crate::uniqueness::UniquenessSource;

const NAME_WORDS: usize = 5;
const SUFFIX_LEN: usize = 6;
const FALLBACK_NAME: &str = "Generated Workflow";

/// Lower-case hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, data);
    hash.as_ref()
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Human-readable phrase for a description: its first few content words
/// in title case.
pub fn title_phrase(description: &str) -> String {
    let words = content_words(description, NAME_WORDS);
    if words.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stamps ids, names and timestamps onto synthesized parts.
#[derive(Clone)]
pub struct Assembler {
    uniqueness: Arc<dyn UniquenessSource>,
}

impl Assembler {
    pub fn new(uniqueness: Arc<dyn UniquenessSource>) -> Self {
        Self { uniqueness }
    }

    /// A concrete node with a fresh id.
    pub fn node(
        &self,
        instance: &NodeInstance,
        template: &NodeTemplate,
        parameters: Map<String, Value>,
    ) -> Node {
        Node {
            id: self.uniqueness.next_id().to_string(),
            name: instance.name.clone(),
            node_type: template.node_type.to_string(),
            type_version: template.type_version,
            position: instance.position,
            parameters,
        }
    }

    /// Wrap nodes and connections into a document.
    ///
    /// The name is `"<phrase> #<suffix>"`, where the suffix hashes the seed
    /// with the current instant and the document id, so repeated requests
    /// with the same text get distinct names.
    pub fn assemble(
        &self,
        name_seed: &str,
        nodes: Vec<Node>,
        connections: ConnectionMap,
        mut meta: WorkflowMeta,
    ) -> WorkflowDocument {
        let now = self.uniqueness.now();
        let id = self.uniqueness.next_id().to_string();

        let salt = format!(
            "{name_seed}\u{1f}{}\u{1f}{id}",
            now.timestamp_nanos_opt().unwrap_or_default()
        );
        let suffix = &sha256_hex(salt.as_bytes())[..SUFFIX_LEN];
        let name = format!("{} #{suffix}", title_phrase(name_seed));

        meta.generated_at = now.to_rfc3339();

        WorkflowDocument {
            id,
            name,
            nodes,
            connections,
            active: false,
            settings: WorkflowSettings::default(),
            meta,
        }
    }
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler").finish_non_exhaustive()
    }
}
