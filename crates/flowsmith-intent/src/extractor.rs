//! Intent extractor: description text in, [`Intent`] out.
//!
//! Matching runs every dictionary through a single Aho-Corasick automaton
//! per dictionary family, then discards hits that do not sit on word
//! boundaries.  The automata are compiled once in [`IntentExtractor::new`];
//! [`IntentExtractor::extract`] is a pure function over its input and never
//! fails.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntentError, Result};
use crate::keywords::{KeywordConfig, ServiceTag, WorkflowType};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The structured reading of a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Detected service tags, deduplicated, in order of first mention.
    pub services: Vec<ServiceTag>,

    /// The winning workflow classification, or [`WorkflowType::General`].
    pub workflow_type: WorkflowType,

    /// Weighted score per workflow type that scored at least one point.
    pub confidence: BTreeMap<WorkflowType, u32>,

    /// Whether the text asks for a branch ("if", "exceeds 2", ...).
    pub conditional: bool,
}

impl Intent {
    /// The intent of an empty or unrecognised description.
    pub fn empty() -> Self {
        Self {
            services: Vec::new(),
            workflow_type: WorkflowType::General,
            confidence: BTreeMap::new(),
            conditional: false,
        }
    }

    /// Detected tags as a set.
    pub fn tags(&self) -> BTreeSet<ServiceTag> {
        self.services.iter().copied().collect()
    }

    /// Whether `tag` was detected.
    pub fn has(&self, tag: ServiceTag) -> bool {
        self.services.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// A compiled dictionary: one automaton over all phrases, plus the value
/// each phrase maps to (indexed by pattern id).
#[derive(Debug)]
struct KeywordMatcher<T> {
    automaton: Option<AhoCorasick>,
    values: Vec<T>,
}

impl<T: Copy> KeywordMatcher<T> {
    fn build(entries: Vec<(String, T)>) -> Result<Self> {
        let entries: Vec<(String, T)> = entries
            .into_iter()
            .map(|(phrase, value)| (phrase.trim().to_lowercase(), value))
            .filter(|(phrase, _)| !phrase.is_empty())
            .collect();

        if entries.is_empty() {
            return Ok(Self {
                automaton: None,
                values: Vec::new(),
            });
        }

        let phrases: Vec<&str> = entries.iter().map(|(p, _)| p.as_str()).collect();
        let automaton = AhoCorasick::new(&phrases).map_err(|e| IntentError::MatcherBuild {
            reason: e.to_string(),
        })?;
        tracing::trace!(count = phrases.len(), "keyword automaton built");

        Ok(Self {
            automaton: Some(automaton),
            values: entries.into_iter().map(|(_, v)| v).collect(),
        })
    }

    /// All boundary-respecting hits in `lowered`, as `(start, value)` pairs
    /// sorted by start offset.
    fn find(&self, lowered: &str) -> Vec<(usize, T)> {
        let Some(ac) = &self.automaton else {
            return Vec::new();
        };

        let mut hits: Vec<(usize, T)> = ac
            .find_overlapping_iter(lowered)
            .filter(|m| on_word_boundary(lowered, m.start(), m.end()))
            .map(|m| (m.start(), self.values[m.pattern().as_usize()]))
            .collect();
        hits.sort_by_key(|(start, _)| *start);
        hits
    }
}

/// A hit counts only if it starts a word and ends one, allowing a plural
/// `s`/`es` tail ("sheet" inside "sheets" but not inside "sheetal").
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let starts_word = text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric());
    if !starts_word {
        return false;
    }

    let tail = text[end..]
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("");
    matches!(tail, "" | "s" | "es")
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Compiled form of a [`KeywordConfig`].
///
/// Cheap to share behind an `Arc`; holds no mutable state.
#[derive(Debug)]
pub struct IntentExtractor {
    config: Arc<KeywordConfig>,
    services: KeywordMatcher<ServiceTag>,
    workflow_types: KeywordMatcher<(WorkflowType, u32)>,
    conditionals: Vec<Regex>,
}

impl IntentExtractor {
    /// Compile the given configuration.
    ///
    /// A service entry without any non-blank keyword is rejected.
    pub fn new(config: Arc<KeywordConfig>) -> Result<Self> {
        if let Some(entry) = config
            .services
            .iter()
            .find(|s| s.keywords.iter().all(|k| k.trim().is_empty()))
        {
            return Err(IntentError::InvalidConfig {
                reason: format!("service `{}` has no keywords", entry.tag),
            });
        }

        let services = KeywordMatcher::build(
            config
                .services
                .iter()
                .flat_map(|s| s.keywords.iter().map(move |k| (k.clone(), s.tag)))
                .collect(),
        )?;

        let workflow_types = KeywordMatcher::build(
            config
                .workflow_types
                .iter()
                .flat_map(|t| {
                    t.keywords
                        .iter()
                        .map(move |k| (k.phrase.clone(), (t.workflow_type, k.weight)))
                })
                .collect(),
        )?;

        let conditionals = config
            .conditional_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| IntentError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            services,
            workflow_types,
            conditionals,
        })
    }

    /// Compile the builtin dictionaries.
    pub fn builtin() -> Result<Self> {
        Self::new(Arc::new(KeywordConfig::builtin()))
    }

    /// The configuration this extractor was compiled from.
    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Read a description.
    ///
    /// Empty or unrecognised text yields no tags and the
    /// [`WorkflowType::General`] classification.
    pub fn extract(&self, description: &str) -> Intent {
        let lowered = description.trim().to_lowercase();
        if lowered.is_empty() {
            return Intent::empty();
        }

        let mut services = Vec::new();
        for (_, tag) in self.services.find(&lowered) {
            if !services.contains(&tag) {
                services.push(tag);
            }
        }

        let mut confidence: BTreeMap<WorkflowType, u32> = BTreeMap::new();
        for (_, (workflow_type, weight)) in self.workflow_types.find(&lowered) {
            *confidence.entry(workflow_type).or_default() += weight;
        }
        let workflow_type = classify(&confidence);

        let conditional = self.conditionals.iter().any(|re| re.is_match(&lowered));

        debug!(
            services = ?services,
            workflow_type = %workflow_type,
            conditional,
            "intent extracted"
        );

        Intent {
            services,
            workflow_type,
            confidence,
            conditional,
        }
    }
}

/// The category with the strictly highest score wins; ties and all-zero
/// scores fall back to [`WorkflowType::General`].
fn classify(scores: &BTreeMap<WorkflowType, u32>) -> WorkflowType {
    let Some(best) = scores.values().copied().max().filter(|&s| s > 0) else {
        return WorkflowType::General;
    };

    let mut leaders = scores.iter().filter(|(_, score)| **score == best);
    match (leaders.next(), leaders.next()) {
        (Some((workflow_type, _)), None) => *workflow_type,
        _ => WorkflowType::General,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
