//! Generation request types and the complexity sizing policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the generated workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// An incoming HTTP call.
    Webhook,
    /// A time-based schedule.
    Schedule,
    /// A manual run from the editor.
    Manual,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "schedule" => Ok(Self::Schedule),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown trigger type `{other}`")),
        }
    }
}

/// Coarse knob controlling node count and structural richness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }

    /// Hard ceiling on the node count, mandatory nodes included.
    pub fn max_nodes(self) -> usize {
        match self {
            Self::Simple => 4,
            Self::Medium => 8,
            Self::Complex => 14,
        }
    }

    /// Size the selector pads towards when few services are detected.
    pub fn target_nodes(self) -> usize {
        match self {
            Self::Simple => 3,
            Self::Medium => 5,
            Self::Complex => 9,
        }
    }

    /// Whether this tier adds a conditional branch even when the text does
    /// not ask for one.
    pub fn always_branches(self) -> bool {
        matches!(self, Self::Complex)
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "complex" => Ok(Self::Complex),
            other => Err(format!("unknown complexity `{other}`")),
        }
    }
}

/// One generation request, already validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Free-text description of the automation.
    #[serde(default)]
    pub description: String,

    /// Explicit trigger choice.  When absent the selector infers one from
    /// the description.
    #[serde(default)]
    pub trigger_type: Option<TriggerKind>,

    #[serde(default)]
    pub complexity: Complexity,
}

impl GenerationRequest {
    pub fn new(
        description: impl Into<String>,
        trigger_type: TriggerKind,
        complexity: Complexity,
    ) -> Self {
        Self {
            description: description.into(),
            trigger_type: Some(trigger_type),
            complexity,
        }
    }
}
