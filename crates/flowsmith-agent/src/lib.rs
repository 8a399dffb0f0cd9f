//! # flowsmith-agent
//!
//! The service layer around the rule-based synthesizer:
//!
//! - **LLM client**: non-streaming Anthropic / OpenAI chat calls.
//! - **Enhancement**: an optional [`Enhancer`] stage whose output is
//!   validated strictly and discarded whole on any failure.
//! - **Service**: [`WorkflowService`] runs cache lookup, the rule pipeline,
//!   then enhancement under a timeout.
//! - **Configuration**: [`ServiceConfig`] from TOML plus environment.

pub mod config;
pub mod enhance;
pub mod error;
pub mod llm;
pub mod service;

pub use config::{
    AiSection, CacheSection, DEFAULT_CONFIG_FILE, ServerSection, ServiceConfig, ValidationSection,
    env_non_empty,
};
pub use enhance::{Enhancer, LlmEnhancer, parse_candidate, validate_candidate};
pub use error::{AgentError, Result};
pub use llm::{ChatRequest, LlmClient, LlmClientConfig, LlmProvider, Message, Role};
pub use service::{Generation, WorkflowService};
