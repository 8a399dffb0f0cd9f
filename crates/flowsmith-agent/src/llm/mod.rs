//! LLM client layer.
//!
//! A thin, non-streaming client over the Anthropic Messages and OpenAI Chat
//! Completions APIs, used by the workflow enhancer.

pub mod client;
pub mod types;

pub use client::{LlmClient, LlmClientConfig, LlmProvider};
pub use types::{ChatRequest, Message, Role};
