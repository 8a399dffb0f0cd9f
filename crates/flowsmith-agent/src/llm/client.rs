//! Multi-provider LLM client.
//!
//! Supports the **Anthropic Messages API** and the **OpenAI Chat Completions
//! API** (including OpenAI-compatible endpoints) in non-streaming mode.  The
//! workflow enhancer only needs one complete text answer per call.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::types::{ChatRequest, Message, Role};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 4096;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Which LLM API the client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    /// Also covers OpenAI-compatible endpoints.
    OpenAI,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Anthropic => ANTHROPIC_BASE_URL,
            Self::OpenAI => OPENAI_BASE_URL,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            other => Err(AgentError::ConfigError {
                reason: format!("unknown llm provider `{other}`"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    /// e.g. `https://api.anthropic.com`.
    pub base_url: String,
    pub default_model: String,
    pub max_tokens: u32,
    /// Transport-level timeout for one HTTP call.
    pub timeout: Duration,
}

impl LlmClientConfig {
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::for_provider(LlmProvider::Anthropic, api_key, model)
    }

    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::for_provider(LlmProvider::OpenAI, api_key, model)
    }

    pub fn for_provider(
        provider: LlmProvider,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_owned(),
            default_model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A non-streaming chat client for Anthropic or OpenAI.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmClientConfig>,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: config.provider.to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.default_model
    }

    /// Send a chat request and return the model's text answer.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let (url, headers, body) = match self.config.provider {
            LlmProvider::Anthropic => (
                format!("{}/v1/messages", self.config.base_url),
                self.anthropic_headers()?,
                self.build_anthropic_request_body(request),
            ),
            LlmProvider::OpenAI => (
                format!("{}/chat/completions", self.config.base_url),
                self.openai_headers()?,
                self.build_openai_request_body(request),
            ),
        };

        tracing::debug!(
            url = %url,
            model = %body["model"],
            provider = %self.config.provider,
            "sending LLM request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| AgentError::LlmRequestFailed {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        match self.config.provider {
            LlmProvider::Anthropic => parse_anthropic_response(&v),
            LlmProvider::OpenAI => parse_openai_response(&v),
        }
    }

    // -- Request building ----------------------------------------------------

    fn model_for<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        if request.model.is_empty() {
            &self.config.default_model
        } else {
            &request.model
        }
    }

    fn build_anthropic_request_body(&self, request: &ChatRequest) -> Value {
        let (system, messages) = messages_to_anthropic(&request.messages);

        let mut body = json!({
            "model": self.model_for(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        body
    }

    fn build_openai_request_body(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.model_for(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages,
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        body
    }

    fn anthropic_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key).map_err(|e| {
                AgentError::LlmRequestFailed {
                    reason: format!("invalid API key header: {e}"),
                }
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn openai_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("invalid authorization header: {e}"),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

// ===========================================================================
// Wire format conversion
// ===========================================================================

/// Anthropic takes the system prompt as a top-level field, not a message.
fn messages_to_anthropic(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Option<String> = None;
    let mut wire = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => match &mut system {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(&msg.content);
                }
                None => system = Some(msg.content.clone()),
            },
            Role::User | Role::Assistant => {
                wire.push(json!({ "role": msg.role, "content": msg.content }));
            }
        }
    }

    (system, wire)
}

/// Concatenate the text blocks of an Anthropic Messages response.
pub fn parse_anthropic_response(v: &Value) -> Result<String> {
    let content = v["content"]
        .as_array()
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `content` array in response".into(),
        })?;

    Ok(content
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}

/// The first choice's message content of an OpenAI response.
pub fn parse_openai_response(v: &Value) -> Result<String> {
    let message = &v["choices"][0]["message"];
    if message.is_null() {
        return Err(AgentError::LlmParseFailed {
            reason: "missing `choices[0].message` in response".into(),
        });
    }
    Ok(message["content"].as_str().unwrap_or_default().to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider: LlmProvider) -> LlmClient {
        LlmClient::new(LlmClientConfig::for_provider(provider, "test-key", "test-model")).unwrap()
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = LlmClient::new(LlmClientConfig::openai("", "gpt")).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey { provider } if provider == "openai"));
    }

    #[test]
    fn anthropic_body_hoists_system_prompt() {
        let req = ChatRequest::new(vec![
            Message::system("be terse"),
            Message::system("json only"),
            Message::user("hi"),
        ]);
        let body = client(LlmProvider::Anthropic).build_anthropic_request_body(&req);
        assert_eq!(body["system"], "be terse\njson only");
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn openai_body_keeps_system_message() {
        let mut req = ChatRequest::new(vec![Message::system("s"), Message::user("u")]);
        req.model = "override".into();
        req.temperature = Some(0.5);
        let body = client(LlmProvider::OpenAI).build_openai_request_body(&req);
        assert_eq!(body["model"], "override");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn parse_anthropic_text_blocks() {
        let v = json!({
            "content": [
                {"type": "text", "text": "{\"a\":"},
                {"type": "text", "text": "1}"}
            ]
        });
        assert_eq!(parse_anthropic_response(&v).unwrap(), "{\"a\":1}");
        assert!(parse_anthropic_response(&json!({})).is_err());
    }

    #[test]
    fn parse_openai_message() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "ok"}}]});
        assert_eq!(parse_openai_response(&v).unwrap(), "ok");
        assert!(parse_openai_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn provider_parsing() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("gemini".parse::<LlmProvider>().is_err());
        assert_eq!(LlmProvider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let cfg = LlmClientConfig::openai("k", "m").with_base_url("http://localhost:11434/v1/");
        assert_eq!(cfg.base_url, "http://localhost:11434/v1");
    }
}
