//! **Generation primitive**: text completion from a prompt.
//!
//! `ChatClient` speaks the OpenAI-compatible `/chat/completions` protocol
//! (OpenRouter, OpenAI, local gateways). Configuration is an explicit
//! [`ProviderConfig`] value handed to the constructor; there is no ambient
//! "active provider" state anywhere in the crate.

use crate::error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Backend producing a completion for a prompt. Every call site must treat
/// this as fallible (network/provider errors).
pub trait GenerationBackend: Send + Sync {
    fn generate(&self, prompt: &str) -> BackendResult<String>;
}

/// Explicit provider configuration. Built by the caller (user config file or
/// environment) and passed into [`ChatClient::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL without trailing slash (e.g. https://openrouter.ai/api/v1).
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model identifier (e.g. `meta-llama/llama-3.3-70b-instruct`).
    pub model: String,
    /// Sampling temperature (default 0.3).
    pub temperature: f32,
    /// Completion cap in tokens (default 1024).
    pub max_tokens: u32,
    /// Request timeout in seconds (default 60).
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }

    /// Build from environment. Key priority: `MUNINN_LLM_API_KEY`, then
    /// `OPENROUTER_API_KEY`. Returns `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("MUNINN_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("MUNINN_LLM_API_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }
        if let Ok(model) = std::env::var("MUNINN_LLM_MODEL") {
            let model = model.trim();
            if !model.is_empty() {
                config.model = model.to_string();
            }
        }
        Some(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// OpenAI-compatible request/response shapes.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Production generation client: OpenAI-compatible chat completions.
pub struct ChatClient {
    config: ProviderConfig,
    system: Option<String>,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    /// Create a client for the given provider. The config is owned by this
    /// client; nothing global is consulted at call time.
    pub fn new(config: ProviderConfig) -> BackendResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Generation(e.to_string()))?;
        Ok(Self {
            config,
            system: None,
            client,
        })
    }

    /// Set a system preamble sent before every prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl GenerationBackend for ChatClient {
    fn generate(&self, prompt: &str) -> BackendResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| BackendError::Generation(format!("request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(BackendError::Generation(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = res
            .json()
            .map_err(|e| BackendError::Generation(format!("response parse failed: {}", e)))?;

        parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| BackendError::Generation("empty choices in response".to_string()))
    }
}

/// Deterministic placeholder: echoes a templated string per call. Use for
/// tests and offline runs; never calls the network.
#[derive(Debug, Default)]
pub struct PlaceholderGeneration {
    /// If set, return this instead of the templated echo.
    pub response: Option<String>,
}

impl PlaceholderGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(s: impl Into<String>) -> Self {
        Self {
            response: Some(s.into()),
        }
    }
}

impl GenerationBackend for PlaceholderGeneration {
    fn generate(&self, prompt: &str) -> BackendResult<String> {
        if let Some(ref r) = self.response {
            return Ok(r.clone());
        }
        let first_line = prompt.lines().next().unwrap_or("").trim();
        Ok(format!(
            "[generation placeholder: {} / {} prompt chars]",
            first_line,
            prompt.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_deterministic() {
        let gen = PlaceholderGeneration::new();
        let a = gen.generate("Summarize this meeting.\n- hello").unwrap();
        let b = gen.generate("Summarize this meeting.\n- hello").unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Summarize this meeting."));
    }

    #[test]
    fn placeholder_with_response() {
        let gen = PlaceholderGeneration::with_response("fixed");
        assert_eq!(gen.generate("anything").unwrap(), "fixed");
    }

    #[test]
    fn provider_defaults() {
        let config = ProviderConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!((config.temperature - 0.3).abs() < 1e-6);
    }
}
