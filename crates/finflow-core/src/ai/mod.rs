//! Pluggable remote AI backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: the operations the categorizer and advice summarizer need
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backends: `GeminiBackend` (default), `OllamaBackend`, `MockBackend`
//! - `RemoteClassifier`: walks the model tiers with per-tier timeouts
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: gemini, ollama or mock. Default: gemini
//! - `GEMINI_API_KEY` (or `API_KEY`): required for gemini
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)
//! - `GEMINI_MODEL`: primary tier model
//! - `OLLAMA_HOST`: required for ollama
//! - `OLLAMA_MODEL`: primary tier model (default: llama3.2)

mod gemini;
mod mock;
mod ollama;
pub mod parsing;
pub mod remote;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockFailure};
pub use ollama::OllamaBackend;
pub use remote::RemoteClassifier;
pub use types::*;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::TransactionType;
use crate::prompts::{PromptId, PromptLibrary};

/// Trait defining the interface for all AI backends
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Ask the service to pick one of `allowed` for a description
    async fn classify_category(
        &self,
        description: &str,
        kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification>;

    /// Free-text advice from a spending digest
    async fn summarize(&self, digest: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model used for requests
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini generateContent API
    Gemini(GeminiBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None when the selected backend is missing its credentials or
    /// host, which turns the remote classifier off.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" | "google" => GeminiBackend::from_env().map(AIClient::Gemini),
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AIClient::Gemini)
            }
        }
    }

    pub fn gemini(base_url: &str, api_key: &str, model: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(base_url, api_key, model))
    }

    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Same backend, different model (one per tier)
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }

    /// Backend name, as used in `AI_BACKEND` and the model config
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::Ollama(_) => "ollama",
            AIClient::Mock(_) => "mock",
        }
    }

    /// Environment variable that overrides the primary tier's model
    pub fn model_env_var(&self) -> Option<&'static str> {
        match self {
            AIClient::Gemini(_) => Some("GEMINI_MODEL"),
            AIClient::Ollama(_) => Some("OLLAMA_MODEL"),
            AIClient::Mock(_) => None,
        }
    }

    pub fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.backend_name(),
            host: self.host().to_string(),
            model: self.model().to_string(),
        }
    }
}

// Delegate to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify_category(
        &self,
        description: &str,
        kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification> {
        match self {
            AIClient::Gemini(b) => b.classify_category(description, kind, allowed).await,
            AIClient::Ollama(b) => b.classify_category(description, kind, allowed).await,
            AIClient::Mock(b) => b.classify_category(description, kind, allowed).await,
        }
    }

    async fn summarize(&self, digest: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.summarize(digest).await,
            AIClient::Ollama(b) => b.summarize(digest).await,
            AIClient::Mock(b) => b.summarize(digest).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Rendered system and user text for a prompt
pub(crate) struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

pub(crate) fn render_prompt(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<RenderedPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    let prompt = prompts.get(id)?;
    Ok(RenderedPrompt {
        system: prompt.render_system(vars),
        user: prompt.render_user(vars),
    })
}

/// Render the classification prompt for a description and its allowed list
pub(crate) fn classification_prompt(
    prompts: &RwLock<PromptLibrary>,
    description: &str,
    kind: TransactionType,
    allowed: &[&str],
) -> Result<RenderedPrompt> {
    let categories = allowed
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    let kind = match kind {
        TransactionType::Income => "income",
        TransactionType::Expense => "expense",
    };

    let mut vars = HashMap::new();
    vars.insert("description", description);
    vars.insert("kind", kind);
    vars.insert("categories", categories.as_str());
    render_prompt(prompts, PromptId::ClassifyTransaction, &vars)
}

/// Turn a non-2xx response into the matching error
///
/// 429 (or a quota message) is `RateLimited`; everything else is `Api`, whose
/// status decides whether the next tier is tried.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body);

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || message.contains("RESOURCE_EXHAUSTED")
    {
        return Err(Error::RateLimited(message));
    }

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull `error.message` (and `error.status`) out of an API error body
fn api_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    match error {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(e) => {
            let message = e.get("message").and_then(|m| m.as_str()).unwrap_or("");
            match e.get("status").and_then(|s| s.as_str()) {
                Some(status) => format!("{} ({})", message, status),
                None => message.to_string(),
            }
        }
        None => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.backend_name(), "mock");
        assert!(client.model_env_var().is_none());
    }

    #[test]
    fn test_with_model_keeps_backend() {
        let client = AIClient::gemini("http://localhost:1", "key", "primary");
        let secondary = client.with_model("secondary");
        assert_eq!(secondary.backend_name(), "gemini");
        assert_eq!(secondary.model(), "secondary");
        assert_eq!(client.model(), "primary");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(body), "Quota exceeded (RESOURCE_EXHAUSTED)");
        assert_eq!(api_error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(api_error_message("plain text"), "plain text");
    }

    #[test]
    fn test_classification_prompt_lists_categories() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let rendered = classification_prompt(
            &prompts,
            "Uber to airport",
            TransactionType::Expense,
            &["Transport", "Other"],
        )
        .unwrap();
        assert!(rendered.user.contains("Uber to airport"));
        assert!(rendered.user.contains("- Transport\n- Other"));
        assert!(rendered.user.contains("expense"));
        assert!(!rendered.system.is_empty());
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(AIClient::mock().health_check().await);
    }
}
