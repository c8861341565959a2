//! Ollama backend implementation
//!
//! Uses `/api/generate` with `format: "json"` for classification so the model
//! is constrained to emit a JSON object.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::TransactionType;
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_advice, parse_remote_classification};
use super::types::RemoteClassification;
use super::{classification_prompt, ensure_success, render_prompt, AIBackend};

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
            prompts: self.prompts.clone(),
        }
    }

    /// Create from environment variables; None without `OLLAMA_HOST`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
        Some(Self::new(&host, &model))
    }

    async fn generate(&self, request: &OllamaRequest<'_>) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = %self.model, "Ollama response: {}", ollama_response.response);
        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn classify_category(
        &self,
        description: &str,
        kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification> {
        let prompt = classification_prompt(&self.prompts, description, kind, allowed)?;
        let request = OllamaRequest {
            model: &self.model,
            prompt: prompt.user,
            system: prompt.system,
            stream: false,
            format: Some("json"),
        };

        let text = self.generate(&request).await?;
        parse_remote_classification(&text)
    }

    async fn summarize(&self, digest: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("digest", digest);
        let prompt = render_prompt(&self.prompts, PromptId::FinancialAdvice, &vars)?;
        let request = OllamaRequest {
            model: &self.model,
            prompt: prompt.user,
            system: prompt.system,
            stream: false,
            format: None,
        };

        let text = self.generate(&request).await?;
        parse_advice(&text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
