//! Gemini backend implementation
//!
//! Talks to the `generateContent` REST endpoint. Classification requests ask
//! for structured output (`responseMimeType` + `responseSchema`) so the answer
//! is a bare JSON object; it is still validated in `parsing`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::TransactionType;
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_advice, parse_remote_classification};
use super::types::RemoteClassification;
use super::{classification_prompt, ensure_success, render_prompt, AIBackend};

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl GeminiBackend {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Replace the prompt library (tests pin it to the embedded prompts)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            prompts: self.prompts.clone(),
        }
    }

    /// Create from environment variables; None without an API key
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_GEMINI_HOST.to_string());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        Some(Self::new(&host, &api_key, &model))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: GenerateResponse = response.json().await?;
        let text = body.text().ok_or_else(|| {
            Error::InvalidData(match body.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => format!("Gemini blocked the request: {}", reason),
                None => "Gemini returned no candidates".to_string(),
            })
        })?;

        debug!(model = %self.model, "Gemini response: {}", text);
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

impl GenerateRequest {
    fn new(system: String, user: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(user) }],
            }],
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: Some(system) }],
            }),
            generation_config: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Structured-output schema for classification answers
fn classification_schema() -> serde_json::Value {
    json!({
        "responseMimeType": "application/json",
        "responseSchema": {
            "type": "OBJECT",
            "properties": {
                "category": { "type": "STRING" },
                "subCategory": { "type": "STRING" },
                "confidence": { "type": "NUMBER" }
            },
            "required": ["category"]
        },
        "temperature": 0.1
    })
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn classify_category(
        &self,
        description: &str,
        kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification> {
        let prompt = classification_prompt(&self.prompts, description, kind, allowed)?;
        let mut request = GenerateRequest::new(prompt.system, prompt.user);
        request.generation_config = Some(classification_schema());

        let text = self.generate(&request).await?;
        parse_remote_classification(&text)
    }

    async fn summarize(&self, digest: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("digest", digest);
        let prompt = render_prompt(&self.prompts, PromptId::FinancialAdvice, &vars)?;
        let request = GenerateRequest::new(prompt.system, prompt.user);

        let text = self.generate(&request).await?;
        parse_advice(&text)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model);
        match self
            .http_client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
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
