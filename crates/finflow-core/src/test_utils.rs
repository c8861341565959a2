//! Test utilities for finflow-core
//!
//! A mock AI server speaking just enough of the Gemini `generateContent` and
//! Ollama `/api/generate` protocols for integration tests. Replies can be
//! scripted per model, which is how tier fallback is exercised.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// What the mock answers for one model
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Guess from the prompt: classification requests get a keyword-based
    /// category, advice requests get a canned tip
    Auto,
    /// A classification object with this category and confidence
    Classification { category: String, confidence: f64 },
    /// Raw model text, returned as-is (use for malformed output)
    Text(String),
    /// An HTTP error with a Gemini-style error body
    Error { status: u16, message: String },
}

impl MockReply {
    pub fn classification(category: &str, confidence: f64) -> Self {
        Self::Classification {
            category: category.to_string(),
            confidence,
        }
    }

    /// 429 with `RESOURCE_EXHAUSTED`
    pub fn quota_exhausted() -> Self {
        Self::Error {
            status: 429,
            message: "Quota exceeded for this model".to_string(),
        }
    }
}

/// Canned advice returned by [`MockReply::Auto`]
pub const MOCK_ADVICE: &str = "Your dining out spending is high; try cooking at home twice a week.";

#[derive(Default)]
struct MockState {
    replies: HashMap<String, MockReply>,
    /// Model named by every generate request, in order
    calls: Mutex<Vec<String>>,
}

/// Mock Gemini/Ollama server for integration tests
pub struct MockAiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start with [`MockReply::Auto`] for every model
    pub async fn start() -> Self {
        Self::with_replies(HashMap::new()).await
    }

    /// Start with scripted replies; unlisted models get [`MockReply::Auto`]
    pub async fn with_replies(replies: HashMap<String, MockReply>) -> Self {
        let state = Arc::new(MockState {
            replies,
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/v1beta/models/:model",
                get(handle_gemini_model).post(handle_gemini_generate),
            )
            .route("/api/tags", get(handle_ollama_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Start with one scripted reply per model
    pub async fn with_model_replies(replies: &[(&str, MockReply)]) -> Self {
        let map = replies
            .iter()
            .map(|(model, reply)| (model.to_string(), reply.clone()))
            .collect();
        Self::with_replies(map).await
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Models that received a generate request, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MockState {
    fn reply_for(&self, model: &str) -> MockReply {
        self.calls.lock().unwrap().push(model.to_string());
        self.replies.get(model).cloned().unwrap_or(MockReply::Auto)
    }
}

/// Gemini model metadata (health check)
async fn handle_gemini_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({ "name": format!("models/{}", model) }))
}

/// Gemini generateContent; the path segment is `{model}:generateContent`
async fn handle_gemini_generate(
    State(state): State<Arc<MockState>>,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(model) = segment.strip_suffix(":generateContent") else {
        return gemini_error(404, "Unknown method");
    };

    let wants_json = body.pointer("/generationConfig/responseSchema").is_some();
    let prompt = collect_text(&body);

    match reply_text(state.reply_for(model), &prompt, wants_json) {
        Ok(text) => Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        Err((status, message)) => gemini_error(status, &message),
    }
}

async fn handle_ollama_tags() -> Json<Value> {
    Json(json!({ "models": [{ "name": "llama3.2:latest" }] }))
}

async fn handle_ollama_generate(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].as_str().unwrap_or_default().to_string();
    let wants_json = body["format"].as_str() == Some("json");
    let prompt = collect_text(&body);

    match reply_text(state.reply_for(&model), &prompt, wants_json) {
        Ok(text) => Json(json!({ "model": model, "response": text, "done": true })).into_response(),
        Err((status, message)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}

fn reply_text(
    reply: MockReply,
    prompt: &str,
    wants_json: bool,
) -> std::result::Result<String, (u16, String)> {
    match reply {
        MockReply::Auto if wants_json => {
            let (category, confidence) = guess_category(prompt);
            Ok(json!({ "category": category, "confidence": confidence }).to_string())
        }
        MockReply::Auto => Ok(MOCK_ADVICE.to_string()),
        MockReply::Classification {
            category,
            confidence,
        } => Ok(json!({ "category": category, "confidence": confidence }).to_string()),
        MockReply::Text(text) => Ok(text),
        MockReply::Error { status, message } => Err((status, message)),
    }
}

/// Keyword guess, answering with labels a model might plausibly use
fn guess_category(prompt: &str) -> (&'static str, f64) {
    let p = extract_description(prompt).to_lowercase();
    if p.contains("consult") {
        ("Professional Fees", 0.85)
    } else if p.contains("book") {
        ("Education", 0.7)
    } else if p.contains("gym") {
        ("Health", 0.75)
    } else {
        ("Other", 0.3)
    }
}

/// The quoted description from the classification prompt, or the whole prompt
fn extract_description(prompt: &str) -> &str {
    const MARKER: &str = "Description: \"";
    prompt
        .find(MARKER)
        .map(|start| &prompt[start + MARKER.len()..])
        .and_then(|rest| rest.find('"').map(|end| &rest[..end]))
        .unwrap_or(prompt)
}

/// Every `text`, `prompt` and `system` string in a request body
fn collect_text(value: &Value) -> String {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    match (key.as_str(), v) {
                        ("text" | "prompt" | "system", Value::String(s)) => out.push(s.clone()),
                        _ => walk(v, out),
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut out = Vec::new();
    walk(value, &mut out);
    out.join("\n")
}

fn gemini_error(status: u16, message: &str) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let status_name = match status {
        429 => "RESOURCE_EXHAUSTED",
        400 => "INVALID_ARGUMENT",
        404 => "NOT_FOUND",
        503 => "UNAVAILABLE",
        _ => "INTERNAL",
    };
    (
        code,
        Json(json!({
            "error": { "code": status, "message": message, "status": status_name }
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_text() {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": "sys" }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Quarterly consulting payment" }] }]
        });
        let text = collect_text(&body);
        assert!(text.contains("sys"));
        assert!(text.contains("consulting"));
    }

    #[test]
    fn test_guess_category() {
        assert_eq!(guess_category("CONSULTING fee").0, "Professional Fees");
        assert_eq!(guess_category("nothing").0, "Other");
        assert_eq!(
            guess_category("Description: \"Gym pass\"\nAllowed: Education"),
            ("Health", 0.75)
        );
    }
}
