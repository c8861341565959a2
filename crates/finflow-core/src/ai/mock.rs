//! Mock backend for testing
//!
//! Answers from a small keyword table by default. Tests can pin the answer,
//! make specific models fail, add latency, and count calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::TransactionType;

use super::types::RemoteClassification;
use super::AIBackend;

/// Failure a mock model should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// HTTP 429, quota exhausted
    RateLimited,
    /// HTTP 503
    Unavailable,
    /// Response without usable JSON
    Malformed,
    /// HTTP 400
    BadRequest,
}

impl MockFailure {
    fn to_error(self) -> Error {
        match self {
            Self::RateLimited => Error::RateLimited("mock quota exhausted".into()),
            Self::Unavailable => Error::Api {
                status: 503,
                message: "mock unavailable".into(),
            },
            Self::Malformed => Error::InvalidData("No JSON found in AI response".into()),
            Self::BadRequest => Error::Api {
                status: 400,
                message: "mock bad request".into(),
            },
        }
    }
}

const ALL_MODELS: &str = "*";

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    model: String,
    classification: Option<RemoteClassification>,
    advice: Option<String>,
    failures: HashMap<String, MockFailure>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            model: "mock".to_string(),
            classification: None,
            advice: None,
            failures: HashMap::new(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Always answer with this classification
    pub fn with_classification(
        mut self,
        category: &str,
        sub_category: Option<&str>,
        confidence: f64,
    ) -> Self {
        self.classification = Some(RemoteClassification {
            category: category.to_string(),
            sub_category: sub_category.map(str::to_string),
            confidence,
        });
        self
    }

    /// Always answer `summarize` with this text
    pub fn with_advice(mut self, advice: &str) -> Self {
        self.advice = Some(advice.to_string());
        self
    }

    /// Every model fails this way
    pub fn failing(mut self, failure: MockFailure) -> Self {
        self.failures.insert(ALL_MODELS.to_string(), failure);
        self
    }

    /// Only `model` fails this way
    pub fn failing_on(mut self, model: &str, failure: MockFailure) -> Self {
        self.failures.insert(model.to_string(), failure);
        self
    }

    /// Sleep before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Create a new instance with a different model
    ///
    /// The call counter is shared with the original.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Number of classify/summarize calls across this mock and its model variants
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failures
            .get(&self.model)
            .or_else(|| self.failures.get(ALL_MODELS));
        match failure {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_category(
        &self,
        description: &str,
        _kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification> {
        self.begin_call().await?;

        if let Some(ref fixed) = self.classification {
            return Ok(fixed.clone());
        }

        let lower = description.to_lowercase();
        let (category, sub_category, confidence) = match lower.as_str() {
            d if d.contains("consult") => ("Professional Fees", None, 0.85),
            d if d.contains("airport") || d.contains("flight") => {
                ("Transport", Some("Travel"), 0.8)
            }
            d if d.contains("coffee") || d.contains("bakery") => ("Food", Some("Cafe"), 0.8),
            d if d.contains("book") => ("Education", Some("Books"), 0.7),
            _ => (allowed.last().copied().unwrap_or("Other"), None, 0.3),
        };

        Ok(RemoteClassification {
            category: category.to_string(),
            sub_category: sub_category.map(str::to_string),
            confidence,
        })
    }

    async fn summarize(&self, digest: &str) -> Result<String> {
        self.begin_call().await?;

        Ok(self.advice.clone().unwrap_or_else(|| {
            format!(
                "Mock advice based on {} lines of activity: review your largest expense category.",
                digest.lines().count()
            )
        }))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_answers() {
        let mock = MockBackend::new();
        let result = mock
            .classify_category("Quarterly consulting payment", TransactionType::Income, &["Salary"])
            .await
            .unwrap();
        assert_eq!(result.category, "Professional Fees");
        assert_eq!(result.confidence, 0.85);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failing_on_model() {
        let mock = MockBackend::new().failing_on("primary", MockFailure::RateLimited);
        let primary = mock.with_model("primary");
        let secondary = mock.with_model("secondary");

        let err = primary
            .classify_category("x", TransactionType::Expense, &["Other"])
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(secondary
            .classify_category("x", TransactionType::Expense, &["Other"])
            .await
            .is_ok());

        // Counter is shared between model variants
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
