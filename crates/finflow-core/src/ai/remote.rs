//! Tiered remote classifier
//!
//! Wraps an [`AIClient`] with the ordered model tiers from the router. Each
//! attempt gets its tier's timeout. Transient failures move on to the next
//! tier; anything else is returned straight away.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, ModelTier};
use crate::models::TransactionType;

use super::types::RemoteClassification;
use super::{AIBackend, AIClient};

const FALLBACK_TIMEOUT: Duration = Duration::from_secs(20);

/// Remote classifier adapter with tier fallthrough
#[derive(Clone)]
pub struct RemoteClassifier {
    client: AIClient,
    tiers: Vec<ModelTier>,
}

impl RemoteClassifier {
    /// Explicit tiers; an empty list means one tier on the client's own model
    pub fn new(client: AIClient, tiers: Vec<ModelTier>) -> Self {
        let tiers = if tiers.is_empty() {
            vec![ModelTier::new(client.model(), FALLBACK_TIMEOUT)]
        } else {
            tiers
        };
        Self { client, tiers }
    }

    /// Tiers for the client's backend as configured in the router
    pub fn with_router(client: AIClient, router: &ModelRouter) -> Self {
        let tiers = router.tiers_for(client.backend_name(), client.model());
        Self::new(client, tiers)
    }

    /// Build from the environment; None when no backend is configured
    ///
    /// `GEMINI_MODEL` / `OLLAMA_MODEL` replace the first tier's model.
    pub fn from_env() -> Option<Self> {
        let client = AIClient::from_env()?;
        let mut tiers = ModelRouter::default().tiers_for(client.backend_name(), client.model());

        let primary_override = client
            .model_env_var()
            .and_then(|var| std::env::var(var).ok())
            .filter(|m| !m.trim().is_empty());
        if let (Some(model), Some(first)) = (primary_override, tiers.first_mut()) {
            first.model = model;
        }

        Some(Self::new(client, tiers))
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    pub fn tiers(&self) -> &[ModelTier] {
        &self.tiers
    }

    /// Ask the remote service to pick a category from `allowed`
    pub async fn classify_remote(
        &self,
        description: &str,
        kind: TransactionType,
        allowed: &[&str],
    ) -> Result<RemoteClassification> {
        self.run_tiers("classify", |client| async move {
            client.classify_category(description, kind, allowed).await
        })
        .await
    }

    /// Ask the remote service for advice on a digest
    pub async fn summarize(&self, digest: &str) -> Result<String> {
        self.run_tiers("summarize", |client| async move { client.summarize(digest).await })
            .await
    }

    async fn run_tiers<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Fn(AIClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for (index, tier) in self.tiers.iter().enumerate() {
            info!(
                operation,
                tier = index + 1,
                model = %tier.model,
                backend = self.client.backend_name(),
                "Calling remote model"
            );

            let attempt = call(self.client.with_model(&tier.model));
            let result = match tokio::time::timeout(tier.timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(tier.timeout.as_secs())),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(
                        operation,
                        model = %tier.model,
                        error = %e,
                        "Transient remote failure, trying next tier"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!(operation, model = %tier.model, error = %e, "Remote call failed");
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::NotConfigured("no model tiers".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockFailure};

    fn tiers(models: &[&str]) -> Vec<ModelTier> {
        models
            .iter()
            .map(|m| ModelTier::new(m, Duration::from_secs(5)))
            .collect()
    }

    #[tokio::test]
    async fn test_transient_failure_advances_tier() {
        let mock = MockBackend::new()
            .with_classification("Transport", None, 0.9)
            .failing_on("primary", MockFailure::RateLimited);
        let remote =
            RemoteClassifier::new(AIClient::Mock(mock.clone()), tiers(&["primary", "secondary"]));

        let result = remote
            .classify_remote("Uber", TransactionType::Expense, &["Transport"])
            .await
            .unwrap();
        assert_eq!(result.category, "Transport");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_failure_stops() {
        let mock = MockBackend::new().failing_on("primary", MockFailure::Malformed);
        let remote =
            RemoteClassifier::new(AIClient::Mock(mock.clone()), tiers(&["primary", "secondary"]));

        let err = remote
            .classify_remote("Uber", TransactionType::Expense, &["Transport"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_fatal() {
        let mock = MockBackend::new().failing(MockFailure::BadRequest);
        let remote = RemoteClassifier::new(AIClient::Mock(mock.clone()), tiers(&["a", "b"]));
        assert!(remote.summarize("digest").await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_tiers_exhausted_returns_last_error() {
        let mock = MockBackend::new().failing(MockFailure::Unavailable);
        let remote = RemoteClassifier::new(AIClient::Mock(mock.clone()), tiers(&["a", "b"]));

        let err = remote
            .classify_remote("x", TransactionType::Expense, &["Other"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 503, .. }));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let mock = MockBackend::new().with_delay(Duration::from_secs(5));
        let remote = RemoteClassifier::new(
            AIClient::Mock(mock.clone()),
            vec![
                ModelTier::new("slow", Duration::from_millis(50)),
                ModelTier::new("also-slow", Duration::from_millis(50)),
            ],
        );

        let err = remote
            .classify_remote("x", TransactionType::Expense, &["Other"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_transient());
        // The second tier was still tried
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn test_empty_tiers_use_client_model() {
        let remote = RemoteClassifier::new(AIClient::mock(), Vec::new());
        assert_eq!(remote.tiers().len(), 1);
        assert_eq!(remote.tiers()[0].model, "mock");
    }

    #[test]
    fn test_with_router_default_config() {
        let router = ModelRouter::embedded().unwrap();
        let client = AIClient::gemini("http://x", "k", "m");
        let remote = RemoteClassifier::with_router(client, &router);
        assert_eq!(remote.tiers().len(), 2);
    }
}
