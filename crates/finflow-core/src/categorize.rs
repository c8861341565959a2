//! Categorization orchestrator
//!
//! Priority: keyword rules → remote classifier → catch-all.
//!
//! A rule hit returns immediately and never touches the network. Remote
//! answers are reconciled against the taxonomy; anything that does not land
//! on an allowed category (or any remote error) falls back to the rule
//! classifier's catch-all. Successful remote results are cached per session,
//! keyed by kind and normalized description.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::ai::RemoteClassifier;
use crate::models::{CategorizationResult, CategorizationSource, TransactionType};
use crate::rules::{normalize, RuleClassifier, RULE_CONFIDENCE};
use crate::taxonomy::Taxonomy;

type CacheKey = (TransactionType, String);

/// Layered categorizer
pub struct Categorizer<'a> {
    taxonomy: &'a Taxonomy,
    remote: Option<&'a RemoteClassifier>,
    /// Successful remote results for this session
    remote_cache: Mutex<HashMap<CacheKey, CategorizationResult>>,
}

impl<'a> Categorizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy, remote: Option<&'a RemoteClassifier>) -> Self {
        Self {
            taxonomy,
            remote,
            remote_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Categorizer over the built-in taxonomy
    pub fn standard(remote: Option<&'a RemoteClassifier>) -> Self {
        Self::new(Taxonomy::standard(), remote)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Categorize a description; never fails
    pub async fn categorize(
        &self,
        description: &str,
        kind: TransactionType,
    ) -> CategorizationResult {
        let local = RuleClassifier::new(self.taxonomy).classify(description, kind);
        if local.confidence == RULE_CONFIDENCE {
            return local;
        }

        let Some(remote) = self.remote else {
            return local;
        };

        let normalized = normalize(description);
        if normalized.is_empty() {
            return local;
        }

        let key = (kind, normalized);
        if let Some(cached) = self.cached(&key) {
            debug!(description = %description, "Remote classification cache hit");
            return cached;
        }

        let allowed = self.taxonomy.allowed(kind);
        match remote.classify_remote(description.trim(), kind, &allowed).await {
            Ok(answer) => match self.taxonomy.reconcile(&answer.category, kind) {
                Some(category) => {
                    debug!(
                        description = %description,
                        answer = %answer.category,
                        category,
                        "Remote classification reconciled"
                    );
                    let result = CategorizationResult {
                        category: category.to_string(),
                        sub_category: answer.sub_category,
                        icon: self.taxonomy.icon_for(category).to_string(),
                        confidence: answer.confidence.clamp(0.0, 1.0),
                        source: CategorizationSource::Remote,
                    };
                    self.remote_cache
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(key, result.clone());
                    result
                }
                None => {
                    warn!(
                        description = %description,
                        answer = %answer.category,
                        "Remote category not in taxonomy, using fallback"
                    );
                    local
                }
            },
            Err(e) => {
                warn!(
                    description = %description,
                    error = %e,
                    "Remote classification failed, using fallback"
                );
                local
            }
        }
    }

    /// Number of cached remote results
    pub fn cache_len(&self) -> usize {
        self.remote_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached(&self, key: &CacheKey) -> Option<CategorizationResult> {
        self.remote_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend, MockFailure};
    use crate::model_router::ModelTier;
    use crate::rules::NO_MATCH_CONFIDENCE;
    use std::time::Duration;

    fn remote_with(mock: &MockBackend) -> RemoteClassifier {
        RemoteClassifier::new(
            AIClient::Mock(mock.clone()),
            vec![ModelTier::new("mock", Duration::from_secs(5))],
        )
    }

    #[tokio::test]
    async fn test_rule_hit_skips_remote() {
        let mock = MockBackend::new();
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer
            .categorize("Uber to airport", TransactionType::Expense)
            .await;
        assert_eq!(result.category, "Transport");
        assert_eq!(result.icon, "transport");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_confidence_passed_through() {
        let mock = MockBackend::new().with_classification("Pets", None, 1.0);
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer
            .categorize("Kibble subscription", TransactionType::Expense)
            .await;
        assert_eq!(result.category, "Pets");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, CategorizationSource::Remote);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_result_reconciled() {
        let mock = MockBackend::new().with_classification("Professional Fees", None, 0.85);
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer
            .categorize("Quarterly consulting payment", TransactionType::Income)
            .await;
        assert_eq!(result.category, "Honorarios Profesionales");
        assert_eq!(result.icon, "professional");
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.source, CategorizationSource::Remote);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_remote_category_falls_back() {
        let mock = MockBackend::new().with_classification("Comida", None, 0.9);
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer.categorize("Mystery shop", TransactionType::Expense).await;
        assert_eq!(result.category, "Other");
        assert_eq!(result.confidence, NO_MATCH_CONFIDENCE);
        assert_eq!(result.source, CategorizationSource::Fallback);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back() {
        for failure in [MockFailure::Malformed, MockFailure::RateLimited, MockFailure::BadRequest] {
            let mock = MockBackend::new().failing(failure);
            let remote = remote_with(&mock);
            let categorizer = Categorizer::standard(Some(&remote));

            let result = categorizer.categorize("Mystery shop", TransactionType::Expense).await;
            assert_eq!(result.category, "Other");
            assert_eq!(result.icon, "other");
            assert_eq!(result.confidence, NO_MATCH_CONFIDENCE);
        }
    }

    #[tokio::test]
    async fn test_no_remote_configured() {
        let categorizer = Categorizer::standard(None);
        assert!(!categorizer.has_remote());
        let result = categorizer.categorize("Mystery shop", TransactionType::Income).await;
        assert_eq!(result.category, "Other Income");
        assert_eq!(result.confidence, NO_MATCH_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_empty_description_skips_remote() {
        let mock = MockBackend::new();
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer.categorize("   ", TransactionType::Expense).await;
        assert_eq!(result.category, "Other");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_results_cached_per_kind() {
        let mock = MockBackend::new().with_classification("Education", Some("Books"), 0.7);
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let first = categorizer.categorize("Atlas Libros", TransactionType::Expense).await;
        let second = categorizer.categorize("  atlas libros ", TransactionType::Expense).await;
        assert_eq!(first, second);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(categorizer.cache_len(), 1);

        // Income is a separate key; "Education" is not an income category
        let income = categorizer.categorize("Atlas Libros", TransactionType::Income).await;
        assert_eq!(income.category, "Other Income");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_remote_confidence_below_rule_confidence() {
        let mock = MockBackend::new().with_classification("Home", None, 1.0);
        let remote = remote_with(&mock);
        let categorizer = Categorizer::standard(Some(&remote));

        let result = categorizer.categorize("Mystery shop", TransactionType::Expense).await;
        assert_eq!(result.category, "Home");
        assert!(result.confidence < 1.0);
    }
}
