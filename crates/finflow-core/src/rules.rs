//! Deterministic keyword classifier
//!
//! Runs before any remote call. A hit is authoritative (confidence 1.0); a miss
//! returns the low-confidence catch-all so callers always have something to
//! show.

use crate::models::{CategorizationResult, CategorizationSource, TransactionType};
use crate::taxonomy::{Taxonomy, OTHER_ICON};

/// Confidence reported when no rule matched
pub const NO_MATCH_CONFIDENCE: f64 = 0.1;

/// Confidence reported for a rule hit
pub const RULE_CONFIDENCE: f64 = 1.0;

/// Keyword rule classifier over a taxonomy
#[derive(Debug, Clone, Copy)]
pub struct RuleClassifier<'a> {
    taxonomy: &'a Taxonomy,
}

impl Default for RuleClassifier<'static> {
    fn default() -> Self {
        Self::new(Taxonomy::standard())
    }
}

impl<'a> RuleClassifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Classify a description with the ordered keyword rules for its kind
    pub fn classify(&self, description: &str, kind: TransactionType) -> CategorizationResult {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return self.no_match(kind);
        }

        match self.taxonomy.rules(kind).find(|r| r.matches(&normalized)) {
            Some(rule) => {
                tracing::debug!(
                    description = %description,
                    category = %rule.category,
                    "Keyword rule matched"
                );
                CategorizationResult {
                    category: rule.category.clone(),
                    sub_category: rule.sub_category.clone(),
                    icon: self.taxonomy.icon_for(&rule.category).to_string(),
                    confidence: RULE_CONFIDENCE,
                    source: CategorizationSource::Rule,
                }
            }
            None => self.no_match(kind),
        }
    }

    /// The catch-all result for a kind
    pub fn no_match(&self, kind: TransactionType) -> CategorizationResult {
        CategorizationResult {
            category: self.taxonomy.fallback_category(kind).to_string(),
            sub_category: None,
            icon: OTHER_ICON.to_string(),
            confidence: NO_MATCH_CONFIDENCE,
            source: CategorizationSource::Fallback,
        }
    }
}

/// Trim and lowercase; the key used for rule matching and caching
pub fn normalize(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Convenience wrapper over the built-in taxonomy
pub fn classify(description: &str, is_income: bool) -> CategorizationResult {
    let kind = if is_income {
        TransactionType::Income
    } else {
        TransactionType::Expense
    };
    RuleClassifier::default().classify(description, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_hit_is_full_confidence() {
        let result = classify("Coffee at Starbucks", false);
        assert_eq!(result.category, "Food and Drink");
        assert_eq!(result.sub_category.as_deref(), Some("Restaurants"));
        assert_eq!(result.icon, "food");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, CategorizationSource::Rule);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let result = classify("   NETFLIX.COM  ", false);
        assert_eq!(result.category, "Leisure");
        assert_eq!(result.sub_category.as_deref(), Some("Streaming"));
    }

    #[test]
    fn test_rule_order_breaks_ties() {
        let delivery = classify("Uber Eats order", false);
        assert_eq!(delivery.category, "Food and Drink");
        assert_eq!(delivery.sub_category.as_deref(), Some("Delivery"));

        let ride = classify("Uber to airport", false);
        assert_eq!(ride.category, "Transport");
        assert_eq!(ride.sub_category.as_deref(), Some("Ride share"));
        assert_eq!(ride.icon, "transport");
    }

    #[test]
    fn test_substring_not_whole_word() {
        // "supermercados" still contains "supermercado"
        assert_eq!(classify("Supermercados Día", false).category, "Food and Drink");
    }

    #[test]
    fn test_no_match_sentinel() {
        let expense = classify("xyz123", false);
        assert_eq!(expense.category, "Other");
        assert_eq!(expense.icon, "other");
        assert_eq!(expense.confidence, NO_MATCH_CONFIDENCE);
        assert!(expense.sub_category.is_none());
        assert_eq!(expense.source, CategorizationSource::Fallback);

        let income = classify("xyz123", true);
        assert_eq!(income.category, "Other Income");
        assert_eq!(income.confidence, NO_MATCH_CONFIDENCE);
    }

    #[test]
    fn test_empty_description_is_no_match() {
        assert_eq!(classify("", false).confidence, NO_MATCH_CONFIDENCE);
        assert_eq!(classify("   ", true).category, "Other Income");
    }

    #[test]
    fn test_rules_scoped_by_kind() {
        assert_eq!(classify("Monthly salary", true).category, "Salary");
        // Expense rules never fire for income and vice versa
        assert_eq!(classify("Monthly salary", false).category, "Other");
        assert_eq!(classify("Birthday gift", true).category, "Gifts Received");
        assert_eq!(classify("Birthday gift", false).category, "Gifts");
    }

    #[test]
    fn test_confidence_is_one_iff_matched() {
        let taxonomy = Taxonomy::standard();
        let classifier = RuleClassifier::new(taxonomy);
        let samples = [
            "Uber to airport",
            "Random thing",
            "Farmacia Central",
            "Quarterly consulting payment",
            "",
        ];
        for kind in [TransactionType::Expense, TransactionType::Income] {
            for sample in samples {
                let result = classifier.classify(sample, kind);
                let matched = result.source == CategorizationSource::Rule;
                assert_eq!(result.confidence == 1.0, matched, "{}", sample);
                assert!(taxonomy.is_allowed(kind, &result.category));
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let first = classify("Repsol gasolina", false);
        let second = classify("Repsol gasolina", false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_consulting_payment_not_matched_by_rules() {
        let result = classify("Quarterly consulting payment", true);
        assert_eq!(result.category, "Other Income");
        assert_eq!(result.confidence, NO_MATCH_CONFIDENCE);
    }
}
