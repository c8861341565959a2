//! Financial advice summarizer
//!
//! Builds a compact digest of the most recent transactions and hands it to
//! the remote service. Every failure path ends in a fixed message, so callers
//! always get text to show.

use std::cmp::Ordering;

use tracing::warn;

use crate::ai::RemoteClassifier;
use crate::models::{Transaction, TransactionType};
use crate::reports::{category_breakdown, financial_summary};
use crate::taxonomy::Taxonomy;

/// Fewer transactions than this gets [`NEED_MORE_DATA`]
pub const MIN_TRANSACTIONS_FOR_ADVICE: usize = 5;

/// How many of the most recent transactions go into the digest
pub const ADVICE_SAMPLE_SIZE: usize = 40;

const TOP_CATEGORIES: usize = 3;

pub const NEED_MORE_DATA: &str =
    "Add at least 5 transactions so there is enough activity to analyze.";
pub const NOT_CONFIGURED: &str =
    "The AI advisor is not configured. Set GEMINI_API_KEY (or choose another AI_BACKEND) to get advice.";
pub const ADVICE_UNAVAILABLE: &str =
    "Sorry, the AI advisor could not be reached right now. Please try again later.";

/// Produces short advice from a transaction snapshot
pub struct AdviceSummarizer<'a> {
    taxonomy: &'a Taxonomy,
    remote: Option<&'a RemoteClassifier>,
}

impl<'a> AdviceSummarizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy, remote: Option<&'a RemoteClassifier>) -> Self {
        Self { taxonomy, remote }
    }

    pub fn standard(remote: Option<&'a RemoteClassifier>) -> Self {
        Self::new(Taxonomy::standard(), remote)
    }

    /// Advice text for the snapshot; never fails
    pub async fn summarize_advice(&self, transactions: &[Transaction]) -> String {
        if transactions.len() < MIN_TRANSACTIONS_FOR_ADVICE {
            return NEED_MORE_DATA.to_string();
        }
        let Some(remote) = self.remote else {
            return NOT_CONFIGURED.to_string();
        };

        let digest = build_digest(transactions, self.taxonomy);
        match remote.summarize(&digest).await {
            Ok(advice) => advice,
            Err(e) => {
                warn!(error = %e, "Advice request failed");
                ADVICE_UNAVAILABLE.to_string()
            }
        }
    }
}

/// The most recent transactions, newest first; undated entries go last
pub fn recent_sample(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted.truncate(limit);
    sorted
}

/// Plain-text digest sent to the advisor
pub fn build_digest(transactions: &[Transaction], taxonomy: &Taxonomy) -> String {
    let sample = recent_sample(transactions, ADVICE_SAMPLE_SIZE);
    let summary = financial_summary(sample.iter().copied());

    let mut lines = vec![
        format!("Transactions analyzed: {}", sample.len()),
        format!("Total income: {:.2}", summary.total_income),
        format!("Total expenses: {:.2}", summary.total_expenses),
        format!("Net balance: {:.2}", summary.total_balance),
    ];

    let top: Vec<String> = category_breakdown(sample.iter().copied(), taxonomy)
        .into_iter()
        .filter(|c| c.kind == TransactionType::Expense)
        .take(TOP_CATEGORIES)
        .map(|c| format!("{} {:.2} ({:.0}%)", c.category, c.total, c.percentage))
        .collect();
    if !top.is_empty() {
        lines.push(format!("Top expense categories: {}", top.join(", ")));
    }

    lines.push(String::new());
    lines.push("Recent transactions (date | type | category | amount | description):".into());
    for t in &sample {
        let date = t
            .timestamp()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| t.date.clone());
        lines.push(format!(
            "{} | {} | {} | {:.2} | {}",
            date,
            t.kind,
            t.category,
            t.amount,
            t.description.trim()
        ));
    }

    lines.join("\n")
}
