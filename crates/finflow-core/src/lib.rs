//! Finflow Core Library
//!
//! Categorization and aggregation engine for the finflow personal finance tracker:
//! - Fixed category taxonomy with keyword rules and aliases
//! - Deterministic keyword classifier
//! - Remote AI classifier (Gemini, Ollama) with tiered model fallback
//! - Layered categorizer: rules, then remote, then catch-all
//! - Reports: balances, period filters, category breakdowns, running balance
//! - Advice summarizer over recent activity
//! - Recurring entries and templates
//! - CSV export and JSON backup
//! - SQLite store with connection pooling

pub mod advice;
pub mod ai;
pub mod categorize;
pub mod db;
pub mod error;
pub mod export;
pub mod model_router;
pub mod models;
pub mod prompts;
pub mod recurrence;
pub mod reports;
pub mod rules;
pub mod taxonomy;

/// Test utilities including mock Gemini/Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advice::AdviceSummarizer;
pub use ai::{
    AIBackend, AIClient, BackendInfo, GeminiBackend, MockBackend, MockFailure, OllamaBackend,
    RemoteClassification, RemoteClassifier,
};
pub use categorize::Categorizer;
pub use db::Database;
pub use error::{Error, Result};
pub use export::{Backup, ExportFormat, ImportStats};
pub use model_router::{ModelRouter, ModelTier, RouterConfig};
pub use models::*;
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use recurrence::expand_recurrence;
pub use reports::Period;
pub use rules::RuleClassifier;
pub use taxonomy::Taxonomy;
