//! AI backend response types
//!
//! Backend-agnostic; every backend's raw answer is validated into these.

use serde::{Deserialize, Serialize};

/// A validated answer from the remote classifier
///
/// `category` is the service's own wording and still has to be reconciled
/// against the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteClassification {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Always within 0.0-1.0
    pub confidence: f64,
}

/// Backend details for display
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub backend: &'static str,
    pub host: String,
    pub model: String,
}
