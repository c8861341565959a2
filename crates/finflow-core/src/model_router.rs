//! Model tiers for the remote classifier
//!
//! Each backend has an ordered list of models. The remote classifier tries
//! them in order and only moves on after a transient failure.
//!
//! ## Configuration Resolution
//!
//! 1. Override in the data dir (~/.local/share/finflow/config/models.toml)
//! 2. Embedded default (compiled into the binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// One model attempt in the retry chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTier {
    pub model: String,
    /// Upper bound for a single request against this model
    pub timeout: Duration,
}

impl ModelTier {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            model: model.to_string(),
            timeout,
        }
    }
}

/// Parsed router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub default_timeout: Duration,
    /// Backend name → ordered tiers
    pub backends: HashMap<String, Vec<ModelTier>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            backends: HashMap::new(),
        }
    }
}

/// Resolves the model tiers for a backend
#[derive(Debug, Clone)]
pub struct ModelRouter {
    config: RouterConfig,
    config_path: Option<PathBuf>,
}

impl ModelRouter {
    /// Load from the override location, falling back to the embedded default
    pub fn new() -> Result<Self> {
        let path = default_config_path();
        let config = load_config(path.as_deref())?;
        Ok(Self {
            config,
            config_path: path.filter(|p| p.exists()),
        })
    }

    /// Load from an explicit file; a missing file means the embedded default
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let config = load_config(Some(&path))?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Embedded default only
    pub fn embedded() -> Result<Self> {
        Ok(Self::with_config(parse_config(DEFAULT_CONFIG)?))
    }

    /// Ordered tiers for a backend
    ///
    /// Backends without a configured list get a single tier running
    /// `default_model` with the default timeout.
    pub fn tiers_for(&self, backend: &str, default_model: &str) -> Vec<ModelTier> {
        match self.config.backends.get(backend) {
            Some(tiers) if !tiers.is_empty() => tiers.clone(),
            _ => vec![ModelTier::new(default_model, self.config.default_timeout)],
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The override file in use, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new()
            .or_else(|e| {
                tracing::warn!(error = %e, "Invalid model config, using embedded default");
                Self::embedded()
            })
            .unwrap_or_else(|_| Self::with_config(RouterConfig::default()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finflow").join("config").join("models.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<RouterConfig> {
    match override_path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            parse_config(&content)
        }
        _ => parse_config(DEFAULT_CONFIG),
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    #[serde(flatten)]
    backends: HashMap<String, Vec<RawTier>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawTier {
    model: String,
    timeout_secs: Option<u64>,
}

fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let default_timeout = Duration::from_secs(
        raw.defaults
            .and_then(|d| d.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    let mut backends = HashMap::new();
    for (name, tiers) in raw.backends {
        let tiers: Vec<ModelTier> = tiers
            .into_iter()
            .map(|t| ModelTier {
                timeout: t.timeout_secs.map(Duration::from_secs).unwrap_or(default_timeout),
                model: t.model,
            })
            .collect();
        if tiers.iter().any(|t| t.model.trim().is_empty()) {
            return Err(Error::Config(format!("backend '{}' has a tier without a model", name)));
        }
        backends.insert(name.to_lowercase(), tiers);
    }

    Ok(RouterConfig {
        default_timeout,
        backends,
    })
}
