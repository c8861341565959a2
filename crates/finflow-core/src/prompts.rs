//! Prompt library for the remote classifier
//!
//! Prompts are markdown files with YAML front matter and `# System` /
//! `# User` sections. Resolution order:
//! 1. Override in the data dir (~/.local/share/finflow/prompts/overrides/)
//! 2. Embedded default (compiled into the binary)

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

mod defaults {
    pub const CLASSIFY_TRANSACTION: &str =
        include_str!("../../../prompts/classify_transaction.md");
    pub const FINANCIAL_ADVICE: &str = include_str!("../../../prompts/financial_advice.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Pick one category from a closed list
    ClassifyTransaction,
    /// Short advice from a spending digest
    FinancialAdvice,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyTransaction => "classify_transaction",
            Self::FinancialAdvice => "financial_advice",
        }
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyTransaction => defaults::CLASSIFY_TRANSACTION,
            Self::FinancialAdvice => defaults::FINANCIAL_ADVICE,
        }
    }
}

/// Prompt front matter
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// classification | narrative
    pub task_type: String,
}

/// A loaded prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the front matter
    pub content: String,
    pub is_override: bool,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// System section with variables substituted (empty when absent)
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> String {
        self.system_section()
            .map(|s| substitute(s, vars))
            .unwrap_or_default()
    }

    /// User section with variables substituted, or the whole body if there are no sections
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        substitute(self.user_section().unwrap_or(&self.content), vars)
    }
}

/// Loads prompts and caches them for the life of the library
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Library using the default override directory
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Embedded prompts only; used by tests so local overrides never leak in
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        let prompt = match self.cache.entry(id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let loaded = load(self.override_dir.as_ref(), id)?;
                e.insert(loaded)
            }
        };
        Ok(prompt)
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompt override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finflow").join("prompts").join("overrides"))
}

fn load(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", id.as_str()));
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let (metadata, content) = parse_prompt(&content)?;
            tracing::debug!(prompt = id.as_str(), path = %path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content,
                is_override: true,
            });
        }
    }

    let (metadata, content) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content,
        is_override: false,
    })
}

/// Split a prompt file into front matter and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();
    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML front matter (---)".into())
    })?;

    let end = rest
        .find("---")
        .ok_or_else(|| Error::InvalidData("Prompt front matter not closed".into()))?;

    let metadata: PromptMetadata = serde_yaml::from_str(rest[..end].trim())
        .map_err(|e| Error::InvalidData(format!("Invalid prompt front matter: {}", e)))?;

    Ok((metadata, rest[end + 3..].trim().to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after = &content[start + header.len()..];
    let end = after.find("\n# ").unwrap_or(after.len());
    Some(after[..end].trim())
}

/// Replace `{{var}}` placeholders and resolve `{{#if var}}...{{/if}}` blocks
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = resolve_conditionals(template, vars);
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

fn resolve_conditionals(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();

    while let Some(open) = result.find("{{#if ") {
        let name_start = open + 6;
        let Some(name_len) = result[name_start..].find("}}") else {
            break;
        };
        let body_start = name_start + name_len + 2;
        let Some(body_len) = result[body_start..].find("{{/if}}") else {
            break;
        };

        let name = &result[name_start..name_start + name_len];
        let keep = vars.get(name).is_some_and(|v| !v.is_empty());
        let body = if keep {
            &result[body_start..body_start + body_len]
        } else {
            ""
        };
        result = format!(
            "{}{}{}",
            &result[..open],
            body,
            &result[body_start + body_len + 7..]
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = "---\nid: sample\nversion: 2\ntask_type: classification\n---\n\n# System\nBe brief.\n\n# User\nClassify {{description}}.\n";
        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "sample");
        assert_eq!(metadata.version, 2);
        assert!(body.starts_with("# System"));
    }

    #[test]
    fn test_missing_front_matter() {
        assert!(parse_prompt("# System\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n").is_err());
    }

    #[test]
    fn test_sections_and_render() {
        let (metadata, content) = parse_prompt(
            "---\nid: t\nversion: 1\ntask_type: classification\n---\n# System\nYou sort {{kind}} entries.\n# User\nDescription: {{description}}{{#if hint}}\nHint: {{hint}}{{/if}}",
        )
        .unwrap();
        let prompt = Prompt {
            metadata,
            content,
            is_override: false,
        };

        let mut vars = HashMap::new();
        vars.insert("kind", "expense");
        vars.insert("description", "Uber to airport");
        assert_eq!(prompt.render_system(&vars), "You sort expense entries.");
        assert_eq!(prompt.render_user(&vars), "Description: Uber to airport");

        vars.insert("hint", "travel");
        assert!(prompt.render_user(&vars).ends_with("Hint: travel"));
    }

    #[test]
    fn test_embedded_prompts_load() {
        let mut lib = PromptLibrary::embedded_only();
        for id in [PromptId::ClassifyTransaction, PromptId::FinancialAdvice] {
            let prompt = lib.get(id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("financial_advice.md"),
            "---\nid: financial_advice\nversion: 9\ntask_type: narrative\n---\n# User\nCustom {{digest}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::FinancialAdvice));
        assert!(!lib.has_override(PromptId::ClassifyTransaction));

        let prompt = lib.get(PromptId::FinancialAdvice).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);
    }
}
