//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `remote_from_env` - Remote classifier from environment configuration
//! - `cmd_init` - Initialize the database
//! - Argument parsing helpers shared by several commands

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use finflow_core::ai::RemoteClassifier;
use finflow_core::db::Database;
use finflow_core::models::{parse_date, Account, TransactionType};

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Remote classifier configured from the environment, if any
pub fn remote_from_env() -> Option<RemoteClassifier> {
    let remote = RemoteClassifier::from_env();
    if remote.is_none() {
        tracing::debug!("No AI backend configured; using keyword rules only");
    }
    remote
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create an account: finflow accounts add \"Everyday Card\" --type card");
    println!("  2. Record something: finflow add 4.50 \"Starbucks\" --account \"Everyday Card\"");
    println!("  3. See where it goes: finflow dashboard");

    Ok(())
}

/// Resolve an account by ID or name
pub fn resolve_account(db: &Database, id_or_name: &str) -> Result<Account> {
    db.find_account(id_or_name)?
        .ok_or_else(|| anyhow::anyhow!("Account '{}' not found", id_or_name))
}

pub fn parse_kind(kind: &str) -> Result<TransactionType> {
    kind.parse::<TransactionType>().map_err(anyhow::Error::msg)
}

/// Validate a user-supplied date, defaulting to today
pub fn resolve_date(date: Option<&str>) -> Result<String> {
    match date {
        None => Ok(Utc::now().format("%Y-%m-%d").to_string()),
        Some(d) => {
            let d = d.trim();
            if parse_date(d).is_none() {
                anyhow::bail!("Invalid date '{}' (use YYYY-MM-DD or RFC 3339)", d);
            }
            Ok(d.to_string())
        }
    }
}

/// Fields for a new transaction or template, as given on the command line
pub struct NewTransaction<'a> {
    pub amount: f64,
    pub description: &'a str,
    pub account: &'a str,
    pub kind: &'a str,
    pub date: Option<&'a str>,
    pub category: Option<&'a str>,
}
