//! Export and backup
//!
//! - Transaction CSV export
//! - Full JSON backup (accounts, transactions, templates) with a validating
//!   import that skips bad records instead of rejecting the file

use std::collections::HashSet;
use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Account, Transaction, TransactionTemplate, TransactionType};
use crate::taxonomy::Taxonomy;

/// Current backup format version
pub const BACKUP_VERSION: u32 = 1;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {} (valid: csv, json)", s)),
        }
    }
}

/// Full backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub templates: Vec<TransactionTemplate>,
}

impl Backup {
    pub fn new(
        accounts: Vec<Account>,
        transactions: Vec<Transaction>,
        templates: Vec<TransactionTemplate>,
    ) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            accounts,
            transactions,
            templates,
        }
    }
}

/// What an import kept and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub accounts: usize,
    pub transactions: usize,
    pub templates: usize,
    /// Records that failed to parse or validate
    pub skipped: usize,
}

/// Write transactions as CSV; returns the number of rows written
pub fn export_transactions_csv<W: Write>(transactions: &[Transaction], writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Date", "Description", "Category", "Type", "Amount"])?;

    for t in transactions {
        let date = t
            .timestamp()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| t.date.clone());
        let kind = match t.kind {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        };
        csv.write_record([
            date.as_str(),
            t.description.as_str(),
            t.category.as_str(),
            kind,
            format!("{:.2}", t.amount).as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(transactions.len())
}

/// Write a backup as pretty JSON
pub fn write_backup<W: Write>(backup: &Backup, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, backup)?;
    Ok(())
}

/// Backup as read from disk, before per-record validation
#[derive(Debug, Deserialize)]
struct RawBackup {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    accounts: Vec<Value>,
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    templates: Vec<Value>,
}

/// Read and validate a backup
///
/// A file that is not a backup at all is an error. Inside a valid file,
/// records that do not parse, duplicate an id, point at a missing account
/// or break the taxonomy are skipped and counted.
pub fn read_backup<R: Read>(reader: R, taxonomy: &Taxonomy) -> Result<(Backup, ImportStats)> {
    let raw: RawBackup = serde_json::from_reader(reader)?;

    let version = raw.version.unwrap_or(BACKUP_VERSION);
    if version > BACKUP_VERSION {
        return Err(Error::InvalidData(format!(
            "Backup version {} is newer than supported version {}",
            version, BACKUP_VERSION
        )));
    }

    let mut stats = ImportStats::default();

    let mut account_ids = HashSet::new();
    let accounts: Vec<Account> = parse_records(raw.accounts, &mut stats, "account")
        .into_iter()
        .filter(|a: &Account| {
            let ok = !a.id.trim().is_empty()
                && !a.name.trim().is_empty()
                && account_ids.insert(a.id.clone());
            skip_unless(ok, &mut stats.skipped, "account", &a.id)
        })
        .collect();

    let mut transaction_ids = HashSet::new();
    let transactions: Vec<Transaction> = parse_records(raw.transactions, &mut stats, "transaction")
        .into_iter()
        .filter(|t: &Transaction| {
            let ok = t.validate(taxonomy).is_ok()
                && account_ids.contains(&t.account_id)
                && transaction_ids.insert(t.id.clone());
            skip_unless(ok, &mut stats.skipped, "transaction", &t.id)
        })
        .collect();

    let mut template_ids = HashSet::new();
    let templates: Vec<TransactionTemplate> = parse_records(raw.templates, &mut stats, "template")
        .into_iter()
        .filter(|t: &TransactionTemplate| {
            let ok = !t.id.trim().is_empty()
                && t.amount.is_finite()
                && t.amount >= 0.0
                && taxonomy.is_allowed(t.kind, &t.category)
                && account_ids.contains(&t.account_id)
                && template_ids.insert(t.id.clone());
            skip_unless(ok, &mut stats.skipped, "template", &t.id)
        })
        .collect();

    stats.accounts = accounts.len();
    stats.transactions = transactions.len();
    stats.templates = templates.len();
    debug!(?stats, "Backup read");

    Ok((
        Backup {
            version: BACKUP_VERSION,
            exported_at: raw.exported_at.unwrap_or_else(Utc::now),
            accounts,
            transactions,
            templates,
        },
        stats,
    ))
}

fn parse_records<T: DeserializeOwned>(
    values: Vec<Value>,
    stats: &mut ImportStats,
    what: &str,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable {} in backup", what);
                stats.skipped += 1;
                None
            }
        })
        .collect()
}

fn skip_unless(ok: bool, skipped: &mut usize, what: &str, id: &str) -> bool {
    if !ok {
        warn!(id, "Skipping invalid {} in backup", what);
        *skipped += 1;
    }
    ok
}
