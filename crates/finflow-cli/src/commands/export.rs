//! Export and import command implementations
//!
//! - `cmd_export` - Transactions as CSV or a full JSON backup
//! - `cmd_import` - Restore a JSON backup

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use finflow_core::db::Database;
use finflow_core::export::{export_transactions_csv, ExportFormat};

pub fn cmd_export(db: &Database, format: &str, out: Option<&Path>) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;

    let writer: Box<dyn Write> = match out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        ExportFormat::Csv => {
            let transactions = db.list_transactions()?;
            let count = export_transactions_csv(&transactions, writer)
                .context("Failed to write CSV export")?;
            if let Some(path) = out {
                eprintln!("✅ Exported {} transactions to {}", count, path.display());
            }
        }
        ExportFormat::Json => {
            let backup = db
                .export_backup(writer)
                .context("Failed to write backup")?;
            if let Some(path) = out {
                eprintln!(
                    "✅ Backed up {} accounts, {} transactions, {} templates to {}",
                    backup.accounts.len(),
                    backup.transactions.len(),
                    backup.templates.len(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}

pub fn cmd_import(db: &Database, file: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );

    println!("📥 Restoring backup from {}...", file.display());
    let stats = db
        .import_backup(reader)
        .context("Failed to import backup")?;

    println!("✅ Restore complete (previous data replaced)");
    println!("   Accounts:     {}", stats.accounts);
    println!("   Transactions: {}", stats.transactions);
    println!("   Templates:    {}", stats.templates);
    if stats.skipped > 0 {
        println!("   ⚠️  Skipped {} invalid record(s) (see warnings above)", stats.skipped);
    }

    Ok(())
}
