//! Whole-store snapshot and restore

use std::io::{Read, Write};

use tracing::info;

use super::templates::write_template;
use super::transactions::write_transaction;
use super::Database;
use crate::error::Result;
use crate::export::{read_backup, write_backup, Backup, ImportStats};

impl Database {
    /// Snapshot every account, transaction and template
    pub fn snapshot(&self) -> Result<Backup> {
        Ok(Backup::new(
            self.list_accounts()?,
            self.list_transactions()?,
            self.list_templates()?,
        ))
    }

    /// Replace all stored data with the backup's contents in one SQL transaction
    ///
    /// The backup is expected to be validated already (see [`read_backup`]);
    /// a broken account reference still aborts the whole restore.
    pub fn replace_all(&self, backup: &Backup) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            r#"
            DELETE FROM templates;
            DELETE FROM transactions;
            DELETE FROM accounts;
            "#,
        )?;

        for a in &backup.accounts {
            tx.execute(
                "INSERT INTO accounts (id, name, account_type, color) VALUES (?, ?, ?, ?)",
                rusqlite::params![a.id, a.name, a.account_type.as_str(), a.color],
            )?;
        }
        for t in &backup.transactions {
            write_transaction(&tx, t)?;
        }
        for t in &backup.templates {
            write_template(&tx, t)?;
        }

        tx.commit()?;
        info!(
            accounts = backup.accounts.len(),
            transactions = backup.transactions.len(),
            templates = backup.templates.len(),
            "Store replaced from backup"
        );
        Ok(())
    }

    /// Write a JSON backup of the whole store
    pub fn export_backup<W: Write>(&self, writer: W) -> Result<Backup> {
        let backup = self.snapshot()?;
        write_backup(&backup, writer)?;
        Ok(backup)
    }

    /// Validate a JSON backup and replace the store with its valid records
    pub fn import_backup<R: Read>(&self, reader: R) -> Result<ImportStats> {
        let (backup, stats) = read_backup(reader, self.taxonomy)?;
        self.replace_all(&backup)?;
        Ok(stats)
    }
}
