//! Account operations

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{parse_column, Database};
use crate::error::{Error, Result};
use crate::models::Account;

const ACCOUNT_COLUMNS: &str = "id, name, account_type, color";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        account_type: parse_column(2, row.get(2)?)?,
        color: row.get(3)?,
    })
}

impl Database {
    /// Insert an account, or update it in place when the id already exists
    pub fn upsert_account(&self, account: &Account) -> Result<()> {
        if account.id.trim().is_empty() {
            return Err(Error::Validation("account id is empty".into()));
        }
        if account.name.trim().is_empty() {
            return Err(Error::Validation("account name is empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (id, name, account_type, color) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                account_type = excluded.account_type,
                color = excluded.color",
            params![
                account.id,
                account.name.trim(),
                account.account_type.as_str(),
                account.color
            ],
        )?;
        Ok(())
    }

    /// List all accounts, by name
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts ORDER BY name COLLATE NOCASE, id",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account by ID
    pub fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
                params![id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Find an account by exact id or case-insensitive name
    pub fn find_account(&self, id_or_name: &str) -> Result<Option<Account>> {
        if let Some(account) = self.get_account(id_or_name)? {
            return Ok(Some(account));
        }
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1",
                    ACCOUNT_COLUMNS
                ),
                params![id_or_name.trim()],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Delete an account together with its transactions and templates
    ///
    /// Returns false when no such account exists.
    pub fn delete_account(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM accounts WHERE id = ?", params![id])?;
        if deleted > 0 {
            info!(account_id = id, "Deleted account and its transactions");
        }
        Ok(deleted > 0)
    }

    pub(crate) fn require_account(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?)",
            params![id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::NotFound(format!("account {}", id)))
        }
    }
}
