//! Transaction operations

use std::cmp::Ordering;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{parse_column, Database};
use crate::error::Result;
use crate::models::Transaction;

const TRANSACTION_COLUMNS: &str = "id, account_id, amount, description, category, sub_category, \
     kind, date, icon, is_recurring, recurrence_id";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        sub_category: row.get(5)?,
        kind: parse_column(6, row.get(6)?)?,
        date: row.get(7)?,
        icon: row.get(8)?,
        is_recurring: row.get(9)?,
        recurrence_id: row.get(10)?,
    })
}

pub(crate) fn write_transaction(conn: &Connection, t: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO transactions
            (id, account_id, amount, description, category, sub_category,
             kind, date, icon, is_recurring, recurrence_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            account_id = excluded.account_id,
            amount = excluded.amount,
            description = excluded.description,
            category = excluded.category,
            sub_category = excluded.sub_category,
            kind = excluded.kind,
            date = excluded.date,
            icon = excluded.icon,
            is_recurring = excluded.is_recurring,
            recurrence_id = excluded.recurrence_id",
        params![
            t.id,
            t.account_id,
            t.amount,
            t.description.trim(),
            t.category,
            t.sub_category,
            t.kind.as_str(),
            t.date,
            t.icon,
            t.is_recurring,
            t.recurrence_id
        ],
    )?;
    Ok(())
}

/// Newest first by parsed date; unparseable dates sort last
fn newest_first(a: &Transaction, b: &Transaction) -> Ordering {
    match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Database {
    /// Insert or replace a single transaction
    ///
    /// The transaction must pass taxonomy validation and reference an
    /// existing account.
    pub fn upsert_transaction(&self, transaction: &Transaction) -> Result<()> {
        transaction.validate(self.taxonomy)?;
        self.require_account(&transaction.account_id)?;

        let conn = self.conn()?;
        write_transaction(&conn, transaction)?;
        debug!(id = %transaction.id, category = %transaction.category, "Transaction saved");
        Ok(())
    }

    /// Insert a batch atomically: either every transaction is stored or none is
    pub fn insert_transactions(&self, transactions: &[Transaction]) -> Result<usize> {
        for t in transactions {
            t.validate(self.taxonomy)?;
            self.require_account(&t.account_id)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for t in transactions {
            write_transaction(&tx, t)?;
        }
        tx.commit()?;

        debug!(count = transactions.len(), "Transaction batch saved");
        Ok(transactions.len())
    }

    /// All transactions, newest first
    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date DESC, id",
            TRANSACTION_COLUMNS
        ))?;

        let mut transactions = stmt
            .query_map([], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Text order is close but mixes bare dates and timestamps
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    /// Transactions for one account, newest first
    pub fn list_account_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE account_id = ? ORDER BY date DESC, id",
            TRANSACTION_COLUMNS
        ))?;

        let mut transactions = stmt
            .query_map(params![account_id], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let transaction = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                transaction_from_row,
            )
            .optional()?;
        Ok(transaction)
    }

    /// Delete a transaction; returns false when it did not exist
    pub fn delete_transaction(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Count transactions
    pub fn count_transactions(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
