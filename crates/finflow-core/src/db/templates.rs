//! Transaction template operations

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parse_column, Database};
use crate::error::{Error, Result};
use crate::models::TransactionTemplate;

const TEMPLATE_COLUMNS: &str = "id, name, account_id, amount, description, category, kind, icon";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionTemplate> {
    Ok(TransactionTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        account_id: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        kind: parse_column(6, row.get(6)?)?,
        icon: row.get(7)?,
    })
}

pub(crate) fn write_template(conn: &Connection, t: &TransactionTemplate) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO templates (id, name, account_id, amount, description, category, kind, icon)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            account_id = excluded.account_id,
            amount = excluded.amount,
            description = excluded.description,
            category = excluded.category,
            kind = excluded.kind,
            icon = excluded.icon",
        params![
            t.id,
            t.name.trim(),
            t.account_id,
            t.amount,
            t.description,
            t.category,
            t.kind.as_str(),
            t.icon
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert or replace a template
    pub fn upsert_template(&self, template: &TransactionTemplate) -> Result<()> {
        if template.name.trim().is_empty() {
            return Err(Error::Validation("template name is empty".into()));
        }
        if !template.amount.is_finite() || template.amount < 0.0 {
            return Err(Error::Validation(format!(
                "template '{}' has invalid amount {}",
                template.name, template.amount
            )));
        }
        if !self.taxonomy.is_allowed(template.kind, &template.category) {
            return Err(Error::Validation(format!(
                "category '{}' is not allowed for {} transactions",
                template.category, template.kind
            )));
        }
        self.require_account(&template.account_id)?;

        let conn = self.conn()?;
        write_template(&conn, template)?;
        Ok(())
    }

    /// List templates by name
    pub fn list_templates(&self) -> Result<Vec<TransactionTemplate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM templates ORDER BY name COLLATE NOCASE, id",
            TEMPLATE_COLUMNS
        ))?;

        let templates = stmt
            .query_map([], template_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    /// Find a template by exact id or case-insensitive name
    pub fn find_template(&self, id_or_name: &str) -> Result<Option<TransactionTemplate>> {
        let conn = self.conn()?;
        let template = conn
            .query_row(
                &format!(
                    "SELECT {} FROM templates WHERE id = ?1 OR name = ?1 COLLATE NOCASE
                     ORDER BY id = ?1 DESC LIMIT 1",
                    TEMPLATE_COLUMNS
                ),
                params![id_or_name.trim()],
                template_from_row,
            )
            .optional()?;
        Ok(template)
    }

    /// Delete a template; returns false when it did not exist
    pub fn delete_template(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM templates WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
