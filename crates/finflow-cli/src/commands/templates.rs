//! Template command implementations

use anyhow::{Context, Result};
use finflow_core::ai::RemoteClassifier;
use finflow_core::db::Database;
use finflow_core::models::{Transaction, TransactionTemplate};

use super::{build_draft, format_amount, resolve_date, truncate, NewTransaction};

fn resolve_template(db: &Database, id_or_name: &str) -> Result<TransactionTemplate> {
    db.find_template(id_or_name)?
        .ok_or_else(|| anyhow::anyhow!("Template '{}' not found", id_or_name))
}

pub fn cmd_templates_list(db: &Database) -> Result<()> {
    let templates = db.list_templates()?;

    if templates.is_empty() {
        println!("No templates saved. Create one with:");
        println!("  finflow templates add Rent 800 \"Monthly rent\" --account <name>");
        return Ok(());
    }

    println!();
    println!("📋 Templates");
    println!("   ─────────────────────────────────────────────────────────────");
    for t in templates {
        println!(
            "   {:<16} │ {:>10} │ {:<16} │ {}",
            truncate(&t.name, 16),
            format_amount(t.kind.signed(t.amount)),
            truncate(&t.category, 16),
            truncate(&t.description, 30)
        );
    }

    Ok(())
}

pub async fn cmd_templates_add(
    db: &Database,
    remote: Option<&RemoteClassifier>,
    name: &str,
    input: NewTransaction<'_>,
) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Template name cannot be empty");
    }
    let (draft, _) = build_draft(db, remote, &input).await?;
    let template = TransactionTemplate::from_draft(name.trim(), &draft);

    db.upsert_template(&template)
        .context("Failed to save template")?;
    println!(
        "✅ Saved template {} ({}, {:.2})",
        template.name, template.category, template.amount
    );
    Ok(())
}

pub fn cmd_templates_delete(db: &Database, template: &str) -> Result<()> {
    let existing = resolve_template(db, template)?;
    db.delete_template(&existing.id)?;
    println!("🗑️  Deleted template {}", existing.name);
    Ok(())
}

/// Record a transaction prefilled from a template
pub fn cmd_templates_apply(db: &Database, template: &str, date: Option<&str>) -> Result<Transaction> {
    let template = resolve_template(db, template)?;
    let date = resolve_date(date)?;

    let transaction = template.to_draft(&date).into_transaction();
    db.upsert_transaction(&transaction)
        .context("Failed to save transaction")?;

    println!(
        "✅ Recorded {} │ {} │ {} (from template {})",
        transaction.date,
        format_amount(transaction.signed_amount()),
        truncate(&transaction.description, 40),
        template.name
    );
    Ok(transaction)
}
