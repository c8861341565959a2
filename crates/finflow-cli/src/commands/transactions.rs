//! Transaction command implementations

use anyhow::{Context, Result};
use finflow_core::ai::RemoteClassifier;
use finflow_core::categorize::Categorizer;
use finflow_core::db::Database;
use finflow_core::models::{
    CategorizationResult, CategorizationSource, RecurrenceFrequency, Transaction,
    TransactionDraft, TransactionType,
};
use finflow_core::recurrence::expand_recurrence;
use finflow_core::rules::NO_MATCH_CONFIDENCE;
use finflow_core::taxonomy::Taxonomy;

use super::{format_amount, parse_kind, resolve_account, resolve_date, truncate, NewTransaction};

/// Categorization for a description, honoring an explicit category override
///
/// An override goes through alias resolution, so "groceries" lands on
/// "Food and Drink". Overrides that match nothing are rejected.
pub async fn categorize_with_override(
    remote: Option<&RemoteClassifier>,
    description: &str,
    kind: TransactionType,
    category: Option<&str>,
) -> Result<CategorizationResult> {
    let taxonomy = Taxonomy::standard();
    match category {
        Some(requested) => {
            let category = taxonomy.reconcile(requested, kind).ok_or_else(|| {
                anyhow::anyhow!(
                    "Category '{}' is not valid for {} transactions. Valid: {}",
                    requested,
                    kind,
                    taxonomy.allowed(kind).join(", ")
                )
            })?;
            Ok(CategorizationResult {
                category: category.to_string(),
                sub_category: None,
                icon: taxonomy.icon_for(category).to_string(),
                confidence: 1.0,
                source: CategorizationSource::Manual,
            })
        }
        None => Ok(Categorizer::standard(remote)
            .categorize(description, kind)
            .await),
    }
}

/// Build the draft for a new transaction, categorized
pub async fn build_draft(
    db: &Database,
    remote: Option<&RemoteClassifier>,
    input: &NewTransaction<'_>,
) -> Result<(TransactionDraft, CategorizationResult)> {
    let account = resolve_account(db, input.account)?;
    let kind = parse_kind(input.kind)?;
    let date = resolve_date(input.date)?;

    if input.description.trim().is_empty() {
        anyhow::bail!("Description cannot be empty");
    }
    if !input.amount.is_finite() || input.amount < 0.0 {
        anyhow::bail!("Amount must be a non-negative number (use --type for direction)");
    }

    let result = categorize_with_override(remote, input.description, kind, input.category).await?;

    let mut draft = TransactionDraft {
        account_id: account.id,
        amount: input.amount,
        description: input.description.trim().to_string(),
        category: String::new(),
        sub_category: None,
        kind,
        date,
        icon: String::new(),
    };
    draft.apply_categorization(&result);
    Ok((draft, result))
}

pub async fn cmd_add(
    db: &Database,
    remote: Option<&RemoteClassifier>,
    input: NewTransaction<'_>,
    repeat: u32,
    every: &str,
) -> Result<Vec<Transaction>> {
    let frequency: RecurrenceFrequency = every.parse().map_err(anyhow::Error::msg)?;
    let (draft, result) = build_draft(db, remote, &input).await?;

    let transactions = expand_recurrence(&draft, repeat, frequency);
    db.insert_transactions(&transactions)
        .context("Failed to save transaction")?;

    println!(
        "✅ Recorded {} │ {} │ {}",
        draft.date,
        format_amount(draft.signed_amount()),
        truncate(&draft.description, 40)
    );
    print_categorization(&result);
    if transactions.len() > 1 {
        println!(
            "   🔁 Repeats {} times ({}), last on {}",
            transactions.len(),
            every.to_lowercase(),
            transactions.last().map(|t| t.date.as_str()).unwrap_or_default()
        );
    }

    Ok(transactions)
}

/// Requested changes to a transaction; None leaves a field as is
pub struct TransactionEdit<'a> {
    pub amount: Option<f64>,
    pub description: Option<&'a str>,
    pub account: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub date: Option<&'a str>,
    pub category: Option<&'a str>,
}

pub async fn cmd_edit(
    db: &Database,
    remote: Option<&RemoteClassifier>,
    id: &str,
    edit: TransactionEdit<'_>,
) -> Result<()> {
    let mut tx = db
        .get_transaction(id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    let mut recategorize = false;
    if let Some(amount) = edit.amount {
        tx.amount = amount;
    }
    if let Some(description) = edit.description {
        recategorize |= description.trim() != tx.description;
        tx.description = description.trim().to_string();
    }
    if let Some(account) = edit.account {
        tx.account_id = resolve_account(db, account)?.id;
    }
    if let Some(kind) = edit.kind {
        let kind = parse_kind(kind)?;
        recategorize |= kind != tx.kind;
        tx.kind = kind;
    }
    if let Some(date) = edit.date {
        tx.date = resolve_date(Some(date))?;
    }

    if edit.category.is_some() || recategorize {
        let result = categorize_with_override(remote, &tx.description, tx.kind, edit.category).await?;
        tx.category = result.category.clone();
        tx.sub_category = result.sub_category.clone();
        tx.icon = result.icon.clone();
        print_categorization(&result);
    }

    db.upsert_transaction(&tx)
        .context("Failed to update transaction")?;
    println!("✅ Updated transaction {}", tx.id);
    Ok(())
}

pub fn cmd_list(db: &Database, limit: usize) -> Result<()> {
    let transactions = db.list_transactions()?;

    if transactions.is_empty() {
        println!("No transactions found. Record one with:");
        println!("  finflow add 4.50 \"Starbucks\" --account \"Everyday Card\"");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions.iter().take(limit) {
        let recurring = if tx.is_recurring { "🔁" } else { "  " };
        println!(
            "   {} │ {:>10} │ {:<16} │ {} {} [{}]",
            date_only(&tx.date),
            format_amount(tx.signed_amount()),
            truncate(&tx.category, 16),
            recurring,
            truncate(&tx.description, 36),
            tx.id
        );
    }

    if transactions.len() > limit {
        println!();
        println!("   ... {} more (use --limit to show more)", transactions.len() - limit);
    }

    Ok(())
}

pub fn cmd_delete(db: &Database, id: &str) -> Result<()> {
    let tx = db
        .get_transaction(id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    db.delete_transaction(id)?;
    println!(
        "🗑️  Deleted {} │ {} │ {}",
        date_only(&tx.date),
        format_amount(tx.signed_amount()),
        truncate(&tx.description, 40)
    );
    Ok(())
}

pub async fn cmd_categorize(
    remote: Option<&RemoteClassifier>,
    text: &str,
    income: bool,
) -> Result<()> {
    let kind = if income {
        TransactionType::Income
    } else {
        TransactionType::Expense
    };
    let result = Categorizer::standard(remote).categorize(text, kind).await;

    println!("\"{}\" ({})", text, kind);
    print_categorization(&result);
    if remote.is_none() && result.confidence == NO_MATCH_CONFIDENCE {
        println!("   💡 Tip: Set GEMINI_API_KEY to classify descriptions the keyword rules miss");
    }
    Ok(())
}

fn print_categorization(result: &CategorizationResult) {
    let category = match &result.sub_category {
        Some(sub) => format!("{} › {}", result.category, sub),
        None => result.category.clone(),
    };
    println!(
        "   🏷️  {} ({}, confidence {:.2})",
        category,
        result.source.as_str(),
        result.confidence
    );
}

/// YYYY-MM-DD part of a stored date
pub fn date_only(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}
