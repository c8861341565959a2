//! Account command implementations

use anyhow::{Context, Result};
use finflow_core::db::Database;
use finflow_core::models::{Account, AccountType};
use finflow_core::reports;

use super::{format_amount, resolve_account, truncate};

fn parse_account_type(s: &str) -> Result<AccountType> {
    s.parse::<AccountType>().map_err(anyhow::Error::msg)
}

pub fn cmd_accounts_list(db: &Database) -> Result<()> {
    let accounts = db.list_accounts()?;

    if accounts.is_empty() {
        println!("No accounts yet. Create one with:");
        println!("  finflow accounts add \"Everyday Card\" --type card");
        return Ok(());
    }

    let transactions = db.list_transactions()?;
    let balances = reports::account_balances(&accounts, &transactions);

    println!();
    println!("🏦 Accounts");
    println!("   ─────────────────────────────────────────────────────────────");
    for (account, balance) in accounts.iter().zip(&balances) {
        println!(
            "   {:<24} │ {:<10} │ {:>12} │ {}",
            truncate(&account.name, 24),
            account.account_type,
            format_amount(balance.balance),
            account.id
        );
    }

    Ok(())
}

pub fn cmd_accounts_add(db: &Database, name: &str, account_type: &str, color: &str) -> Result<Account> {
    let account = Account::new(name.trim(), parse_account_type(account_type)?, color);
    db.upsert_account(&account)
        .context("Failed to create account")?;

    println!("✅ Created account {} ({})", account.name, account.account_type);
    println!("   ID: {}", account.id);
    Ok(account)
}

pub fn cmd_accounts_edit(
    db: &Database,
    account: &str,
    name: Option<&str>,
    account_type: Option<&str>,
    color: Option<&str>,
) -> Result<()> {
    let mut existing = resolve_account(db, account)?;

    if let Some(name) = name {
        existing.name = name.trim().to_string();
    }
    if let Some(t) = account_type {
        existing.account_type = parse_account_type(t)?;
    }
    if let Some(color) = color {
        existing.color = color.to_string();
    }

    db.upsert_account(&existing)
        .context("Failed to update account")?;
    println!("✅ Updated account {}", existing.name);
    Ok(())
}

pub fn cmd_accounts_delete(db: &Database, account: &str) -> Result<()> {
    let existing = resolve_account(db, account)?;
    let count = db.list_account_transactions(&existing.id)?.len();

    db.delete_account(&existing.id)?;
    println!(
        "🗑️  Deleted account {} and {} transaction(s)",
        existing.name, count
    );
    Ok(())
}
