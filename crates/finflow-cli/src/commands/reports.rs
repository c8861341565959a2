//! Report command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use finflow_core::db::Database;
use finflow_core::models::{CategoryTotal, ReportWindow, TransactionType};
use finflow_core::reports::{self, Period};
use finflow_core::taxonomy::Taxonomy;

use super::{format_amount, truncate};

fn parse_period(period: &str) -> Result<Period> {
    period.parse::<Period>().map_err(anyhow::Error::msg)
}

pub fn cmd_dashboard(db: &Database, period: &str) -> Result<()> {
    let period = parse_period(period)?;
    let now = Utc::now();

    let accounts = db.list_accounts()?;
    let transactions = db.list_transactions()?;
    let in_period = reports::filter_by_period(&transactions, period, now);
    let summary = reports::financial_summary(in_period.iter().copied());
    let comparison = reports::month_over_month(&transactions, now);

    println!();
    println!("📊 Finflow Dashboard ({})", period_label(period));
    println!("   ─────────────────────────────────────────────");
    println!("   Balance:   {}", format_amount(summary.total_balance));
    println!("   Income:    {:.2}", summary.total_income);
    println!("   Expenses:  {:.2}", summary.total_expenses);
    println!(
        "   This month vs last: {} ({:+.1}%)",
        format_amount(comparison.current),
        comparison.percent_change
    );

    if !accounts.is_empty() {
        println!();
        println!("🏦 Accounts (all time)");
        for balance in reports::account_balances(&accounts, &transactions) {
            println!(
                "   {:<24} {:>12}",
                truncate(&balance.name, 24),
                format_amount(balance.balance)
            );
        }
    }

    let breakdown = reports::category_breakdown(in_period.iter().copied(), Taxonomy::standard());
    print_breakdown(&breakdown);

    if transactions.is_empty() {
        println!();
        println!("   💡 Tip: Record a transaction with: finflow add 4.50 \"Starbucks\" --account <name>");
    }

    Ok(())
}

pub fn cmd_report(db: &Database, year: Option<i32>, month: Option<u32>, json: bool) -> Result<()> {
    let now = Utc::now();
    let transactions = db.list_transactions()?;
    let year = year.unwrap_or_else(|| now.year());

    let window = match month {
        Some(month) => ReportWindow::Month { year, month },
        None => ReportWindow::Year { year },
    };
    if reports::window_bounds(window).is_none() {
        anyhow::bail!("Invalid report window: month must be 1-12");
    }

    let report = reports::period_report(&transactions, window, Taxonomy::standard());
    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    let title = match window {
        ReportWindow::Month { year, month } => format!("{}-{:02}", year, month),
        ReportWindow::Year { year } => year.to_string(),
    };
    println!();
    println!("📅 Report for {}", title);
    println!("   ─────────────────────────────────────────────");
    println!("   Income:    {:.2}", report.total_income);
    println!("   Expenses:  {:.2}", report.total_expenses);
    println!(
        "   Net:       {}",
        format_amount(report.total_income - report.total_expenses)
    );
    print_breakdown(&report.categories);

    let years = reports::available_years(&transactions, now);
    println!();
    println!(
        "   Years with data: {}",
        years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

pub fn cmd_series(db: &Database, period: &str) -> Result<()> {
    let period = parse_period(period)?;
    let transactions = db.list_transactions()?;
    let series = reports::running_balance(&transactions, period, Utc::now());

    if series.is_empty() {
        println!("No dated transactions in this period.");
        return Ok(());
    }

    println!();
    println!("📈 Running balance ({})", period_label(period));
    println!("   ─────────────────────────────────────────────");
    for point in &series {
        println!(
            "   {} │ {:>12}",
            point.date.format("%Y-%m-%d"),
            format_amount(point.balance)
        );
    }

    Ok(())
}

fn print_breakdown(categories: &[CategoryTotal]) {
    for kind in [TransactionType::Expense, TransactionType::Income] {
        let rows: Vec<&CategoryTotal> = categories.iter().filter(|c| c.kind == kind).collect();
        if rows.is_empty() {
            continue;
        }

        println!();
        match kind {
            TransactionType::Expense => println!("💸 Expenses by category"),
            TransactionType::Income => println!("💰 Income by category"),
        }
        for c in rows {
            println!(
                "   {:<26} {:>10.2}  {:>5.1}%  ({} tx)",
                truncate(&c.category, 26),
                c.total,
                c.percentage,
                c.transaction_count
            );
            for sub in &c.sub_categories {
                println!(
                    "     └ {:<22} {:>10.2}  {:>5.1}%",
                    truncate(&sub.name, 22),
                    sub.total,
                    sub.percentage
                );
            }
        }
    }
}

fn period_label(period: Period) -> &'static str {
    match period {
        Period::Month => "last month",
        Period::Year => "last 12 months",
        Period::All => "all time",
    }
}
