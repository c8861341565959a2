//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Finflow - Track income and expenses with automatic categorization
#[derive(Parser)]
#[command(name = "finflow")]
#[command(about = "Personal finance tracker with automatic categorization", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "finflow.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage accounts (list, add, edit, delete)
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Record a transaction (categorized automatically unless --category is given)
    Add {
        /// Amount (always positive; use --type for direction)
        amount: f64,

        /// Description, e.g. "Uber to airport"
        description: String,

        /// Account name or ID
        #[arg(short, long)]
        account: String,

        /// Transaction type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Date (YYYY-MM-DD or RFC 3339). Defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Category override (skips automatic categorization)
        #[arg(short, long)]
        category: Option<String>,

        /// Number of occurrences to create
        #[arg(long, default_value = "1")]
        repeat: u32,

        /// Spacing between occurrences: daily, weekly, monthly
        #[arg(long, default_value = "monthly")]
        every: String,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long)]
        description: Option<String>,

        /// Account name or ID
        #[arg(long)]
        account: Option<String>,

        /// Transaction type: income or expense
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        date: Option<String>,

        /// Category override; otherwise re-categorized when description or type changes
        #[arg(long)]
        category: Option<String>,
    },

    /// List recent transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Show how a description would be categorized
    Categorize {
        /// Description to categorize
        text: String,

        /// Treat as income instead of expense
        #[arg(long)]
        income: bool,
    },

    /// Show balances, totals and category breakdown
    Dashboard {
        /// Period: month, year, all
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Calendar report for a month or a whole year
    Report {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month 1-12; omit for a yearly report
        #[arg(short, long)]
        month: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Running balance over a period
    Series {
        /// Period: month, year, all
        #[arg(short, long, default_value = "month")]
        period: String,
    },

    /// Ask the AI advisor about recent spending
    Advice,

    /// Manage transaction templates (list, add, delete, apply)
    Templates {
        #[command(subcommand)]
        action: Option<TemplatesAction>,
    },

    /// Export transactions (CSV) or a full backup (JSON)
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Restore a JSON backup, replacing current data
    Import {
        /// JSON backup file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show AI backend configuration and check connectivity
    Ai {
        /// Skip the connectivity check
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List accounts with balances
    List,

    /// Add an account
    Add {
        /// Account name
        name: String,

        /// Account type: savings, card, cash, investment
        #[arg(short = 't', long = "type", default_value = "card")]
        account_type: String,

        /// Display color
        #[arg(short, long, default_value = "#64748b")]
        color: String,
    },

    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        account_type: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete an account and all of its transactions
    Delete {
        /// Account name or ID
        account: String,
    },
}

#[derive(Subcommand)]
pub enum TemplatesAction {
    /// List templates
    List,

    /// Save a template
    Add {
        /// Template name
        name: String,

        amount: f64,

        description: String,

        /// Account name or ID
        #[arg(short, long)]
        account: String,

        /// Transaction type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Category (categorized automatically if omitted)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Delete a template
    Delete {
        /// Template name or ID
        template: String,
    },

    /// Record a transaction from a template
    Apply {
        /// Template name or ID
        template: String,

        /// Date (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}
