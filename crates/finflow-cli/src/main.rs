//! Finflow CLI - Personal finance tracker
//!
//! Usage:
//!   finflow init                                 Initialize database
//!   finflow accounts add "Card" --type card      Create an account
//!   finflow add 12.50 "Uber to airport" -a Card  Record a categorized expense
//!   finflow dashboard --period month             Balances and breakdown
//!   finflow advice                               AI spending advice

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Accounts { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db),
                Some(AccountsAction::Add {
                    name,
                    account_type,
                    color,
                }) => commands::cmd_accounts_add(&db, &name, &account_type, &color).map(|_| ()),
                Some(AccountsAction::Edit {
                    account,
                    name,
                    account_type,
                    color,
                }) => commands::cmd_accounts_edit(
                    &db,
                    &account,
                    name.as_deref(),
                    account_type.as_deref(),
                    color.as_deref(),
                ),
                Some(AccountsAction::Delete { account }) => {
                    commands::cmd_accounts_delete(&db, &account)
                }
            }
        }
        Commands::Add {
            amount,
            description,
            account,
            kind,
            date,
            category,
            repeat,
            every,
        } => {
            let db = commands::open_db(&cli.db)?;
            let remote = commands::remote_from_env();
            commands::cmd_add(
                &db,
                remote.as_ref(),
                commands::NewTransaction {
                    amount,
                    description: &description,
                    account: &account,
                    kind: &kind,
                    date: date.as_deref(),
                    category: category.as_deref(),
                },
                repeat,
                &every,
            )
            .await
            .map(|_| ())
        }
        Commands::Edit {
            id,
            amount,
            description,
            account,
            kind,
            date,
            category,
        } => {
            let db = commands::open_db(&cli.db)?;
            let remote = commands::remote_from_env();
            commands::cmd_edit(
                &db,
                remote.as_ref(),
                &id,
                commands::TransactionEdit {
                    amount,
                    description: description.as_deref(),
                    account: account.as_deref(),
                    kind: kind.as_deref(),
                    date: date.as_deref(),
                    category: category.as_deref(),
                },
            )
            .await
        }
        Commands::List { limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_list(&db, limit)
        }
        Commands::Delete { id } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_delete(&db, &id)
        }
        Commands::Categorize { text, income } => {
            let remote = commands::remote_from_env();
            commands::cmd_categorize(remote.as_ref(), &text, income).await
        }
        Commands::Dashboard { period } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_dashboard(&db, &period)
        }
        Commands::Report { year, month, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_report(&db, year, month, json)
        }
        Commands::Series { period } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_series(&db, &period)
        }
        Commands::Advice => {
            let db = commands::open_db(&cli.db)?;
            let remote = commands::remote_from_env();
            commands::cmd_advice(&db, remote.as_ref()).await
        }
        Commands::Templates { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(TemplatesAction::List) => commands::cmd_templates_list(&db),
                Some(TemplatesAction::Add {
                    name,
                    amount,
                    description,
                    account,
                    kind,
                    category,
                }) => {
                    let remote = commands::remote_from_env();
                    commands::cmd_templates_add(
                        &db,
                        remote.as_ref(),
                        &name,
                        commands::NewTransaction {
                            amount,
                            description: &description,
                            account: &account,
                            kind: &kind,
                            date: None,
                            category: category.as_deref(),
                        },
                    )
                    .await
                }
                Some(TemplatesAction::Delete { template }) => {
                    commands::cmd_templates_delete(&db, &template)
                }
                Some(TemplatesAction::Apply { template, date }) => {
                    commands::cmd_templates_apply(&db, &template, date.as_deref()).map(|_| ())
                }
            }
        }
        Commands::Export { format, out } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_export(&db, &format, out.as_deref())
        }
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &file)
        }
        Commands::Ai { offline } => commands::cmd_ai(offline).await,
    }
}
