//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, remote_from_env, parsing helpers)
//! - `accounts` - Account management commands
//! - `transactions` - Add, edit, list, delete and categorize
//! - `reports` - Dashboard, calendar report and balance series
//! - `templates` - Template management commands
//! - `export` - CSV export, JSON backup and restore
//! - `ai` - Advice and AI backend status

pub mod accounts;
pub mod ai;
pub mod core;
pub mod export;
pub mod reports;
pub mod templates;
pub mod transactions;

// Re-export command functions for main.rs
pub use accounts::*;
pub use ai::*;
pub use core::*;
pub use export::*;
pub use reports::*;
pub use templates::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a signed amount with color: green for income, red for expenses
pub fn format_amount(signed: f64) -> String {
    if signed < 0.0 {
        format!("\x1b[31m-{:.2}\x1b[0m", signed.abs())
    } else {
        format!("\x1b[32m+{:.2}\x1b[0m", signed)
    }
}
