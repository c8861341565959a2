//! Domain models for finflow

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::taxonomy::Taxonomy;

/// An account that transactions are recorded against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Display tag, opaque to the engine
    #[serde(default)]
    pub color: String,
}

impl Account {
    pub fn new(name: &str, account_type: AccountType, color: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            account_type,
            color: color.to_string(),
        }
    }
}

/// Account types
///
/// Older backups use the Spanish labels, which are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[serde(alias = "AHORRO", alias = "SAVINGS")]
    Savings,
    #[serde(alias = "TARJETA", alias = "CARD")]
    Card,
    #[serde(alias = "EFECTIVO", alias = "CASH")]
    Cash,
    #[serde(alias = "INVERSION", alias = "INVESTMENT")]
    Investment,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Investment => "investment",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savings" | "ahorro" => Ok(Self::Savings),
            "card" | "tarjeta" => Ok(Self::Card),
            "cash" | "efectivo" => Ok(Self::Cash),
            "investment" | "inversion" => Ok(Self::Investment),
            _ => Err(format!(
                "Unknown account type: {} (valid: savings, card, cash, investment)",
                s
            )),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a transaction; the stored amount is always non-negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    /// Income counts up, expenses count down
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" | "ingreso" => Ok(Self::Income),
            "expense" | "gasto" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {} (valid: income, expense)", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// ISO-8601 date or timestamp, kept as text so one bad row never fails a load
    pub date: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
}

fn default_icon() -> String {
    "other".to_string()
}

impl Transaction {
    /// Parsed date, or None when the stored text is not a calendar date
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.date)
    }

    /// Amount with the sign implied by the transaction type
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }

    /// Whether the amount can take part in totals
    pub fn has_valid_amount(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }

    /// Check the data-model invariants against a taxonomy
    pub fn validate(&self, taxonomy: &Taxonomy) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("transaction id is empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Validation(format!(
                "transaction {} has an empty description",
                self.id
            )));
        }
        if !self.has_valid_amount() {
            return Err(Error::Validation(format!(
                "transaction {} has invalid amount {}",
                self.id, self.amount
            )));
        }
        if !taxonomy.is_allowed(self.kind, &self.category) {
            return Err(Error::Validation(format!(
                "category '{}' is not allowed for {} transactions",
                self.category, self.kind
            )));
        }
        if self.timestamp().is_none() {
            return Err(Error::Validation(format!(
                "transaction {} has unparseable date '{}'",
                self.id, self.date
            )));
        }
        Ok(())
    }
}

/// A transaction before it has been assigned an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub account_id: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub date: String,
    pub icon: String,
}

impl TransactionDraft {
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }

    /// Fill category, subcategory and icon from a categorization result
    pub fn apply_categorization(&mut self, result: &CategorizationResult) {
        self.category = result.category.clone();
        self.sub_category = result.sub_category.clone();
        self.icon = result.icon.clone();
    }

    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: new_id(),
            account_id: self.account_id,
            amount: self.amount,
            description: self.description,
            category: self.category,
            sub_category: self.sub_category,
            kind: self.kind,
            date: self.date,
            icon: self.icon,
            is_recurring: false,
            recurrence_id: None,
        }
    }
}

/// Reusable prototype for a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTemplate {
    pub id: String,
    /// Label shown when picking a template
    pub name: String,
    pub account_id: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default = "default_icon")]
    pub icon: String,
}

/// Where a categorization came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorizationSource {
    /// Deterministic keyword rule
    Rule,
    /// Remote AI classifier, reconciled against the taxonomy
    Remote,
    /// Low-confidence catch-all
    Fallback,
    /// Picked by the user
    Manual,
}

impl CategorizationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Remote => "remote",
            Self::Fallback => "fallback",
            Self::Manual => "manual",
        }
    }
}

/// Outcome of classifying a description (not persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationResult {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub icon: String,
    /// 0.0-1.0; rule hits and manual choices are always 1.0, remote answers pass through
    pub confidence: f64,
    pub source: CategorizationSource,
}

/// How a recurring entry repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceFrequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl std::str::FromStr for RecurrenceFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!(
                "Unknown frequency: {} (valid: none, daily, weekly, monthly)",
                s
            )),
        }
    }
}

// ========== Report Models ==========

/// Dashboard totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
}

/// Signed balance of one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub name: String,
    pub balance: f64,
}

/// Current month against the previous calendar month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
}

/// A subcategory inside a category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategoryTotal {
    pub name: String,
    pub total: f64,
    /// Share of the parent category
    pub percentage: f64,
}

/// One category of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub kind: TransactionType,
    pub icon: String,
    pub total: f64,
    /// Share of all transactions of the same type in the period
    pub percentage: f64,
    pub transaction_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_categories: Vec<SubCategoryTotal>,
}

/// Calendar window for the detailed report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportWindow {
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

/// Detailed report for a calendar month or year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub window: ReportWindow,
    pub total_income: f64,
    pub total_expenses: f64,
    pub categories: Vec<CategoryTotal>,
}

/// One point of the balance-over-time chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: DateTime<Utc>,
    pub transaction_id: String,
    pub balance: f64,
}

/// Generate a new record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse an ISO-8601 timestamp or a bare `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
