//! Dashboard aggregation
//!
//! Pure functions over transaction snapshots. Nothing here fails: entries
//! with an invalid amount contribute zero and entries with an unparseable
//! date are left out of anything that depends on the date. Input order does
//! not matter.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

use crate::models::{
    Account, AccountBalance, BalancePoint, CategoryTotal, FinancialSummary, MonthComparison,
    PeriodReport, ReportWindow, SubCategoryTotal, Transaction, TransactionType,
};
use crate::taxonomy::Taxonomy;

/// Label for transactions without a subcategory
pub const GENERAL_SUBCATEGORY: &str = "General";

/// Rolling dashboard window, counted back from "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Month,
    Year,
    All,
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown period: {} (valid: month, year, all)", s)),
        }
    }
}

/// Amount a transaction contributes to totals (zero when invalid)
fn contribution(t: &Transaction) -> f64 {
    if t.has_valid_amount() {
        t.amount
    } else {
        0.0
    }
}

fn signed_contribution(t: &Transaction) -> f64 {
    match t.kind {
        TransactionType::Income => contribution(t),
        TransactionType::Expense => -contribution(t),
    }
}

/// Σ income − Σ expenses
pub fn signed_total<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    transactions.into_iter().map(signed_contribution).sum()
}

/// Balance of one account
pub fn account_balance(transactions: &[Transaction], account_id: &str) -> f64 {
    signed_total(transactions.iter().filter(|t| t.account_id == account_id))
}

/// Balance of every account, zero for accounts without transactions
pub fn account_balances(
    accounts: &[Account],
    transactions: &[Transaction],
) -> Vec<AccountBalance> {
    let mut by_account: HashMap<&str, f64> = HashMap::new();
    for t in transactions {
        *by_account.entry(t.account_id.as_str()).or_insert(0.0) += signed_contribution(t);
    }

    accounts
        .iter()
        .map(|a| AccountBalance {
            account_id: a.id.clone(),
            name: a.name.clone(),
            balance: by_account.get(a.id.as_str()).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Balance plus income and expense totals
pub fn financial_summary<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    for t in transactions {
        match t.kind {
            TransactionType::Income => summary.total_income += contribution(t),
            TransactionType::Expense => summary.total_expenses += contribution(t),
        }
    }
    summary.total_balance = summary.total_income - summary.total_expenses;
    summary
}

/// Inclusive lower bound of a rolling period, None for `All`
///
/// Calendar subtraction: one month before Mar 31 is the last day of February.
pub fn period_start(period: Period, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months = match period {
        Period::Month => 1,
        Period::Year => 12,
        Period::All => return None,
    };
    Some(
        now.checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
    )
}

/// Transactions inside a rolling period
///
/// `All` keeps everything, including undated entries; the other periods drop
/// entries whose date cannot be parsed.
pub fn filter_by_period(
    transactions: &[Transaction],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<&Transaction> {
    match period_start(period, now) {
        None => transactions.iter().collect(),
        Some(start) => transactions
            .iter()
            .filter(|t| t.timestamp().is_some_and(|d| d >= start))
            .collect(),
    }
}

/// Midnight UTC on the first day of `now`'s month
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    month_start(now.year(), now.month()).unwrap_or(now)
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// This calendar month against the previous one
pub fn month_over_month(transactions: &[Transaction], now: DateTime<Utc>) -> MonthComparison {
    let current_start = start_of_month(now);
    let previous_start = current_start
        .checked_sub_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut current = 0.0;
    let mut previous = 0.0;
    for t in transactions {
        let Some(date) = t.timestamp() else { continue };
        if date >= current_start {
            current += signed_contribution(t);
        } else if date >= previous_start {
            previous += signed_contribution(t);
        }
    }

    MonthComparison {
        current,
        previous,
        percent_change: percent_change(current, previous),
    }
}

/// Relative change; a zero baseline reads as +100% for growth, else 0%
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous.abs() * 100.0
    }
}

fn share(part: f64, whole: f64) -> f64 {
    let denominator = if whole == 0.0 { 1.0 } else { whole };
    part / denominator * 100.0
}

fn by_total_then_name(a_total: f64, a_name: &str, b_total: f64, b_name: &str) -> Ordering {
    b_total
        .partial_cmp(&a_total)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_name.cmp(b_name))
}

#[derive(Default)]
struct CategoryAccumulator {
    total: f64,
    count: usize,
    subs: HashMap<String, f64>,
}

/// Category → subcategory hierarchy, expenses first then income
///
/// Each category's percentage is its share of all transactions of the same
/// type; each subcategory's percentage is its share of the category.
pub fn category_breakdown<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    taxonomy: &Taxonomy,
) -> Vec<CategoryTotal> {
    let mut groups: HashMap<(TransactionType, &str), CategoryAccumulator> = HashMap::new();
    let mut type_totals: HashMap<TransactionType, f64> = HashMap::new();

    for t in transactions {
        let amount = contribution(t);
        *type_totals.entry(t.kind).or_insert(0.0) += amount;

        let group = groups.entry((t.kind, t.category.as_str())).or_default();
        group.total += amount;
        group.count += 1;

        let sub = t
            .sub_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(GENERAL_SUBCATEGORY);
        *group.subs.entry(sub.to_string()).or_insert(0.0) += amount;
    }

    let mut result = Vec::with_capacity(groups.len());
    for kind in [TransactionType::Expense, TransactionType::Income] {
        let type_total = type_totals.get(&kind).copied().unwrap_or(0.0);

        let mut categories: Vec<CategoryTotal> = groups
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, name), acc)| {
                let mut sub_categories: Vec<SubCategoryTotal> = acc
                    .subs
                    .iter()
                    .map(|(sub, total)| SubCategoryTotal {
                        name: sub.clone(),
                        total: *total,
                        percentage: share(*total, acc.total),
                    })
                    .collect();
                sub_categories
                    .sort_by(|a, b| by_total_then_name(a.total, &a.name, b.total, &b.name));

                CategoryTotal {
                    category: name.to_string(),
                    kind,
                    icon: taxonomy.icon_for(name).to_string(),
                    total: acc.total,
                    percentage: share(acc.total, type_total),
                    transaction_count: acc.count,
                    sub_categories,
                }
            })
            .collect();

        categories.sort_by(|a, b| by_total_then_name(a.total, &a.category, b.total, &b.category));
        result.extend(categories);
    }

    result
}

/// Balance over time for the transactions in a period
///
/// The series starts from the balance of everything dated before the
/// period, so the first point is a true running balance and not just the
/// first transaction's amount.
pub fn running_balance(
    transactions: &[Transaction],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<BalancePoint> {
    let mut dated: Vec<(DateTime<Utc>, &Transaction)> = transactions
        .iter()
        .filter_map(|t| t.timestamp().map(|d| (d, t)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    let start = period_start(period, now);
    let in_window = |d: &DateTime<Utc>| start.map_or(true, |s| *d >= s);

    let mut balance: f64 = dated
        .iter()
        .filter(|(d, _)| !in_window(d))
        .map(|(_, t)| signed_contribution(t))
        .sum();

    dated
        .into_iter()
        .filter(|(d, _)| in_window(d))
        .map(|(date, t)| {
            balance += signed_contribution(t);
            BalancePoint {
                date,
                transaction_id: t.id.clone(),
                balance,
            }
        })
        .collect()
}

/// Half-open `[start, end)` range of a calendar window
pub fn window_bounds(window: ReportWindow) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match window {
        ReportWindow::Month { year, month } => month_start(year, month)?,
        ReportWindow::Year { year } => month_start(year, 1)?,
    };
    let months = match window {
        ReportWindow::Month { .. } => 1,
        ReportWindow::Year { .. } => 12,
    };
    Some((start, start.checked_add_months(Months::new(months))?))
}

/// Totals and category hierarchy for a calendar month or year
pub fn period_report(
    transactions: &[Transaction],
    window: ReportWindow,
    taxonomy: &Taxonomy,
) -> PeriodReport {
    let selected: Vec<&Transaction> = match window_bounds(window) {
        Some((start, end)) => transactions
            .iter()
            .filter(|t| t.timestamp().is_some_and(|d| d >= start && d < end))
            .collect(),
        None => Vec::new(),
    };

    let summary = financial_summary(selected.iter().copied());
    PeriodReport {
        window,
        total_income: summary.total_income,
        total_expenses: summary.total_expenses,
        categories: category_breakdown(selected, taxonomy),
    }
}

/// Years with dated transactions, newest first; the current year when there are none
pub fn available_years(transactions: &[Transaction], now: DateTime<Utc>) -> Vec<i32> {
    let years: BTreeSet<i32> = transactions
        .iter()
        .filter_map(|t| t.timestamp())
        .map(|d| d.year())
        .collect();

    if years.is_empty() {
        vec![now.year()]
    } else {
        years.into_iter().rev().collect()
    }
}
