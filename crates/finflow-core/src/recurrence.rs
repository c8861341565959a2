//! Recurring entries and templates

use chrono::{DateTime, Days, Months, Utc};

use crate::models::{
    new_id, parse_date, RecurrenceFrequency, Transaction, TransactionDraft, TransactionTemplate,
};

/// Expand one draft into `count` transactions
///
/// Instance `i` is dated `i` days, weeks or months after the draft's date
/// (months clamp to the end of the month). With more than one instance they
/// all share a fresh `recurrence_id`. A count of zero is treated as one. If
/// the draft's date cannot be parsed every instance keeps it verbatim.
pub fn expand_recurrence(
    draft: &TransactionDraft,
    count: u32,
    frequency: RecurrenceFrequency,
) -> Vec<Transaction> {
    let count = count.max(1);
    let recurrence_id = (count > 1).then(new_id);
    let start = parse_date(&draft.date);

    (0..count)
        .map(|i| {
            let date = match start {
                Some(start) => format_like(&draft.date, shift(start, i, frequency)),
                None => draft.date.clone(),
            };

            let mut t = draft.clone().into_transaction();
            t.date = date;
            t.is_recurring = recurrence_id.is_some();
            t.recurrence_id = recurrence_id.clone();
            t
        })
        .collect()
}

fn shift(start: DateTime<Utc>, i: u32, frequency: RecurrenceFrequency) -> DateTime<Utc> {
    let shifted = match frequency {
        RecurrenceFrequency::None => Some(start),
        RecurrenceFrequency::Daily => start.checked_add_days(Days::new(u64::from(i))),
        RecurrenceFrequency::Weekly => start.checked_add_days(Days::new(u64::from(i) * 7)),
        RecurrenceFrequency::Monthly => start.checked_add_months(Months::new(i)),
    };
    shifted.unwrap_or(start)
}

/// Keep bare dates bare and timestamps as RFC 3339
fn format_like(original: &str, date: DateTime<Utc>) -> String {
    if original.trim().len() == 10 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

impl TransactionTemplate {
    /// Save a draft as a reusable template
    pub fn from_draft(name: &str, draft: &TransactionDraft) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            account_id: draft.account_id.clone(),
            amount: draft.amount,
            description: draft.description.clone(),
            category: draft.category.clone(),
            kind: draft.kind,
            icon: draft.icon.clone(),
        }
    }

    /// Prefill a draft for `date`; the draft does not remember the template
    pub fn to_draft(&self, date: &str) -> TransactionDraft {
        TransactionDraft {
            account_id: self.account_id.clone(),
            amount: self.amount,
            description: self.description.clone(),
            category: self.category.clone(),
            sub_category: None,
            kind: self.kind,
            date: date.to_string(),
            icon: self.icon.clone(),
        }
    }
}
