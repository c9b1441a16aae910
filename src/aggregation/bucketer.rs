//! Strategies for turning raw expense records into a per-day spending
//! series.
//!
//! Day boundaries depend on whose clock you ask. The server groups by UTC
//! days, which is cheap but shifts late-evening expenses into the wrong
//! day for viewers far from UTC. When the client tells us its timezone we
//! re-bucket the raw records under the viewer's local calendar instead,
//! and that series becomes authoritative for the response.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Month, UtcOffset, macros::format_description};

use crate::expense::Expense;

/// The total spent on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// The day in `YYYY-MM-DD` form.
    pub date: String,
    /// The sum of expense amounts on that day.
    pub amount: f64,
}

/// Groups raw expense records into a sparse per-day series.
///
/// Implementations must emit one entry per day that has at least one
/// expense, sorted by date ascending, and no entries for empty days.
pub trait DailyBucketer {
    /// Bucket `expenses` into daily totals.
    fn bucket(&self, expenses: &[Expense]) -> Vec<DailyTotal>;
}

/// Buckets expenses by the UTC calendar day they were recorded on.
///
/// This is the fallback strategy used when the client does not declare a
/// timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerGroupedBucketer;

impl DailyBucketer for ServerGroupedBucketer {
    fn bucket(&self, expenses: &[Expense]) -> Vec<DailyTotal> {
        let mut totals: BTreeMap<Date, f64> = BTreeMap::new();

        for expense in expenses {
            *totals.entry(expense.date.date()).or_default() += expense.amount;
        }

        into_series(totals)
    }
}

/// Re-buckets raw expense records under the viewer's local calendar.
///
/// Each record's timestamp is shifted into the viewer's UTC offset, then
/// records outside the viewer's local target month are dropped and the
/// rest are grouped by local day. Callers fetch records over a widened
/// period so that expenses near month boundaries land in the right local
/// bucket instead of going missing.
#[derive(Debug, Clone, Copy)]
pub struct RawRecordLocalBucketer {
    /// The viewer's UTC offset.
    pub offset: UtcOffset,
    /// The year of the viewer's local target month.
    pub year: i32,
    /// The viewer's local target month.
    pub month: Month,
}

impl DailyBucketer for RawRecordLocalBucketer {
    fn bucket(&self, expenses: &[Expense]) -> Vec<DailyTotal> {
        let mut totals: BTreeMap<Date, f64> = BTreeMap::new();

        for expense in expenses {
            let local_date = expense.date.to_offset(self.offset).date();

            if local_date.year() == self.year && local_date.month() == self.month {
                *totals.entry(local_date).or_default() += expense.amount;
            }
        }

        into_series(totals)
    }
}

/// Total spent on one viewer-local calendar day.
///
/// Used for the "spent today" figure when the viewer's timezone is
/// known, so that "today" means the same calendar day as the daily
/// series.
pub fn local_day_total(expenses: &[Expense], offset: UtcOffset, day: Date) -> f64 {
    expenses
        .iter()
        .filter(|expense| expense.date.to_offset(offset).date() == day)
        .map(|expense| expense.amount)
        .sum()
}

fn into_series(totals: BTreeMap<Date, f64>) -> Vec<DailyTotal> {
    let format = format_description!("[year]-[month]-[day]");

    totals
        .into_iter()
        .map(|(date, amount)| DailyTotal {
            date: date.format(&format).expect("formatting a date cannot fail"),
            amount,
        })
        .collect()
}
