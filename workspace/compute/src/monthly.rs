//! Monthly bucketing of incomes and expenses.
//!
//! A bucket key is the first calendar day of a month. Which month a timestamp
//! falls into depends on the time zone the caller evaluates it in, so every
//! function here takes the zone explicitly instead of assuming UTC.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::records::{Dated, Monetary};

/// Income, expenses and balance of one calendar month.
///
/// Never stored: `balance` is always derived from the two totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotal {
    /// First day of the month
    pub month: NaiveDate,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

impl MonthlyTotal {
    pub fn new(month: NaiveDate, total_income: Decimal, total_expenses: Decimal) -> Self {
        Self {
            month,
            total_income,
            total_expenses,
            balance: total_income.saturating_sub(total_expenses),
        }
    }
}

/// First day of the month `at` falls into, seen from `tz`.
pub fn month_start<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    let local = at.with_timezone(tz).date_naive();
    local.with_day(1).unwrap_or(local)
}

/// Sums amounts per month, keyed by the first day of the month of the
/// timestamp `date_of` selects.
pub fn group_by_month<T, F, Tz>(records: &[T], date_of: F, tz: &Tz) -> BTreeMap<NaiveDate, Decimal>
where
    T: Monetary,
    F: Fn(&T) -> DateTime<Utc>,
    Tz: TimeZone,
{
    let mut buckets: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for record in records {
        let month = month_start(&date_of(record), tz);
        let amount = record.amount().unwrap_or(Decimal::ZERO);
        let bucket = buckets.entry(month).or_insert(Decimal::ZERO);
        *bucket = bucket.saturating_add(amount);
    }
    buckets
}

/// Merges income and expense buckets into monthly totals, newest month
/// first. A month present on only one side gets zero on the other.
pub fn merge_monthly(
    incomes: &BTreeMap<NaiveDate, Decimal>,
    expenses: &BTreeMap<NaiveDate, Decimal>,
) -> Vec<MonthlyTotal> {
    let months: BTreeSet<NaiveDate> = incomes.keys().chain(expenses.keys()).copied().collect();

    months
        .into_iter()
        .rev()
        .map(|month| {
            MonthlyTotal::new(
                month,
                incomes.get(&month).copied().unwrap_or(Decimal::ZERO),
                expenses.get(&month).copied().unwrap_or(Decimal::ZERO),
            )
        })
        .collect()
}

/// Monthly totals of incomes and expenses bucketed by their creation
/// timestamp in `tz`, newest month first.
#[instrument(skip(incomes, expenses, tz), fields(incomes = incomes.len(), expenses = expenses.len()))]
pub fn monthly_totals<I, E, Tz>(incomes: &[I], expenses: &[E], tz: &Tz) -> Vec<MonthlyTotal>
where
    I: Monetary + Dated,
    E: Monetary + Dated,
    Tz: TimeZone,
{
    let income_buckets = group_by_month(incomes, |record| record.created_at(), tz);
    let expense_buckets = group_by_month(expenses, |record| record.created_at(), tz);
    let totals = merge_monthly(&income_buckets, &expense_buckets);
    debug!("Computed {} monthly totals", totals.len());
    totals
}
