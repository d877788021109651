//! Report-level breakdowns: essential vs non-essential spending, totals by
//! category and ranking helpers.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};
use crate::records::{Classified, Monetary};
use crate::totals::{percentage_of_income, total_of};

/// Target shares of income for essential and non-essential spending.
///
/// Whatever is left of 100% is the savings target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingPolicy {
    essential_pct: Decimal,
    non_essential_pct: Decimal,
}

impl SpendingPolicy {
    pub fn new(essential_pct: Decimal, non_essential_pct: Decimal) -> Result<Self> {
        let valid_range = Decimal::ZERO..=Decimal::ONE_HUNDRED;
        if !valid_range.contains(&essential_pct) || !valid_range.contains(&non_essential_pct) {
            return Err(ComputeError::InvalidPolicy(format!(
                "percentages must be between 0 and 100, got {} and {}",
                essential_pct, non_essential_pct
            )));
        }
        if essential_pct + non_essential_pct > Decimal::ONE_HUNDRED {
            return Err(ComputeError::InvalidPolicy(format!(
                "essential ({}) and non-essential ({}) targets exceed 100%",
                essential_pct, non_essential_pct
            )));
        }
        Ok(Self {
            essential_pct,
            non_essential_pct,
        })
    }

    pub fn essential_pct(&self) -> Decimal {
        self.essential_pct
    }

    pub fn non_essential_pct(&self) -> Decimal {
        self.non_essential_pct
    }

    pub fn savings_pct(&self) -> Decimal {
        Decimal::ONE_HUNDRED - self.essential_pct - self.non_essential_pct
    }
}

/// One slice of the spending distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub amount: Decimal,
    pub percentage_of_income: Decimal,
    /// Target percentage from the policy, if one was supplied
    pub target_percentage: Option<Decimal>,
}

impl Share {
    fn new(amount: Decimal, total_income: Decimal, target_percentage: Option<Decimal>) -> Self {
        Self {
            amount,
            percentage_of_income: percentage_of_income(amount, total_income),
            target_percentage,
        }
    }

    /// Whether a spending share stays at or below its target.
    pub fn within_spending_target(&self) -> Option<bool> {
        self.target_percentage
            .map(|target| self.percentage_of_income <= target)
    }

    /// Whether a savings share reaches at least its target.
    pub fn meets_savings_target(&self) -> Option<bool> {
        self.target_percentage
            .map(|target| self.percentage_of_income >= target)
    }
}

/// How income splits into essential spending, non-essential spending and
/// what is left over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingDistribution {
    pub total_income: Decimal,
    pub essential: Share,
    pub non_essential: Share,
    /// Income minus all expenses
    pub savings: Share,
}

/// Splits `expenses` by their essential flag and expresses each part, plus
/// the remaining balance, as a percentage of total income.
#[instrument(skip(incomes, expenses), fields(incomes = incomes.len(), expenses = expenses.len()))]
pub fn spending_distribution<I, E>(
    incomes: &[I],
    expenses: &[E],
    policy: Option<&SpendingPolicy>,
) -> SpendingDistribution
where
    I: Monetary,
    E: Classified,
{
    let total_income = total_of(incomes);
    let (essential, non_essential): (Vec<&E>, Vec<&E>) =
        expenses.iter().partition(|expense| expense.is_essential());

    let essential_total = total_of(&essential);
    let non_essential_total = total_of(&non_essential);
    let savings_total = total_income
        .saturating_sub(essential_total)
        .saturating_sub(non_essential_total);

    debug!(
        %total_income, %essential_total, %non_essential_total, %savings_total,
        "Computed spending distribution"
    );

    SpendingDistribution {
        total_income,
        essential: Share::new(
            essential_total,
            total_income,
            policy.map(SpendingPolicy::essential_pct),
        ),
        non_essential: Share::new(
            non_essential_total,
            total_income,
            policy.map(SpendingPolicy::non_essential_pct),
        ),
        savings: Share::new(
            savings_total,
            total_income,
            policy.map(SpendingPolicy::savings_pct),
        ),
    }
}

/// Sum of expenses for one category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// Expense totals per category, largest first; ties are ordered by name.
pub fn totals_by_category<E: Classified>(expenses: &[E]) -> Vec<CategoryTotal> {
    let mut sums: HashMap<&str, Decimal> = HashMap::new();
    for expense in expenses {
        let sum = sums.entry(expense.category()).or_insert(Decimal::ZERO);
        *sum = sum.saturating_add(expense.amount().unwrap_or(Decimal::ZERO));
    }

    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

/// The `n` records with the largest amounts, largest first.
pub fn top_by_amount<T: Monetary + Clone>(records: &[T], n: usize) -> Vec<T> {
    let mut ranked: Vec<&T> = records.iter().collect();
    ranked.sort_by(|a, b| compare_amounts(b, a));
    ranked.into_iter().take(n).cloned().collect()
}

/// The `n` most recent records by the timestamp `date_of` selects, newest
/// first.
pub fn most_recent<T, F>(records: &[T], n: usize, date_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut ranked: Vec<&T> = records.iter().collect();
    ranked.sort_by_key(|record| std::cmp::Reverse(date_of(record)));
    ranked.into_iter().take(n).cloned().collect()
}

fn compare_amounts<T: Monetary>(a: &T, b: &T) -> Ordering {
    a.amount()
        .unwrap_or(Decimal::ZERO)
        .cmp(&b.amount().unwrap_or(Decimal::ZERO))
}
