//! Pure aggregation over incomes, expenses and transactions.
//!
//! Nothing in this crate touches the database or the network: callers fetch
//! rows and hand slices in, and every function returns fresh values.

pub mod distribution;
pub mod error;
pub mod format;
pub mod monthly;
pub mod records;
pub mod totals;

pub use distribution::{
    most_recent, spending_distribution, top_by_amount, totals_by_category, CategoryTotal, Share,
    SpendingDistribution, SpendingPolicy,
};
pub use error::{ComputeError, Result};
pub use format::format_currency;
pub use monthly::{group_by_month, merge_monthly, month_start, monthly_totals, MonthlyTotal};
pub use records::{Classified, Dated, Monetary};
pub use totals::{balance, emergency_fund, percentage_of_income, total_of, EMERGENCY_FUND_MONTHS};
