//! Sums and ratios over record collections.

use rust_decimal::Decimal;
use tracing::trace;

use crate::records::Monetary;

/// Number of months of expenses an emergency fund should cover.
pub const EMERGENCY_FUND_MONTHS: u32 = 6;

/// Sums the amounts of `records`. Missing amounts count as zero, an empty
/// slice sums to zero. Sums past the `Decimal` range saturate.
pub fn total_of<T: Monetary>(records: &[T]) -> Decimal {
    let total = records
        .iter()
        .filter_map(Monetary::amount)
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount));
    trace!(count = records.len(), %total, "Computed total");
    total
}

/// Total income minus total expenses.
pub fn balance<I: Monetary, E: Monetary>(incomes: &[I], expenses: &[E]) -> Decimal {
    total_of(incomes).saturating_sub(total_of(expenses))
}

/// Emergency fund target: total expenses times [`EMERGENCY_FUND_MONTHS`].
pub fn emergency_fund<E: Monetary>(expenses: &[E]) -> Decimal {
    total_of(expenses).saturating_mul(Decimal::from(EMERGENCY_FUND_MONTHS))
}

/// `amount` as a percentage of `total_income`, or zero when there is no
/// positive income to divide by.
pub fn percentage_of_income(amount: Decimal, total_income: Decimal) -> Decimal {
    if total_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(total_income))
        .or_else(|| {
            amount
                .checked_div(total_income)
                .map(|ratio| ratio.saturating_mul(Decimal::ONE_HUNDRED))
        })
        .unwrap_or(if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(values: &[i64]) -> Vec<Decimal> {
        values.iter().copied().map(Decimal::from).collect()
    }

    #[test]
    fn test_total_of_empty_is_zero() {
        let empty: Vec<Decimal> = Vec::new();
        assert_eq!(total_of(&empty), Decimal::ZERO);
    }

    #[test]
    fn test_total_of_sums_amounts() {
        let records = vec![Decimal::new(10050, 2), Decimal::new(4950, 2), Decimal::from(200)];
        assert_eq!(total_of(&records), Decimal::from(350));
    }

    #[test]
    fn test_total_of_treats_missing_and_non_finite_as_zero() {
        let optional = vec![Some(Decimal::from(10)), None, Some(Decimal::from(5))];
        assert_eq!(total_of(&optional), Decimal::from(15));

        let floats = vec![100.0_f64, f64::NAN, 50.5, f64::INFINITY];
        assert_eq!(total_of(&floats), Decimal::new(1505, 1));
    }

    #[test]
    fn test_total_of_does_not_mutate_input() {
        let records = amounts(&[3, 1, 2]);
        let before = records.clone();
        let _ = total_of(&records);
        assert_eq!(records, before);
    }

    #[test]
    fn test_balance_matches_difference_of_totals() {
        let incomes = amounts(&[1000, 250]);
        let expenses = amounts(&[400, 100, 50]);
        assert_eq!(balance(&incomes, &expenses), total_of(&incomes) - total_of(&expenses));
        assert_eq!(balance(&incomes, &expenses), Decimal::from(700));
    }

    #[test]
    fn test_balance_with_empty_sides() {
        let none: Vec<Decimal> = Vec::new();
        let expenses = amounts(&[40]);
        assert_eq!(balance(&none, &expenses), Decimal::from(-40));
        assert_eq!(balance(&expenses, &none), Decimal::from(40));
        assert_eq!(balance(&none, &none), Decimal::ZERO);
    }

    #[test]
    fn test_emergency_fund_is_six_times_expenses() {
        let expenses = amounts(&[400]);
        assert_eq!(emergency_fund(&expenses), Decimal::from(2400));
        assert_eq!(emergency_fund(&expenses), total_of(&expenses) * Decimal::from(6));
    }

    #[test]
    fn test_single_income_single_essential_expense_scenario() {
        let incomes = amounts(&[1000]);
        let expenses = amounts(&[400]);
        assert_eq!(balance(&incomes, &expenses), Decimal::from(600));
        assert_eq!(emergency_fund(&expenses), Decimal::from(2400));
    }

    #[test]
    fn test_percentage_of_income() {
        assert_eq!(
            percentage_of_income(Decimal::from(400), Decimal::from(1000)),
            Decimal::from(40)
        );
        assert_eq!(
            percentage_of_income(Decimal::from(1), Decimal::from(4)),
            Decimal::from(25)
        );
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let huge = vec![Decimal::MAX, Decimal::from(1)];
        assert_eq!(total_of(&huge), Decimal::MAX);
        assert_eq!(emergency_fund(&huge), Decimal::MAX);
        assert_eq!(balance(&Vec::<Decimal>::new(), &huge), Decimal::MIN);

        let large = vec![Decimal::from_i128_with_scale(20_000_000_000_000_000_000_000_000_000, 0)];
        assert_eq!(emergency_fund(&large), Decimal::MAX);
    }

    #[test]
    fn test_percentage_of_income_with_extreme_amounts() {
        assert_eq!(
            percentage_of_income(Decimal::MAX, Decimal::MAX),
            Decimal::ONE_HUNDRED
        );
        assert_eq!(percentage_of_income(Decimal::MAX, Decimal::new(1, 2)), Decimal::MAX);
    }

    #[test]
    fn test_percentage_of_income_guards_zero_and_negative_income() {
        assert_eq!(percentage_of_income(Decimal::from(123), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage_of_income(Decimal::from(123), Decimal::from(-5)), Decimal::ZERO);
    }
}
