//! Dashboard and report payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ExpenseDto, IncomeDto, TransactionDto};

/// An amount together with its `R$` rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MoneyDto {
    #[schema(value_type = String, example = "1234.56")]
    pub amount: Decimal,
    /// e.g. `R$ 1.234,56`
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlyTotalDto {
    /// First day of the month
    pub month: NaiveDate,
    pub total_income: MoneyDto,
    pub total_expenses: MoneyDto,
    pub balance: MoneyDto,
}

/// One slice of the spending distribution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ShareDto {
    pub amount: MoneyDto,
    /// Percentage of total income, two decimals
    #[schema(value_type = String, example = "40.00")]
    pub percentage_of_income: Decimal,
    /// Configured target, absent when no spending policy is set
    #[schema(value_type = Option<String>)]
    pub target_percentage: Option<Decimal>,
    /// For spending: at or below target. For savings: at or above target.
    pub within_target: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DistributionDto {
    pub essential: ShareDto,
    pub non_essential: ShareDto,
    pub savings: ShareDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryTotalDto {
    pub category: String,
    pub total: MoneyDto,
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardSummary {
    pub total_income: MoneyDto,
    pub total_expenses: MoneyDto,
    pub balance: MoneyDto,
    pub emergency_fund: MoneyDto,
    pub recent_incomes: Vec<IncomeDto>,
    pub recent_expenses: Vec<ExpenseDto>,
    pub recent_transactions: Vec<TransactionDto>,
    /// Newest month first
    pub monthly_totals: Vec<MonthlyTotalDto>,
}

/// Everything the reports page shows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReportSummary {
    pub total_income: MoneyDto,
    pub total_expenses: MoneyDto,
    pub balance: MoneyDto,
    pub emergency_fund: MoneyDto,
    /// How many months of expenses the emergency fund covers
    pub emergency_fund_months: u32,
    pub distribution: DistributionDto,
    pub monthly_totals: Vec<MonthlyTotalDto>,
    /// Largest category first
    pub by_category: Vec<CategoryTotalDto>,
    pub top_expenses: Vec<ExpenseDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monthly_total_shape() {
        let money = |amount: i64, formatted: &str| MoneyDto {
            amount: Decimal::from(amount),
            formatted: formatted.to_string(),
        };
        let total = MonthlyTotalDto {
            month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_income: money(150, "R$\u{a0}150,00"),
            total_expenses: money(0, "R$\u{a0}0,00"),
            balance: money(150, "R$\u{a0}150,00"),
        };

        let value = serde_json::to_value(&total).unwrap();
        assert_eq!(value["month"], json!("2024-01-01"));
        assert_eq!(value["total_income"]["amount"], json!("150"));
        assert_eq!(value["balance"]["formatted"], json!("R$\u{a0}150,00"));
    }

    #[test]
    fn test_share_without_policy_serializes_nulls() {
        let share = ShareDto {
            amount: MoneyDto {
                amount: Decimal::ZERO,
                formatted: "R$\u{a0}0,00".to_string(),
            },
            percentage_of_income: Decimal::ZERO,
            target_percentage: None,
            within_target: None,
        };
        let value = serde_json::to_value(&share).unwrap();
        assert_eq!(value["target_percentage"], json!(null));
        assert_eq!(value["within_target"], json!(null));
    }
}
