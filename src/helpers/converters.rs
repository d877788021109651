//! Entity models and aggregation results to transport DTOs.

use common::{
    CategoryDto, CategoryKind as CategoryKindDto, CategoryRefDto, CategoryTotalDto, DistributionDto,
    ExpenseDto, IncomeDto, MoneyDto, MonthlyTotalDto, SessionDto, ShareDto,
    TransactionDto, TransactionKind as TransactionKindDto, UserDto,
};
use compute::{CategoryTotal, MonthlyTotal, Share, SpendingDistribution, format_currency};
use model::entities::{
    category::{self, CategoryKind},
    expense, income,
    transaction::TransactionKind,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::auth::{Account, AuthSession};
use crate::backend::TransactionWithCategory;

pub fn money(amount: Decimal) -> MoneyDto {
    MoneyDto {
        amount,
        formatted: format_currency(amount),
    }
}

fn percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn category_kind_to_dto(kind: CategoryKind) -> CategoryKindDto {
    match kind {
        CategoryKind::Income => CategoryKindDto::Income,
        CategoryKind::Expense => CategoryKindDto::Expense,
        CategoryKind::Both => CategoryKindDto::Both,
    }
}

pub fn category_kind_from_dto(kind: CategoryKindDto) -> CategoryKind {
    match kind {
        CategoryKindDto::Income => CategoryKind::Income,
        CategoryKindDto::Expense => CategoryKind::Expense,
        CategoryKindDto::Both => CategoryKind::Both,
    }
}

pub fn transaction_kind_to_dto(kind: TransactionKind) -> TransactionKindDto {
    match kind {
        TransactionKind::Income => TransactionKindDto::Income,
        TransactionKind::Expense => TransactionKindDto::Expense,
    }
}

pub fn transaction_kind_from_dto(kind: TransactionKindDto) -> TransactionKind {
    match kind {
        TransactionKindDto::Income => TransactionKind::Income,
        TransactionKindDto::Expense => TransactionKind::Expense,
    }
}

pub fn income_dto(model: income::Model) -> IncomeDto {
    IncomeDto {
        id: model.id,
        description: model.description,
        amount: model.amount,
        category: model.category,
        is_recurrent: model.is_recurrent,
        created_at: model.created_at,
        user_id: model.user_id,
    }
}

pub fn expense_dto(model: expense::Model) -> ExpenseDto {
    ExpenseDto {
        id: model.id,
        description: model.description,
        amount: model.amount,
        category: model.category,
        category_id: model.category_id,
        is_essential: model.is_essential,
        created_at: model.created_at,
        user_id: model.user_id,
    }
}

pub fn category_dto(model: category::Model) -> CategoryDto {
    CategoryDto {
        id: model.id,
        name: model.name,
        kind: category_kind_to_dto(model.kind),
        created_at: model.created_at,
        user_id: model.user_id,
    }
}

pub fn transaction_dto(row: TransactionWithCategory) -> TransactionDto {
    let TransactionWithCategory {
        transaction,
        category,
    } = row;
    TransactionDto {
        id: transaction.id,
        description: transaction.description,
        amount: transaction.amount,
        kind: transaction_kind_to_dto(transaction.kind),
        category_id: transaction.category_id,
        category: category.map(|category| CategoryRefDto {
            id: category.id,
            name: category.name,
            kind: category_kind_to_dto(category.kind),
        }),
        date: transaction.date,
        created_at: transaction.created_at,
        user_id: transaction.user_id,
    }
}

pub fn monthly_total_dto(total: &MonthlyTotal) -> MonthlyTotalDto {
    MonthlyTotalDto {
        month: total.month,
        total_income: money(total.total_income),
        total_expenses: money(total.total_expenses),
        balance: money(total.balance),
    }
}

fn share_dto(share: &Share, within_target: Option<bool>) -> ShareDto {
    ShareDto {
        amount: money(share.amount),
        percentage_of_income: percentage(share.percentage_of_income),
        target_percentage: share.target_percentage.map(percentage),
        within_target,
    }
}

pub fn distribution_dto(distribution: &SpendingDistribution) -> DistributionDto {
    DistributionDto {
        essential: share_dto(
            &distribution.essential,
            distribution.essential.within_spending_target(),
        ),
        non_essential: share_dto(
            &distribution.non_essential,
            distribution.non_essential.within_spending_target(),
        ),
        savings: share_dto(
            &distribution.savings,
            distribution.savings.meets_savings_target(),
        ),
    }
}

pub fn category_total_dto(total: CategoryTotal) -> CategoryTotalDto {
    CategoryTotalDto {
        category: total.category,
        total: money(total.amount),
    }
}

pub fn user_dto(account: Account) -> UserDto {
    UserDto {
        id: account.id,
        email: account.email,
        email_confirmed_at: account.email_confirmed_at,
        created_at: account.created_at,
    }
}

pub fn session_dto(session: AuthSession) -> SessionDto {
    SessionDto {
        access_token: session.token,
        token_type: "bearer".to_string(),
        expires_at: session.expires_at,
        user: user_dto(session.user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use compute::SpendingPolicy;
    use uuid::Uuid;

    #[test]
    fn test_money_carries_formatted_value() {
        let dto = money(Decimal::new(123456, 2));
        assert_eq!(dto.amount, Decimal::new(123456, 2));
        assert_eq!(dto.formatted, "R$\u{a0}1.234,56");
    }

    #[test]
    fn test_monthly_total_dto() {
        let total = MonthlyTotal::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Decimal::from(150),
            Decimal::from(200),
        );
        let dto = monthly_total_dto(&total);
        assert_eq!(dto.balance.amount, Decimal::from(-50));
        assert_eq!(dto.balance.formatted, "-R$\u{a0}50,00");
    }

    #[test]
    fn test_distribution_rounds_percentages_and_checks_targets() {
        let incomes = vec![Decimal::from(3)];
        let expenses = vec![(Decimal::from(1), true), (Decimal::from(1), false)];
        let expenses: Vec<expense::Model> = expenses
            .into_iter()
            .map(|(amount, is_essential)| expense::Model {
                id: Uuid::new_v4(),
                description: "x".to_string(),
                amount,
                category: "Geral".to_string(),
                category_id: None,
                is_essential,
                created_at: Utc::now(),
                user_id: Uuid::new_v4(),
            })
            .collect();
        let policy = SpendingPolicy::new(Decimal::from(50), Decimal::from(30)).unwrap();

        let distribution = compute::spending_distribution(&incomes, &expenses, Some(&policy));
        let dto = distribution_dto(&distribution);

        assert_eq!(dto.essential.percentage_of_income, Decimal::new(3333, 2));
        assert_eq!(dto.essential.within_target, Some(true));
        assert_eq!(dto.non_essential.within_target, Some(false));
        assert_eq!(dto.savings.target_percentage, Some(Decimal::from(20)));
        assert_eq!(dto.savings.within_target, Some(true));
    }

    #[test]
    fn test_transaction_dto_joins_category() {
        let user_id = Uuid::new_v4();
        let category = category::Model {
            id: Uuid::new_v4(),
            name: "Mercado".to_string(),
            kind: CategoryKind::Expense,
            created_at: Utc::now(),
            user_id,
        };
        let transaction = model::entities::transaction::Model {
            id: Uuid::new_v4(),
            description: "Feira".to_string(),
            amount: Decimal::new(8990, 2),
            kind: TransactionKind::Expense,
            category_id: Some(category.id),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            created_at: Utc::now(),
            user_id,
        };

        let dto = transaction_dto(TransactionWithCategory {
            transaction,
            category: Some(category.clone()),
        });

        assert_eq!(dto.kind, TransactionKindDto::Expense);
        let joined = dto.category.unwrap();
        assert_eq!(joined.name, "Mercado");
        assert_eq!(joined.kind, CategoryKindDto::Expense);
    }
}
