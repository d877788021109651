use async_trait::async_trait;
use chrono::Utc;
use model::entities::{
    category::{self, CategoryKind},
    expense, income,
    transaction::{self, TransactionKind},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use super::{
    CategoryPatch, DEFAULT_CATEGORY, ExpensePatch, FinanceStore, IncomePatch, NewCategory,
    NewExpense, NewIncome, NewTransaction, StoreError, StoreResult, TransactionPatch,
    TransactionWithCategory,
};

/// [`FinanceStore`] backed by a SeaORM connection.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_income(&self, user_id: Uuid, id: Uuid) -> StoreResult<income::Model> {
        income::Entity::find_by_id(id)
            .filter(income::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Income"))
    }

    async fn find_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<expense::Model> {
        expense::Entity::find_by_id(id)
            .filter(expense::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Expense"))
    }

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<transaction::Model> {
        transaction::Entity::find_by_id(id)
            .filter(transaction::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Transaction"))
    }

    async fn with_category(
        &self,
        transaction: transaction::Model,
    ) -> StoreResult<TransactionWithCategory> {
        let category = match transaction.category_id {
            Some(category_id) => category::Entity::find_by_id(category_id)
                .one(&self.db)
                .await?,
            None => None,
        };
        Ok(TransactionWithCategory {
            transaction,
            category,
        })
    }
}

async fn find_category<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    id: Uuid,
) -> StoreResult<Option<category::Model>> {
    Ok(category::Entity::find_by_id(id)
        .filter(category::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Loads a category the user wants to attach to an entry of `kind`.
async fn category_for<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    id: Uuid,
    kind: CategoryKind,
) -> StoreResult<category::Model> {
    let category = find_category(db, user_id, id)
        .await?
        .ok_or_else(|| StoreError::InvalidReference(format!("Category {} does not exist", id)))?;
    if !category.accepts(kind) {
        warn!("Category {} cannot label {:?} entries", id, kind);
        return Err(StoreError::InvalidReference(format!(
            "Category '{}' cannot be used for this entry",
            category.name
        )));
    }
    Ok(category)
}

async fn ensure_unique_name<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> StoreResult<()> {
    let mut query = category::Entity::find()
        .filter(category::Column::UserId.eq(user_id))
        .filter(category::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(StoreError::Conflict(format!(
            "Category '{}' already exists",
            name
        )));
    }
    Ok(())
}

fn entry_kind(kind: TransactionKind) -> CategoryKind {
    match kind {
        TransactionKind::Income => CategoryKind::Income,
        TransactionKind::Expense => CategoryKind::Expense,
    }
}

#[async_trait]
impl FinanceStore for SeaOrmStore {
    #[instrument(skip(self))]
    async fn list_incomes(&self, user_id: Uuid) -> StoreResult<Vec<income::Model>> {
        trace!("Listing incomes");
        let incomes = income::Entity::find()
            .filter(income::Column::UserId.eq(user_id))
            .order_by_desc(income::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Found {} incomes", incomes.len());
        Ok(incomes)
    }

    #[instrument(skip(self))]
    async fn get_income(&self, user_id: Uuid, id: Uuid) -> StoreResult<income::Model> {
        self.find_income(user_id, id).await
    }

    #[instrument(skip(self, new))]
    async fn create_income(&self, user_id: Uuid, new: NewIncome) -> StoreResult<income::Model> {
        let model = income::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(new.description),
            amount: Set(new.amount),
            category: Set(new.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string())),
            is_recurrent: Set(new.is_recurrent),
            created_at: Set(Utc::now()),
            user_id: Set(user_id),
        }
        .insert(&self.db)
        .await?;
        info!("Created income {}", model.id);
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    async fn update_income(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: IncomePatch,
    ) -> StoreResult<income::Model> {
        let mut active = self.find_income(user_id, id).await?.into_active_model();
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(is_recurrent) = patch.is_recurrent {
            active.is_recurrent = Set(is_recurrent);
        }
        let model = active.update(&self.db).await?;
        info!("Updated income {}", id);
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_income(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        let result = income::Entity::delete_many()
            .filter(income::Column::Id.eq(id))
            .filter(income::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            warn!("Income {} not found for deletion", id);
            return Err(StoreError::NotFound("Income"));
        }
        info!("Deleted income {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_expenses(
        &self,
        user_id: Uuid,
        essential: Option<bool>,
    ) -> StoreResult<Vec<expense::Model>> {
        trace!("Listing expenses");
        let mut query = expense::Entity::find().filter(expense::Column::UserId.eq(user_id));
        if let Some(essential) = essential {
            query = query.filter(expense::Column::IsEssential.eq(essential));
        }
        let expenses = query
            .order_by_desc(expense::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Found {} expenses", expenses.len());
        Ok(expenses)
    }

    #[instrument(skip(self))]
    async fn get_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<expense::Model> {
        self.find_expense(user_id, id).await
    }

    #[instrument(skip(self, new))]
    async fn create_expense(
        &self,
        user_id: Uuid,
        new: NewExpense,
    ) -> StoreResult<expense::Model> {
        let linked = match new.category_id {
            Some(category_id) => {
                Some(category_for(&self.db, user_id, category_id, CategoryKind::Expense).await?)
            }
            None => None,
        };
        let category = new
            .category
            .or_else(|| linked.as_ref().map(|category| category.name.clone()))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let model = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(new.description),
            amount: Set(new.amount),
            category: Set(category),
            category_id: Set(new.category_id),
            is_essential: Set(new.is_essential),
            created_at: Set(Utc::now()),
            user_id: Set(user_id),
        }
        .insert(&self.db)
        .await?;
        info!("Created expense {}", model.id);
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    async fn update_expense(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: ExpensePatch,
    ) -> StoreResult<expense::Model> {
        let mut active = self.find_expense(user_id, id).await?.into_active_model();
        if let Some(category_id) = patch.category_id {
            if let Some(category_id) = category_id {
                let linked =
                    category_for(&self.db, user_id, category_id, CategoryKind::Expense).await?;
                if patch.category.is_none() {
                    active.category = Set(linked.name);
                }
            }
            active.category_id = Set(category_id);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(is_essential) = patch.is_essential {
            active.is_essential = Set(is_essential);
        }
        let model = active.update(&self.db).await?;
        info!("Updated expense {}", id);
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        let result = expense::Entity::delete_many()
            .filter(expense::Column::Id.eq(id))
            .filter(expense::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            warn!("Expense {} not found for deletion", id);
            return Err(StoreError::NotFound("Expense"));
        }
        info!("Deleted expense {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_categories(
        &self,
        user_id: Uuid,
        kind: Option<CategoryKind>,
    ) -> StoreResult<Vec<category::Model>> {
        let mut query = category::Entity::find().filter(category::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            query = query.filter(
                Condition::any()
                    .add(category::Column::Kind.eq(kind))
                    .add(category::Column::Kind.eq(CategoryKind::Both)),
            );
        }
        let categories = query
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        debug!("Found {} categories", categories.len());
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn get_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<category::Model> {
        find_category(&self.db, user_id, id)
            .await?
            .ok_or(StoreError::NotFound("Category"))
    }

    #[instrument(skip(self, new))]
    async fn create_category(
        &self,
        user_id: Uuid,
        new: NewCategory,
    ) -> StoreResult<category::Model> {
        ensure_unique_name(&self.db, user_id, &new.name, None).await?;
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            kind: Set(new.kind),
            created_at: Set(Utc::now()),
            user_id: Set(user_id),
        }
        .insert(&self.db)
        .await?;
        info!("Created category {}", model.id);
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    async fn update_category(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: CategoryPatch,
    ) -> StoreResult<category::Model> {
        let txn = self.db.begin().await?;
        let current = find_category(&txn, user_id, id)
            .await?
            .ok_or(StoreError::NotFound("Category"))?;

        let mut active = current.clone().into_active_model();
        let renamed = match patch.name {
            Some(name) if name != current.name => {
                ensure_unique_name(&txn, user_id, &name, Some(id)).await?;
                active.name = Set(name.clone());
                Some(name)
            }
            _ => None,
        };
        if let Some(kind) = patch.kind {
            active.kind = Set(kind);
        }
        let model = active.update(&txn).await?;

        if let Some(name) = renamed {
            // Expenses keep a copy of the category name.
            expense::Entity::update_many()
                .col_expr(expense::Column::Category, Expr::value(name))
                .filter(expense::Column::UserId.eq(user_id))
                .filter(expense::Column::CategoryId.eq(id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        info!("Updated category {}", id);
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        if find_category(&txn, user_id, id).await?.is_none() {
            warn!("Category {} not found for deletion", id);
            return Err(StoreError::NotFound("Category"));
        }

        let unlinked_expenses = expense::Entity::update_many()
            .col_expr(expense::Column::CategoryId, Expr::value(Option::<Uuid>::None))
            .filter(expense::Column::UserId.eq(user_id))
            .filter(expense::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        let unlinked_transactions = transaction::Entity::update_many()
            .col_expr(
                transaction::Column::CategoryId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted category {}, unlinked {} expenses and {} transactions",
            id, unlinked_expenses.rows_affected, unlinked_transactions.rows_affected
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: Option<u64>,
    ) -> StoreResult<Vec<TransactionWithCategory>> {
        let mut query = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::Date)
            .order_by_desc(transaction::Column::CreatedAt);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query
            .find_also_related(category::Entity)
            .all(&self.db)
            .await?;
        debug!("Found {} transactions", rows.len());
        Ok(rows
            .into_iter()
            .map(|(transaction, category)| TransactionWithCategory {
                transaction,
                category,
            })
            .collect())
    }

    #[instrument(skip(self, new))]
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> StoreResult<TransactionWithCategory> {
        let category = match new.category_id {
            Some(category_id) => {
                Some(category_for(&self.db, user_id, category_id, entry_kind(new.kind)).await?)
            }
            None => None,
        };
        let transaction = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(new.description),
            amount: Set(new.amount),
            kind: Set(new.kind),
            category_id: Set(new.category_id),
            date: Set(new.date),
            created_at: Set(Utc::now()),
            user_id: Set(user_id),
        }
        .insert(&self.db)
        .await?;
        info!("Created transaction {}", transaction.id);
        Ok(TransactionWithCategory {
            transaction,
            category,
        })
    }

    #[instrument(skip(self, patch))]
    async fn update_transaction(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<TransactionWithCategory> {
        let current = self.find_transaction(user_id, id).await?;
        let kind = patch.kind.unwrap_or(current.kind);
        let category_id = patch.category_id.unwrap_or(current.category_id);
        if let Some(category_id) = category_id {
            category_for(&self.db, user_id, category_id, entry_kind(kind)).await?;
        }

        let mut active = current.into_active_model();
        active.kind = Set(kind);
        active.category_id = Set(category_id);
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = patch.date {
            active.date = Set(date);
        }
        let transaction = active.update(&self.db).await?;
        info!("Updated transaction {}", id);
        self.with_category(transaction).await
    }

    #[instrument(skip(self))]
    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<()> {
        let result = transaction::Entity::delete_many()
            .filter(transaction::Column::Id.eq(id))
            .filter(transaction::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            warn!("Transaction {} not found for deletion", id);
            return Err(StoreError::NotFound("Transaction"));
        }
        info!("Deleted transaction {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user_data(&self, user_id: Uuid) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        let transactions = transaction::Entity::delete_many()
            .filter(transaction::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let expenses = expense::Entity::delete_many()
            .filter(expense::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let incomes = income::Entity::delete_many()
            .filter(income::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let categories = category::Entity::delete_many()
            .filter(category::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        info!(
            "Deleted user data: {} transactions, {} expenses, {} incomes, {} categories",
            transactions.rows_affected,
            expenses.rows_affected,
            incomes.rows_affected,
            categories.rows_affected
        );
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_db;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    async fn store() -> SeaOrmStore {
        SeaOrmStore::new(setup_test_db().await)
    }

    fn new_income(description: &str, amount: i64) -> NewIncome {
        NewIncome {
            description: description.to_string(),
            amount: Decimal::from(amount),
            category: None,
            is_recurrent: false,
        }
    }

    fn new_expense(description: &str, amount: i64, is_essential: bool) -> NewExpense {
        NewExpense {
            description: description.to_string(),
            amount: Decimal::from(amount),
            category: None,
            category_id: None,
            is_essential,
        }
    }

    async fn create_category(
        store: &SeaOrmStore,
        user: Uuid,
        name: &str,
        kind: CategoryKind,
    ) -> category::Model {
        store
            .create_category(
                user,
                NewCategory {
                    name: name.to_string(),
                    kind,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_income_round_trip_uses_default_category() {
        let store = store().await;
        let user = Uuid::new_v4();

        let created = store.create_income(user, new_income("Salário", 1000)).await.unwrap();
        let listed = store.list_incomes(user).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].description, "Salário");
        assert_eq!(listed[0].amount, Decimal::from(1000));
        assert_eq!(listed[0].category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_rows_of_other_users_look_missing() {
        let store = store().await;
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let income = store.create_income(owner, new_income("Freela", 300)).await.unwrap();

        assert!(store.list_incomes(intruder).await.unwrap().is_empty());
        assert!(matches!(
            store.get_income(intruder, income.id).await,
            Err(StoreError::NotFound("Income"))
        ));
        assert!(matches!(
            store.delete_income(intruder, income.id).await,
            Err(StoreError::NotFound("Income"))
        ));
        assert!(matches!(
            store
                .update_income(intruder, income.id, IncomePatch::default())
                .await,
            Err(StoreError::NotFound("Income"))
        ));
        assert_eq!(store.list_incomes(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_income_patches_only_given_fields() {
        let store = store().await;
        let user = Uuid::new_v4();
        let income = store.create_income(user, new_income("Salário", 1000)).await.unwrap();

        let updated = store
            .update_income(
                user,
                income.id,
                IncomePatch {
                    amount: Some(Decimal::from(1200)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.amount, Decimal::from(1200));
        assert_eq!(updated.description, "Salário");
    }

    #[tokio::test]
    async fn test_list_expenses_filters_by_essential() {
        let store = store().await;
        let user = Uuid::new_v4();
        store.create_expense(user, new_expense("Aluguel", 400, true)).await.unwrap();
        store.create_expense(user, new_expense("Cinema", 50, false)).await.unwrap();

        let essential = store.list_expenses(user, Some(true)).await.unwrap();
        let other = store.list_expenses(user, Some(false)).await.unwrap();
        let all = store.list_expenses(user, None).await.unwrap();

        assert_eq!(essential.len(), 1);
        assert_eq!(essential[0].description, "Aluguel");
        assert_eq!(other.len(), 1);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_expense_takes_name_of_linked_category() {
        let store = store().await;
        let user = Uuid::new_v4();
        let housing = create_category(&store, user, "Moradia", CategoryKind::Expense).await;

        let expense = store
            .create_expense(
                user,
                NewExpense {
                    category_id: Some(housing.id),
                    ..new_expense("Aluguel", 400, true)
                },
            )
            .await
            .unwrap();

        assert_eq!(expense.category, "Moradia");
        assert_eq!(expense.category_id, Some(housing.id));
    }

    #[tokio::test]
    async fn test_expense_rejects_foreign_or_income_category() {
        let store = store().await;
        let user = Uuid::new_v4();
        let salary = create_category(&store, user, "Salário", CategoryKind::Income).await;
        let foreign = create_category(&store, Uuid::new_v4(), "Outro", CategoryKind::Both).await;

        for category_id in [salary.id, foreign.id] {
            let result = store
                .create_expense(
                    user,
                    NewExpense {
                        category_id: Some(category_id),
                        ..new_expense("Mercado", 80, true)
                    },
                )
                .await;
            assert!(matches!(result, Err(StoreError::InvalidReference(_))));
        }
    }

    #[tokio::test]
    async fn test_categories_filtered_by_kind_include_both() {
        let store = store().await;
        let user = Uuid::new_v4();
        create_category(&store, user, "Salário", CategoryKind::Income).await;
        create_category(&store, user, "Moradia", CategoryKind::Expense).await;
        create_category(&store, user, "Investimentos", CategoryKind::Both).await;

        let expense_categories = store
            .list_categories(user, Some(CategoryKind::Expense))
            .await
            .unwrap();
        let names: Vec<&str> = expense_categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Investimentos", "Moradia"]);

        let all = store.list_categories(user, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_category_name_conflicts() {
        let store = store().await;
        let user = Uuid::new_v4();
        create_category(&store, user, "Lazer", CategoryKind::Expense).await;

        let duplicate = store
            .create_category(
                user,
                NewCategory {
                    name: "Lazer".to_string(),
                    kind: CategoryKind::Both,
                },
            )
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        // Another user may reuse the name.
        create_category(&store, Uuid::new_v4(), "Lazer", CategoryKind::Expense).await;
    }

    #[tokio::test]
    async fn test_renaming_category_updates_linked_expenses() {
        let store = store().await;
        let user = Uuid::new_v4();
        let category = create_category(&store, user, "Casa", CategoryKind::Expense).await;
        let expense = store
            .create_expense(
                user,
                NewExpense {
                    category_id: Some(category.id),
                    ..new_expense("Aluguel", 400, true)
                },
            )
            .await
            .unwrap();

        store
            .update_category(
                user,
                category.id,
                CategoryPatch {
                    name: Some("Moradia".to_string()),
                    kind: None,
                },
            )
            .await
            .unwrap();

        let reloaded = store.get_expense(user, expense.id).await.unwrap();
        assert_eq!(reloaded.category, "Moradia");
    }

    #[tokio::test]
    async fn test_deleting_category_unlinks_entries() {
        let store = store().await;
        let user = Uuid::new_v4();
        let category = create_category(&store, user, "Mercado", CategoryKind::Both).await;
        let expense = store
            .create_expense(
                user,
                NewExpense {
                    category_id: Some(category.id),
                    ..new_expense("Feira", 120, true)
                },
            )
            .await
            .unwrap();
        store
            .create_transaction(
                user,
                NewTransaction {
                    description: "Feira".to_string(),
                    amount: Decimal::from(120),
                    kind: TransactionKind::Expense,
                    category_id: Some(category.id),
                    date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                },
            )
            .await
            .unwrap();

        store.delete_category(user, category.id).await.unwrap();

        let expense = store.get_expense(user, expense.id).await.unwrap();
        assert_eq!(expense.category_id, None);
        let transactions = store.list_transactions(user, None).await.unwrap();
        assert_eq!(transactions[0].transaction.category_id, None);
        assert!(transactions[0].category.is_none());
        assert!(matches!(
            store.get_category(user, category.id).await,
            Err(StoreError::NotFound("Category"))
        ));
    }

    #[tokio::test]
    async fn test_transactions_newest_date_first_with_limit_and_category() {
        let store = store().await;
        let user = Uuid::new_v4();
        let salary = create_category(&store, user, "Salário", CategoryKind::Income).await;
        for (day, category_id) in [(5, Some(salary.id)), (20, None), (12, None)] {
            store
                .create_transaction(
                    user,
                    NewTransaction {
                        description: format!("Dia {}", day),
                        amount: Decimal::from(day),
                        kind: TransactionKind::Income,
                        category_id,
                        date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                    },
                )
                .await
                .unwrap();
        }

        let all = store.list_transactions(user, None).await.unwrap();
        let days: Vec<String> = all.iter().map(|t| t.transaction.description.clone()).collect();
        assert_eq!(days, vec!["Dia 20", "Dia 12", "Dia 5"]);
        assert_eq!(all[2].category.as_ref().map(|c| c.id), Some(salary.id));

        let limited = store.list_transactions(user, Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_user_data_removes_everything_of_that_user_only() {
        let store = store().await;
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.create_income(user, new_income("Salário", 1000)).await.unwrap();
        store.create_expense(user, new_expense("Aluguel", 400, true)).await.unwrap();
        create_category(&store, user, "Lazer", CategoryKind::Expense).await;
        store.create_income(other, new_income("Salário", 900)).await.unwrap();

        store.delete_user_data(user).await.unwrap();

        assert!(store.list_incomes(user).await.unwrap().is_empty());
        assert!(store.list_expenses(user, None).await.unwrap().is_empty());
        assert!(store.list_categories(user, None).await.unwrap().is_empty());
        assert_eq!(store.list_incomes(other).await.unwrap().len(), 1);
    }
}
