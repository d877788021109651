use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_uuid(Categories::Id))
                    .col(string(Categories::Name))
                    .col(string_len(Categories::Type, 10))
                    .col(timestamp_with_time_zone(Categories::CreatedAt))
                    .col(uuid(Categories::UserId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_categories_user_name")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create incomes table
        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(pk_uuid(Incomes::Id))
                    .col(string(Incomes::Description))
                    .col(decimal(Incomes::Amount).decimal_len(16, 4))
                    .col(string(Incomes::Category).default("Geral"))
                    .col(boolean(Incomes::IsRecurrent).default(false))
                    .col(timestamp_with_time_zone(Incomes::CreatedAt))
                    .col(uuid(Incomes::UserId))
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_uuid(Expenses::Id))
                    .col(string(Expenses::Description))
                    .col(decimal(Expenses::Amount).decimal_len(16, 4))
                    .col(string(Expenses::Category).default("Geral"))
                    .col(uuid_null(Expenses::CategoryId))
                    .col(boolean(Expenses::IsEssential).default(false))
                    .col(timestamp_with_time_zone(Expenses::CreatedAt))
                    .col(uuid(Expenses::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_category")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Transactions::Id))
                    .col(string(Transactions::Description))
                    .col(decimal(Transactions::Amount).decimal_len(16, 4))
                    .col(string_len(Transactions::Type, 10))
                    .col(uuid_null(Transactions::CategoryId))
                    .col(date(Transactions::Date))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt))
                    .col(uuid(Transactions::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_category")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incomes_user")
                    .table(Incomes::Table)
                    .col(Incomes::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_user")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Type,
    CreatedAt,
    UserId,
}

#[derive(DeriveIden)]
enum Incomes {
    Table,
    Id,
    Description,
    Amount,
    Category,
    IsRecurrent,
    CreatedAt,
    UserId,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    Description,
    Amount,
    Category,
    CategoryId,
    IsEssential,
    CreatedAt,
    UserId,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    Description,
    Amount,
    Type,
    CategoryId,
    Date,
    CreatedAt,
    UserId,
}
