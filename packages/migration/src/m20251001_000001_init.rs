use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Cryptocurrencies {
    Table,
    Id,
    CoinId,
    Name,
    Symbol,
    MarketCapRank,
    CurrentPrice,
    MarketCap,
    TotalVolume,
    LastUpdated,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // cryptocurrencies
        manager
            .create_table(
                Table::create()
                    .table(Cryptocurrencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cryptocurrencies::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(Cryptocurrencies::CoinId)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cryptocurrencies::Name).string().not_null())
                    .col(ColumnDef::new(Cryptocurrencies::Symbol).string().not_null())
                    .col(ColumnDef::new(Cryptocurrencies::MarketCapRank).integer().null())
                    .col(ColumnDef::new(Cryptocurrencies::CurrentPrice).double().null())
                    .col(ColumnDef::new(Cryptocurrencies::MarketCap).double().null())
                    .col(ColumnDef::new(Cryptocurrencies::TotalVolume).double().null())
                    .col(
                        ColumnDef::new(Cryptocurrencies::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing defaults to rank ordering
        manager
            .create_index(
                Index::create()
                    .name("ix_cryptocurrencies_market_cap_rank")
                    .table(Cryptocurrencies::Table)
                    .col(Cryptocurrencies::MarketCapRank)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop index before table
        manager
            .drop_index(
                Index::drop()
                    .name("ix_cryptocurrencies_market_cap_rank")
                    .table(Cryptocurrencies::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Cryptocurrencies::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
