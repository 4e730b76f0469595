//! SeaORM adapter for the cryptocurrencies table.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, NotSet, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::cryptocurrencies;

pub mod dto;

pub use dto::{CryptoUpsert, ListFilter, SortColumn};

pub async fn find_by_coin_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    coin_id: &str,
) -> Result<Option<cryptocurrencies::Model>, sea_orm::DbErr> {
    cryptocurrencies::Entity::find()
        .filter(cryptocurrencies::Column::CoinId.eq(coin_id))
        .one(conn)
        .await
}

pub async fn insert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CryptoUpsert,
    now: OffsetDateTime,
) -> Result<cryptocurrencies::Model, sea_orm::DbErr> {
    let active = cryptocurrencies::ActiveModel {
        id: NotSet,
        coin_id: Set(dto.coin_id),
        name: Set(dto.name),
        symbol: Set(dto.symbol),
        market_cap_rank: Set(dto.market_cap_rank),
        current_price: Set(dto.current_price),
        market_cap: Set(dto.market_cap),
        total_volume: Set(dto.total_volume),
        last_updated: Set(dto.last_updated.unwrap_or(now)),
    };

    active.insert(conn).await
}

/// Overwrite every mutable field of `existing`. `id` and `coin_id` never change.
///
/// A missing upstream `last_updated` keeps the stored value.
pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    existing: cryptocurrencies::Model,
    dto: CryptoUpsert,
) -> Result<cryptocurrencies::Model, sea_orm::DbErr> {
    let last_updated = dto.last_updated.unwrap_or(existing.last_updated);
    let mut active: cryptocurrencies::ActiveModel = existing.clone().into();
    active.name.set_if_not_equals(dto.name);
    active.symbol.set_if_not_equals(dto.symbol);
    active.market_cap_rank.set_if_not_equals(dto.market_cap_rank);
    active.current_price.set_if_not_equals(dto.current_price);
    active.market_cap.set_if_not_equals(dto.market_cap);
    active.total_volume.set_if_not_equals(dto.total_volume);
    active.last_updated.set_if_not_equals(last_updated);

    // Identical values leave the row untouched
    if !active.is_changed() {
        return Ok(existing);
    }
    active.update(conn).await
}

/// One page of rows plus the total number of matching rows.
pub async fn list<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    filter: &ListFilter,
) -> Result<(Vec<cryptocurrencies::Model>, u64), sea_orm::DbErr> {
    let mut query = cryptocurrencies::Entity::find();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(cryptocurrencies::Column::Name)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(cryptocurrencies::Column::Symbol)))
                        .like(pattern),
                ),
        );
    }

    let order = if filter.descending {
        Order::Desc
    } else {
        Order::Asc
    };
    // Secondary key keeps pages stable when the primary sort ties
    let query = query
        .order_by(sort_column(filter.sort), order)
        .order_by_asc(cryptocurrencies::Column::Id);

    let paginator = query.paginate(conn, filter.size.max(1));
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(filter.page).await?;
    Ok((rows, total))
}

pub async fn count<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<u64, sea_orm::DbErr> {
    cryptocurrencies::Entity::find().count(conn).await
}

pub async fn latest_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Option<OffsetDateTime>, sea_orm::DbErr> {
    let newest = cryptocurrencies::Entity::find()
        .order_by_desc(cryptocurrencies::Column::LastUpdated)
        .one(conn)
        .await?;
    Ok(newest.map(|m| m.last_updated))
}

fn sort_column(sort: SortColumn) -> cryptocurrencies::Column {
    match sort {
        SortColumn::MarketCapRank => cryptocurrencies::Column::MarketCapRank,
        SortColumn::Name => cryptocurrencies::Column::Name,
        SortColumn::Symbol => cryptocurrencies::Column::Symbol,
        SortColumn::CurrentPrice => cryptocurrencies::Column::CurrentPrice,
        SortColumn::MarketCap => cryptocurrencies::Column::MarketCap,
        SortColumn::TotalVolume => cryptocurrencies::Column::TotalVolume,
        SortColumn::LastUpdated => cryptocurrencies::Column::LastUpdated,
    }
}
