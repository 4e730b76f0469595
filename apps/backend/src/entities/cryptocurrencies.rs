use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cryptocurrencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Upstream identifier (e.g. "bitcoin"); the upsert key
    #[sea_orm(column_name = "coin_id", unique)]
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    #[sea_orm(column_name = "market_cap_rank")]
    pub market_cap_rank: Option<i32>,
    #[sea_orm(column_name = "current_price")]
    pub current_price: Option<f64>,
    #[sea_orm(column_name = "market_cap")]
    pub market_cap: Option<f64>,
    #[sea_orm(column_name = "total_volume")]
    pub total_volume: Option<f64>,
    #[sea_orm(column_name = "last_updated")]
    pub last_updated: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
