use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Brand entity. Every metric column is a rollup of the brand's products.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub category_id: Option<i32>,

    /// Net revenue over the trailing window
    pub trailing_revenue: f64,

    /// CM3 over the trailing window
    pub trailing_margin: f64,

    /// Re-derived from the summed margin and revenue
    pub trailing_margin_pct: f64,

    pub trailing_units: f64,

    pub trailing_stock_value: f64,

    /// Current on-hand stock
    pub stock_units: f64,
    pub stock_value: f64,

    pub overstock_units: f64,
    pub overstock_value: f64,

    pub metrics_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::brand_forecast::Entity")]
    Forecasts,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::brand_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forecasts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
