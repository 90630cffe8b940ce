use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Imported on-hand stock for one product, location and month.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: Option<i32>,

    pub location: String,

    pub month: NaiveDate,

    pub quantity: i64,

    pub unit_cost: Option<f64>,

    /// Total value of the on-hand quantity
    pub value: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
