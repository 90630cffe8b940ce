use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{MetricKind, YearMonth};

/// One monthly financial fact. Facts are append-only; the engine only reads them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_facts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: i32,

    /// Free-text metric label as imported ("Net revenue", "net units", "CM3"...)
    pub metric: String,

    /// First day of the month
    pub month: NaiveDate,

    /// Signed value
    pub value: f64,
}

impl Model {
    /// Resolved metric kind; `None` for labels the engine does not use.
    pub fn kind(&self) -> Option<MetricKind> {
        MetricKind::from_label(&self.metric)
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.month)
    }
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
