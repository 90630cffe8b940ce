use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Product lifecycle. End-of-life products are excluded from seasonality and
/// forecast to zero, but are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LifecycleState {
    Active,
    EndOfLife,
}

/// Product (catalog item) entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Marketplace identifier (ASIN)
    #[sea_orm(unique)]
    pub external_id: String,

    pub name: Option<String>,

    /// Products without a brand are ignored by every batch stage
    pub brand_id: Option<i32>,

    pub seasonality_group_id: Option<i32>,

    /// End-of-life flag
    pub eol: bool,

    pub trailing_revenue: f64,
    pub trailing_margin: f64,
    pub trailing_margin_pct: f64,
    pub trailing_units: f64,
    pub trailing_stock_value: f64,

    /// Units sold over the anchor window
    pub recent_units: f64,
    /// Revenue over the anchor window
    pub recent_revenue: f64,

    pub stock_units: f64,
    pub stock_value: f64,

    pub overstock_units: f64,
    pub overstock_value: f64,

    pub metrics_refreshed_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn lifecycle(&self) -> LifecycleState {
        if self.eol {
            LifecycleState::EndOfLife
        } else {
            LifecycleState::Active
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(
        belongs_to = "super::seasonality_group::Entity",
        from = "Column::SeasonalityGroupId",
        to = "super::seasonality_group::Column::Id"
    )]
    SeasonalityGroup,
    #[sea_orm(has_many = "super::financial_fact::Entity")]
    FinancialFacts,
    #[sea_orm(has_many = "super::product_forecast::Entity")]
    Forecasts,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::seasonality_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeasonalityGroup.def()
    }
}

impl Related<super::financial_fact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialFacts.def()
    }
}

impl Related<super::product_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forecasts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
