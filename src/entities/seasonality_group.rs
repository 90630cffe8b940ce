use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::models::MonthlyDistribution;

/// Seasonality group entity: products presumed to share one demand curve.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seasonality_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub month_01: Option<f64>,
    pub month_02: Option<f64>,
    pub month_03: Option<f64>,
    pub month_04: Option<f64>,
    pub month_05: Option<f64>,
    pub month_06: Option<f64>,
    pub month_07: Option<f64>,
    pub month_08: Option<f64>,
    pub month_09: Option<f64>,
    pub month_10: Option<f64>,
    pub month_11: Option<f64>,
    pub month_12: Option<f64>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    fn columns(&self) -> [Option<f64>; 12] {
        [
            self.month_01,
            self.month_02,
            self.month_03,
            self.month_04,
            self.month_05,
            self.month_06,
            self.month_07,
            self.month_08,
            self.month_09,
            self.month_10,
            self.month_11,
            self.month_12,
        ]
    }

    /// The stored curve, or `None` when it has never been computed (all columns
    /// null). Individual null months read as 0.
    pub fn distribution(&self) -> Option<MonthlyDistribution> {
        let columns = self.columns();
        if columns.iter().all(Option::is_none) {
            return None;
        }
        Some(MonthlyDistribution::new(columns.map(|v| v.unwrap_or(0.0))))
    }
}

impl ActiveModel {
    /// Overwrites all 12 month columns at once.
    pub fn set_distribution(&mut self, curve: &MonthlyDistribution) {
        let v = curve.values();
        self.month_01 = Set(Some(v[0]));
        self.month_02 = Set(Some(v[1]));
        self.month_03 = Set(Some(v[2]));
        self.month_04 = Set(Some(v[3]));
        self.month_05 = Set(Some(v[4]));
        self.month_06 = Set(Some(v[5]));
        self.month_07 = Set(Some(v[6]));
        self.month_08 = Set(Some(v[7]));
        self.month_09 = Set(Some(v[8]));
        self.month_10 = Set(Some(v[9]));
        self.month_11 = Set(Some(v[10]));
        self.month_12 = Set(Some(v[11]));
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
