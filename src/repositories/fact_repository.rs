use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::entities::{
    financial_fact::{self, Entity as FinancialFact},
    stock_snapshot::{self, Entity as StockSnapshot},
};
use crate::errors::ServiceError;
use crate::models::MonthWindow;
use crate::repositories::Repository;

use super::BaseRepository;

/// Read-only access to imported facts and stock snapshots.
#[derive(Debug, Clone)]
pub struct FactRepository {
    base: BaseRepository,
}

impl FactRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Facts whose month falls inside `window`, ordered by id.
    pub async fn facts_within(
        &self,
        window: &MonthWindow,
    ) -> Result<Vec<financial_fact::Model>, ServiceError> {
        FinancialFact::find()
            .filter(financial_fact::Column::Month.between(window.first_day(), window.last_day_key()))
            .order_by_asc(financial_fact::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn all_facts(&self) -> Result<Vec<financial_fact::Model>, ServiceError> {
        FinancialFact::find()
            .order_by_asc(financial_fact::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Matched snapshots (with a product) inside `window`.
    pub async fn stock_within(
        &self,
        window: &MonthWindow,
    ) -> Result<Vec<stock_snapshot::Model>, ServiceError> {
        StockSnapshot::find()
            .filter(stock_snapshot::Column::ProductId.is_not_null())
            .filter(stock_snapshot::Column::Month.between(window.first_day(), window.last_day_key()))
            .order_by_asc(stock_snapshot::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Every matched snapshot, ordered by id.
    pub async fn stock_snapshots(&self) -> Result<Vec<stock_snapshot::Model>, ServiceError> {
        StockSnapshot::find()
            .filter(stock_snapshot::Column::ProductId.is_not_null())
            .order_by_asc(stock_snapshot::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }
}
