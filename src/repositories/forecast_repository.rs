use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::entities::{
    brand_forecast::{self, Entity as BrandForecast},
    product_forecast::{self, Entity as ProductForecast},
};
use crate::errors::ServiceError;
use crate::models::{ForecastScope, MetricKind, MonthWindow, YearMonth};
use crate::repositories::Repository;

use super::BaseRepository;

/// One forecast point for a product or a brand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub entity_id: i32,
    pub metric: MetricKind,
    pub month: YearMonth,
    pub value: f64,
}

impl ForecastRow {
    fn into_product_model(self) -> product_forecast::ActiveModel {
        product_forecast::ActiveModel {
            product_id: Set(self.entity_id),
            metric: Set(self.metric.label().to_string()),
            month: Set(self.month.first_day()),
            value: Set(self.value),
            ..Default::default()
        }
    }

    fn into_brand_model(self) -> brand_forecast::ActiveModel {
        brand_forecast::ActiveModel {
            brand_id: Set(self.entity_id),
            metric: Set(self.metric.label().to_string()),
            month: Set(self.month.first_day()),
            value: Set(self.value),
            ..Default::default()
        }
    }
}

/// Product and brand forecast series. Both tables are only ever written
/// through partition replacement.
#[derive(Debug, Clone)]
pub struct ForecastRepository {
    base: BaseRepository,
}

impl ForecastRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Replaces the product forecast partition named by `scope` (one product,
    /// or the whole table).
    pub async fn replace_product_forecasts(
        &self,
        scope: ForecastScope,
        rows: Vec<ForecastRow>,
        chunk_size: usize,
    ) -> Result<u64, ServiceError> {
        let delete = match scope {
            ForecastScope::All => ProductForecast::delete_many(),
            ForecastScope::Product(id) => {
                ProductForecast::delete_many().filter(product_forecast::Column::ProductId.eq(id))
            }
        };
        let models = rows.into_iter().map(ForecastRow::into_product_model).collect();
        self.base
            .replace_partition("replace_product_forecasts", delete, models, chunk_size)
            .await
    }

    pub async fn product_forecasts(&self) -> Result<Vec<product_forecast::Model>, ServiceError> {
        ProductForecast::find()
            .order_by_asc(product_forecast::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Unit forecast points falling inside `window`.
    pub async fn product_units_within(
        &self,
        window: &MonthWindow,
    ) -> Result<Vec<product_forecast::Model>, ServiceError> {
        ProductForecast::find()
            .filter(product_forecast::Column::Metric.eq(MetricKind::Units.label()))
            .filter(
                product_forecast::Column::Month.between(window.first_day(), window.last_day_key()),
            )
            .order_by_asc(product_forecast::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Brand forecasts are always rolled up globally, so the whole table is replaced.
    pub async fn replace_brand_forecasts(
        &self,
        rows: Vec<ForecastRow>,
        chunk_size: usize,
    ) -> Result<u64, ServiceError> {
        let models = rows.into_iter().map(ForecastRow::into_brand_model).collect();
        self.base
            .replace_partition(
                "replace_brand_forecasts",
                BrandForecast::delete_many(),
                models,
                chunk_size,
            )
            .await
    }

    pub async fn brand_forecasts(&self) -> Result<Vec<brand_forecast::Model>, ServiceError> {
        BrandForecast::find()
            .order_by_asc(brand_forecast::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }
}
