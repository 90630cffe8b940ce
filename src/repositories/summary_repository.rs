use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::entities::{
    brand_financial_summary::{self, Entity as BrandSummary},
    category_financial_summary::{self, Entity as CategorySummary},
};
use crate::errors::ServiceError;
use crate::models::{SummaryMetric, YearMonth};
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug, Clone, PartialEq)]
pub struct BrandSummaryRow {
    pub brand_id: i32,
    pub category_id: Option<i32>,
    pub month: YearMonth,
    pub metric: SummaryMetric,
    pub total_value: f64,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummaryRow {
    pub category_id: i32,
    pub month: YearMonth,
    pub metric: SummaryMetric,
    pub total_value: f64,
    pub brand_count: usize,
    pub product_count: usize,
}

/// Read-side summary tables for dashboards.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    base: BaseRepository,
}

impl SummaryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn replace_brand_summaries(
        &self,
        rows: Vec<BrandSummaryRow>,
        chunk_size: usize,
    ) -> Result<u64, ServiceError> {
        let models = rows
            .into_iter()
            .map(|row| brand_financial_summary::ActiveModel {
                brand_id: Set(row.brand_id),
                category_id: Set(row.category_id),
                month: Set(row.month.first_day()),
                metric: Set(row.metric.label().to_string()),
                total_value: Set(row.total_value),
                product_count: Set(row.product_count as i32),
                ..Default::default()
            })
            .collect();
        self.base
            .replace_partition(
                "replace_brand_summaries",
                BrandSummary::delete_many(),
                models,
                chunk_size,
            )
            .await
    }

    pub async fn brand_summaries(
        &self,
    ) -> Result<Vec<brand_financial_summary::Model>, ServiceError> {
        BrandSummary::find()
            .order_by_asc(brand_financial_summary::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Brand summary rows that carry a category, the input to category summaries.
    pub async fn categorized_brand_summaries(
        &self,
    ) -> Result<Vec<brand_financial_summary::Model>, ServiceError> {
        BrandSummary::find()
            .filter(brand_financial_summary::Column::CategoryId.is_not_null())
            .order_by_asc(brand_financial_summary::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn replace_category_summaries(
        &self,
        rows: Vec<CategorySummaryRow>,
        chunk_size: usize,
    ) -> Result<u64, ServiceError> {
        let models = rows
            .into_iter()
            .map(|row| category_financial_summary::ActiveModel {
                category_id: Set(row.category_id),
                month: Set(row.month.first_day()),
                metric: Set(row.metric.label().to_string()),
                total_value: Set(row.total_value),
                brand_count: Set(row.brand_count as i32),
                product_count: Set(row.product_count as i32),
                ..Default::default()
            })
            .collect();
        self.base
            .replace_partition(
                "replace_category_summaries",
                CategorySummary::delete_many(),
                models,
                chunk_size,
            )
            .await
    }

    pub async fn category_summaries(
        &self,
    ) -> Result<Vec<category_financial_summary::Model>, ServiceError> {
        CategorySummary::find()
            .order_by_asc(category_financial_summary::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }
}
