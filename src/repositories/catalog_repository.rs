use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::engine::{CurrentStock, Overstock, StockTotals, TrailingMetrics};
use crate::entities::{
    brand::{self, Entity as Brand},
    product::{self, Entity as Product},
    seasonality_group::{self, Entity as SeasonalityGroup},
};
use crate::errors::ServiceError;
use crate::models::MonthlyDistribution;
use crate::repositories::Repository;

use super::BaseRepository;

/// Which products a stage loads. Products without a brand are never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFilter {
    All,
    Brand(i32),
    Product(i32),
}

/// Products, brands and seasonality groups, plus their cached metric columns.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    base: BaseRepository,
}

impl CatalogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Branded products matching `filter`, ordered by id.
    pub async fn products(&self, filter: ProductFilter) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = Product::find().filter(product::Column::BrandId.is_not_null());
        query = match filter {
            ProductFilter::All => query,
            ProductFilter::Brand(id) => query.filter(product::Column::BrandId.eq(id)),
            ProductFilter::Product(id) => query.filter(product::Column::Id.eq(id)),
        };
        query
            .order_by_asc(product::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// All brands, or just `only`, ordered by id.
    pub async fn brands(&self, only: Option<i32>) -> Result<Vec<brand::Model>, ServiceError> {
        let mut query = Brand::find();
        if let Some(id) = only {
            query = query.filter(brand::Column::Id.eq(id));
        }
        query
            .order_by_asc(brand::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn seasonality_groups(&self) -> Result<Vec<seasonality_group::Model>, ServiceError> {
        SeasonalityGroup::find()
            .order_by_asc(seasonality_group::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Writes all 12 month columns of a group in a single statement.
    pub async fn set_group_distribution(
        &self,
        group_id: i32,
        curve: &MonthlyDistribution,
    ) -> Result<u64, ServiceError> {
        use seasonality_group::Column;

        let columns = [
            Column::Month01,
            Column::Month02,
            Column::Month03,
            Column::Month04,
            Column::Month05,
            Column::Month06,
            Column::Month07,
            Column::Month08,
            Column::Month09,
            Column::Month10,
            Column::Month11,
            Column::Month12,
        ];

        let mut update = SeasonalityGroup::update_many();
        for (column, value) in columns.into_iter().zip(curve.values().iter()) {
            update = update.col_expr(column, Expr::value(*value));
        }
        let result = update
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(group_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }

    pub async fn set_product_trailing(
        &self,
        product_id: i32,
        metrics: &TrailingMetrics,
    ) -> Result<u64, ServiceError> {
        use product::Column;

        let result = Product::update_many()
            .col_expr(Column::TrailingRevenue, Expr::value(metrics.revenue))
            .col_expr(Column::TrailingMargin, Expr::value(metrics.margin))
            .col_expr(Column::TrailingMarginPct, Expr::value(metrics.margin_pct))
            .col_expr(Column::TrailingUnits, Expr::value(metrics.units))
            .col_expr(Column::TrailingStockValue, Expr::value(metrics.stock_value))
            .col_expr(Column::RecentUnits, Expr::value(metrics.recent_units))
            .col_expr(Column::RecentRevenue, Expr::value(metrics.recent_revenue))
            .col_expr(Column::MetricsRefreshedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(product_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }

    pub async fn set_brand_trailing(
        &self,
        brand_id: i32,
        metrics: &TrailingMetrics,
    ) -> Result<u64, ServiceError> {
        use brand::Column;

        let result = Brand::update_many()
            .col_expr(Column::TrailingRevenue, Expr::value(metrics.revenue))
            .col_expr(Column::TrailingMargin, Expr::value(metrics.margin))
            .col_expr(Column::TrailingMarginPct, Expr::value(metrics.margin_pct))
            .col_expr(Column::TrailingUnits, Expr::value(metrics.units))
            .col_expr(Column::TrailingStockValue, Expr::value(metrics.stock_value))
            .col_expr(Column::MetricsRefreshedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(brand_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }

    pub async fn set_product_stock(
        &self,
        product_id: i32,
        stock: &CurrentStock,
        overstock: &Overstock,
    ) -> Result<u64, ServiceError> {
        use product::Column;

        let result = Product::update_many()
            .col_expr(Column::StockUnits, Expr::value(stock.units))
            .col_expr(Column::StockValue, Expr::value(stock.value))
            .col_expr(Column::OverstockUnits, Expr::value(overstock.units))
            .col_expr(Column::OverstockValue, Expr::value(overstock.value))
            .filter(Column::Id.eq(product_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }

    pub async fn set_brand_stock(
        &self,
        brand_id: i32,
        totals: &StockTotals,
    ) -> Result<u64, ServiceError> {
        use brand::Column;

        let result = Brand::update_many()
            .col_expr(Column::StockUnits, Expr::value(totals.stock_units))
            .col_expr(Column::StockValue, Expr::value(totals.stock_value))
            .col_expr(Column::OverstockUnits, Expr::value(totals.overstock_units))
            .col_expr(Column::OverstockValue, Expr::value(totals.overstock_value))
            .filter(Column::Id.eq(brand_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(result.rows_affected)
    }
}
