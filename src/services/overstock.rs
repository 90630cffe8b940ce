use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::engine::{CurrentStock, Overstock, Rollup, StockTotals};
use crate::errors::ServiceError;
use crate::models::{OverstockMode, RowFailure, Stage, StageReport, YearMonth};
use crate::repositories::{CatalogRepository, FactRepository, ForecastRepository, ProductFilter};

use super::finish_stage;

#[derive(Debug, Clone)]
pub struct OverstockService {
    catalog: CatalogRepository,
    facts: FactRepository,
    forecasts: ForecastRepository,
    engine: EngineConfig,
}

impl OverstockService {
    pub fn new(db_pool: Arc<DbPool>, engine: EngineConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            facts: FactRepository::new(db_pool.clone()),
            forecasts: ForecastRepository::new(db_pool),
            engine,
        }
    }

    #[instrument(skip(self))]
    pub async fn recompute(
        &self,
        mode: OverstockMode,
        run_id: Uuid,
    ) -> Result<Vec<StageReport>, ServiceError> {
        let mut reports = Vec::new();
        if mode.includes_products() {
            reports.push(self.evaluate_products(run_id).await?);
        }
        if mode.includes_brands() {
            reports.push(self.rollup_brands(run_id).await?);
        }
        Ok(reports)
    }

    /// Current stock from the latest snapshots, compared against the units
    /// forecast over the overstock horizon.
    pub async fn evaluate_products(&self, run_id: Uuid) -> Result<StageReport, ServiceError> {
        let mut report = StageReport::start(Stage::Overstock, run_id, self.engine.error_report_limit);
        let horizon = self.engine.overstock_window();

        let products = self.catalog.products(ProductFilter::All).await?;

        let mut snapshots: HashMap<i32, Vec<(YearMonth, i64, f64)>> = HashMap::new();
        for snapshot in self.facts.stock_snapshots().await? {
            if let Some(product_id) = snapshot.product_id {
                snapshots.entry(product_id).or_default().push((
                    YearMonth::from_date(snapshot.month),
                    snapshot.quantity,
                    snapshot.value,
                ));
            }
        }

        let mut covered: HashMap<i32, f64> = HashMap::new();
        for point in self.forecasts.product_units_within(&horizon).await? {
            *covered.entry(point.product_id).or_default() += point.value;
        }

        info!(products = products.len(), %horizon, "Evaluating overstock");

        for product in &products {
            let stock = CurrentStock::from_snapshots(
                snapshots.remove(&product.id).unwrap_or_default(),
            );
            let covered_units = covered.get(&product.id).copied().unwrap_or(0.0);
            let overstock = Overstock::evaluate(&stock, covered_units);

            let values = [stock.units, stock.value, overstock.units, overstock.value];
            if values.iter().any(|v| !v.is_finite()) {
                error!(product_id = product.id, "Non-finite stock values");
                report.record_failure(RowFailure {
                    entity: "product",
                    id: product.id.into(),
                    message: format!(
                        "non-finite stock (units={}, value={}, covered={})",
                        stock.units, stock.value, covered_units
                    ),
                });
                continue;
            }

            match self.catalog.set_product_stock(product.id, &stock, &overstock).await {
                Ok(rows) => {
                    report.add_rows_written(rows);
                    report.record_success();
                }
                Err(e) => {
                    error!(product_id = product.id, error = %e, "Failed to store overstock");
                    report.record_failure(RowFailure {
                        entity: "product",
                        id: product.id.into(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(finish_stage(report))
    }

    /// Sums the products' cached stock and overstock columns onto their brand.
    pub async fn rollup_brands(&self, run_id: Uuid) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::BrandOverstock, run_id, self.engine.error_report_limit);

        let products = self.catalog.products(ProductFilter::All).await?;
        let rollup: Rollup<i32, StockTotals> = Rollup::from_children(products.iter().map(|p| {
            (
                p.brand_id,
                StockTotals {
                    stock_units: p.stock_units,
                    stock_value: p.stock_value,
                    overstock_units: p.overstock_units,
                    overstock_value: p.overstock_value,
                },
            )
        }));

        for brand in self.catalog.brands(None).await? {
            let totals = rollup.get(&brand.id);
            match self.catalog.set_brand_stock(brand.id, &totals).await {
                Ok(rows) => {
                    report.add_rows_written(rows);
                    report.record_success();
                }
                Err(e) => {
                    error!(brand_id = brand.id, error = %e, "Failed to store brand overstock");
                    report.record_failure(RowFailure {
                        entity: "brand",
                        id: brand.id.into(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(finish_stage(report))
    }
}
