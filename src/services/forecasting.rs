use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::engine::{allocate, ForecastBasis, Rollup};
use crate::errors::ServiceError;
use crate::models::{
    ForecastScope, MetricKind, MonthlyDistribution, RowFailure, Stage, StageReport, YearMonth,
};
use crate::repositories::{CatalogRepository, ForecastRepository, ForecastRow, ProductFilter};

use super::finish_stage;

/// Product forecasts and their brand rollup.
#[derive(Debug, Clone)]
pub struct ForecastService {
    catalog: CatalogRepository,
    forecasts: ForecastRepository,
    engine: EngineConfig,
}

impl ForecastService {
    pub fn new(db_pool: Arc<DbPool>, engine: EngineConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            forecasts: ForecastRepository::new(db_pool),
            engine,
        }
    }

    /// Forecasts the products in `scope` and, for a full run, rolls them up onto brands.
    #[instrument(skip(self, debug))]
    pub async fn recompute(
        &self,
        scope: ForecastScope,
        debug: bool,
        run_id: Uuid,
    ) -> Result<Vec<StageReport>, ServiceError> {
        let mut reports = vec![self.forecast_products(scope, debug, run_id).await?];
        if scope == ForecastScope::All {
            reports.push(self.rollup_brands(run_id).await?);
        }
        Ok(reports)
    }

    /// Replaces the product forecast partition for `scope`.
    ///
    /// A product whose allocation fails keeps the rows it had before the run.
    pub async fn forecast_products(
        &self,
        scope: ForecastScope,
        debug: bool,
        run_id: Uuid,
    ) -> Result<StageReport, ServiceError> {
        let mut report = StageReport::start(Stage::Forecast, run_id, self.engine.error_report_limit);
        let anchor = self.engine.anchor_window();
        let horizon = self.engine.forecast_window();

        let filter = match scope {
            ForecastScope::All => ProductFilter::All,
            ForecastScope::Product(id) => ProductFilter::Product(id),
        };
        let products = self.catalog.products(filter).await?;
        if let ForecastScope::Product(id) = scope {
            if products.is_empty() {
                return Err(ServiceError::NotFound(format!(
                    "product {} does not exist or has no brand",
                    id
                )));
            }
        }

        let curves: HashMap<i32, Option<MonthlyDistribution>> = self
            .catalog
            .seasonality_groups()
            .await?
            .iter()
            .map(|g| (g.id, g.distribution()))
            .collect();

        info!(products = products.len(), %anchor, %horizon, "Allocating forecasts");

        let mut rows = Vec::with_capacity(products.len() * horizon.len() as usize * 2);
        let mut failed = BTreeSet::new();
        let mut zeroed = 0usize;

        for product in &products {
            let basis = ForecastBasis {
                eol: product.eol,
                curve: product
                    .seasonality_group_id
                    .and_then(|group| curves.get(&group).copied().flatten()),
                recent_units: product.recent_units,
                recent_revenue: product.recent_revenue,
                trailing_units: product.trailing_units,
                trailing_revenue: product.trailing_revenue,
            };
            let forecast = allocate(&basis, &anchor, &horizon);

            if debug {
                info!(
                    product_id = product.id,
                    lifecycle = %product.lifecycle(),
                    group_id = ?product.seasonality_group_id,
                    recent_units = basis.recent_units,
                    recent_revenue = basis.recent_revenue,
                    run_rate = forecast.run_rate,
                    unit_price = forecast.unit_price,
                    zero_reason = ?forecast.zero_reason,
                    "Forecast basis"
                );
            }

            if !forecast.is_finite() {
                error!(product_id = product.id, "Non-finite forecast, keeping previous rows");
                report.record_failure(RowFailure {
                    entity: "product",
                    id: product.id.into(),
                    message: format!(
                        "non-finite forecast (run_rate={}, unit_price={})",
                        forecast.run_rate, forecast.unit_price
                    ),
                });
                failed.insert(product.id);
                continue;
            }

            if forecast.zero_reason.is_some() {
                zeroed += 1;
            }
            rows.extend(forecast.points().map(|(metric, month, value)| ForecastRow {
                entity_id: product.id,
                metric,
                month,
                value,
            }));
            report.record_success();
        }

        if !failed.is_empty() {
            rows.extend(self.previous_rows(&failed).await?);
        }

        info!(zeroed, rows = rows.len(), "Writing product forecasts");
        let written = self
            .forecasts
            .replace_product_forecasts(scope, rows, self.engine.insert_chunk_size)
            .await?;
        report.add_rows_written(written);

        Ok(finish_stage(report))
    }

    async fn previous_rows(&self, products: &BTreeSet<i32>) -> Result<Vec<ForecastRow>, ServiceError> {
        let rows = self
            .forecasts
            .product_forecasts()
            .await?
            .into_iter()
            .filter(|row| products.contains(&row.product_id))
            .filter_map(|row| {
                Some(ForecastRow {
                    entity_id: row.product_id,
                    metric: MetricKind::from_label(&row.metric)?,
                    month: YearMonth::from_date(row.month),
                    value: row.value,
                })
            })
            .collect();
        Ok(rows)
    }

    /// Sums stored product forecasts per (brand, metric, month) and replaces the
    /// brand forecast table. Reads only stored child rows, so reruns are identical.
    pub async fn rollup_brands(&self, run_id: Uuid) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::BrandForecast, run_id, self.engine.error_report_limit);

        let brand_of: HashMap<i32, i32> = self
            .catalog
            .products(ProductFilter::All)
            .await?
            .into_iter()
            .filter_map(|p| p.brand_id.map(|brand| (p.id, brand)))
            .collect();

        let mut rollup: Rollup<(i32, MetricKind, YearMonth)> = Rollup::new();
        for point in self.forecasts.product_forecasts().await? {
            let Some(metric) = MetricKind::from_label(&point.metric) else {
                warn!(id = point.id, metric = %point.metric, "Unknown forecast metric");
                continue;
            };
            if let Some(brand_id) = brand_of.get(&point.product_id) {
                rollup.add((*brand_id, metric, YearMonth::from_date(point.month)), point.value);
            }
        }

        let rows: Vec<ForecastRow> = rollup
            .into_rows()
            .map(|((brand_id, metric, month), value)| ForecastRow {
                entity_id: brand_id,
                metric,
                month,
                value,
            })
            .collect();

        let covered: BTreeSet<i32> = rows.iter().map(|r| r.entity_id).collect();
        for brand in self.catalog.brands(None).await? {
            if covered.contains(&brand.id) {
                report.record_success();
            } else {
                report.record_skip();
            }
        }

        let written = self
            .forecasts
            .replace_brand_forecasts(rows, self.engine.insert_chunk_size)
            .await?;
        report.add_rows_written(written);

        Ok(finish_stage(report))
    }
}
