use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::engine::{Rollup, TrailingAccumulator, TrailingMetrics, TrailingWindows};
use crate::entities::product;
use crate::errors::ServiceError;
use crate::models::{RowFailure, Stage, StageReport, TrailingScope, YearMonth};
use crate::repositories::{CatalogRepository, FactRepository, ProductFilter};

use super::finish_stage;

/// Cached trailing metrics as currently stored on a product.
fn cached_metrics(product: &product::Model) -> TrailingMetrics {
    TrailingMetrics {
        revenue: product.trailing_revenue,
        margin: product.trailing_margin,
        margin_pct: product.trailing_margin_pct,
        units: product.trailing_units,
        stock_value: product.trailing_stock_value,
        recent_units: product.recent_units,
        recent_revenue: product.recent_revenue,
    }
}

#[derive(Debug, Clone)]
pub struct TrailingMetricsService {
    catalog: CatalogRepository,
    facts: FactRepository,
    engine: EngineConfig,
}

impl TrailingMetricsService {
    pub fn new(db_pool: Arc<DbPool>, engine: EngineConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            facts: FactRepository::new(db_pool),
            engine,
        }
    }

    fn windows(&self) -> TrailingWindows {
        TrailingWindows {
            trailing: self.engine.trailing_window(),
            anchor: self.engine.anchor_window(),
        }
    }

    /// Runs the product stage and/or the brand rollup depending on `scope`.
    #[instrument(skip(self))]
    pub async fn recompute(
        &self,
        scope: TrailingScope,
        run_id: Uuid,
    ) -> Result<Vec<StageReport>, ServiceError> {
        let mut reports = Vec::new();
        if scope.includes_products() {
            let filter = match scope {
                TrailingScope::BrandProducts(id) => ProductFilter::Brand(id),
                _ => ProductFilter::All,
            };
            reports.push(self.recompute_products(filter, run_id).await?);
        }
        if scope.includes_brands() {
            let only = match scope {
                TrailingScope::Brand(id) => Some(id),
                _ => None,
            };
            reports.push(self.rollup_brands(only, run_id).await?);
        }
        Ok(reports)
    }

    /// Sums trailing and anchor-window facts plus trailing stock value per product.
    pub async fn recompute_products(
        &self,
        filter: ProductFilter,
        run_id: Uuid,
    ) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::TrailingMetrics, run_id, self.engine.error_report_limit);
        let windows = self.windows();

        let products = self.catalog.products(filter).await?;
        let mut accumulators: HashMap<i32, TrailingAccumulator> = products
            .iter()
            .map(|p| (p.id, TrailingAccumulator::default()))
            .collect();

        for fact in self.facts.facts_within(&windows.trailing).await? {
            let (Some(kind), Some(acc)) = (fact.kind(), accumulators.get_mut(&fact.product_id)) else {
                continue;
            };
            acc.add_fact(&windows, kind, fact.year_month(), fact.value);
        }

        for snapshot in self.facts.stock_within(&windows.trailing).await? {
            let Some(acc) = snapshot.product_id.and_then(|id| accumulators.get_mut(&id)) else {
                continue;
            };
            acc.add_stock_value(&windows, YearMonth::from_date(snapshot.month), snapshot.value);
        }

        info!(
            products = products.len(),
            trailing = %windows.trailing,
            anchor = %windows.anchor,
            "Computing product trailing metrics"
        );

        for product in &products {
            let acc = accumulators.get(&product.id).copied().unwrap_or_default();
            let metrics = match acc.finish() {
                Ok(metrics) => metrics,
                Err(message) => {
                    error!(product_id = product.id, %message, "Skipping product");
                    report.record_failure(RowFailure {
                        entity: "product",
                        id: product.id.into(),
                        message,
                    });
                    continue;
                }
            };

            match self.catalog.set_product_trailing(product.id, &metrics).await {
                Ok(rows) => {
                    report.add_rows_written(rows);
                    report.record_success();
                }
                Err(e) => {
                    error!(product_id = product.id, error = %e, "Failed to store trailing metrics");
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

    /// Brand metrics are the sums of their products' cached metrics, with the
    /// margin percentage re-derived. Brands without products roll up to zero.
    pub async fn rollup_brands(
        &self,
        only: Option<i32>,
        run_id: Uuid,
    ) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::BrandTrailingMetrics, run_id, self.engine.error_report_limit);

        let filter = only.map_or(ProductFilter::All, ProductFilter::Brand);
        let products = self.catalog.products(filter).await?;
        let rollup: Rollup<i32, TrailingMetrics> =
            Rollup::from_children(products.iter().map(|p| (p.brand_id, cached_metrics(p))));

        for brand in self.catalog.brands(only).await? {
            let metrics = rollup.get(&brand.id).with_derived_pct();
            if !metrics.is_finite() {
                error!(brand_id = brand.id, "Non-finite brand rollup");
                report.record_failure(RowFailure {
                    entity: "brand",
                    id: brand.id.into(),
                    message: format!("non-finite trailing metrics: {:?}", metrics),
                });
                continue;
            }

            match self.catalog.set_brand_trailing(brand.id, &metrics).await {
                Ok(rows) => {
                    report.add_rows_written(rows);
                    report.record_success();
                }
                Err(e) => {
                    error!(brand_id = brand.id, error = %e, "Failed to store brand metrics");
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
