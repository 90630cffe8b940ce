use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::engine::{CountingRollup, Rollup};
use crate::errors::ServiceError;
use crate::models::{RowFailure, Stage, StageReport, SummaryMetric, SummaryTables, YearMonth};
use crate::repositories::{
    BrandSummaryRow, CatalogRepository, CategorySummaryRow, FactRepository, ProductFilter,
    SummaryRepository,
};

use super::finish_stage;

type BrandKey = (i32, Option<i32>, YearMonth, SummaryMetric);
type CategoryKey = (i32, YearMonth, SummaryMetric);

/// Pre-aggregated monthly tables read by dashboards.
#[derive(Debug, Clone)]
pub struct SummaryService {
    catalog: CatalogRepository,
    facts: FactRepository,
    summaries: SummaryRepository,
    engine: EngineConfig,
}

impl SummaryService {
    pub fn new(db_pool: Arc<DbPool>, engine: EngineConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            facts: FactRepository::new(db_pool.clone()),
            summaries: SummaryRepository::new(db_pool),
            engine,
        }
    }

    /// Refreshes the selected tables. Category summaries are built from the
    /// brand summary table, so the brand table is refreshed first.
    #[instrument(skip(self))]
    pub async fn refresh(
        &self,
        tables: SummaryTables,
        run_id: Uuid,
    ) -> Result<Vec<StageReport>, ServiceError> {
        let mut reports = Vec::new();
        if tables.brand {
            reports.push(self.refresh_brand_summaries(run_id).await?);
        }
        if tables.category {
            reports.push(self.refresh_category_summaries(run_id).await?);
        }
        Ok(reports)
    }

    /// Monthly totals per (brand, category, month, metric) over every fact of
    /// a branded product, with the number of distinct contributing products.
    /// Every metric label is kept, not only the ones the engine computes with.
    pub async fn refresh_brand_summaries(&self, run_id: Uuid) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::BrandSummaries, run_id, self.engine.error_report_limit);

        let brand_of: HashMap<i32, i32> = self
            .catalog
            .products(ProductFilter::All)
            .await?
            .into_iter()
            .filter_map(|p| p.brand_id.map(|brand| (p.id, brand)))
            .collect();
        let category_of: HashMap<i32, Option<i32>> = self
            .catalog
            .brands(None)
            .await?
            .into_iter()
            .map(|b| (b.id, b.category_id))
            .collect();

        let mut rollup: CountingRollup<BrandKey, i32> = CountingRollup::new();
        for fact in self.facts.all_facts().await? {
            let (Some(metric), Some(brand_id)) =
                (SummaryMetric::from_label(&fact.metric), brand_of.get(&fact.product_id))
            else {
                report.record_skip();
                continue;
            };
            if !fact.value.is_finite() {
                report.record_failure(RowFailure {
                    entity: "financial_fact",
                    id: fact.id.into(),
                    message: format!("non-finite value {}", fact.value),
                });
                continue;
            }
            let category_id = category_of.get(brand_id).copied().flatten();
            rollup.add(
                (*brand_id, category_id, fact.year_month(), metric),
                fact.product_id,
                fact.value,
            );
            report.record_success();
        }

        let rows: Vec<BrandSummaryRow> = rollup
            .into_rows()
            .map(|((brand_id, category_id, month, metric), total_value, product_count)| {
                BrandSummaryRow {
                    brand_id,
                    category_id,
                    month,
                    metric,
                    total_value,
                    product_count,
                }
            })
            .collect();

        info!(rows = rows.len(), "Writing brand summaries");
        let written = self
            .summaries
            .replace_brand_summaries(rows, self.engine.insert_chunk_size)
            .await?;
        report.add_rows_written(written);

        if report.failed > 0 {
            error!(failed = report.failed, "Facts left out of brand summaries");
        }
        Ok(finish_stage(report))
    }

    /// Category totals from the categorized brand summary rows: summed value,
    /// distinct brands and summed product counts.
    pub async fn refresh_category_summaries(
        &self,
        run_id: Uuid,
    ) -> Result<StageReport, ServiceError> {
        let mut report =
            StageReport::start(Stage::CategorySummaries, run_id, self.engine.error_report_limit);

        let mut totals: CountingRollup<CategoryKey, i32> = CountingRollup::new();
        let mut products: Rollup<CategoryKey, i64> = Rollup::new();

        for row in self.summaries.categorized_brand_summaries().await? {
            let (Some(category_id), Some(metric)) =
                (row.category_id, SummaryMetric::from_label(&row.metric))
            else {
                warn!(id = row.id, metric = %row.metric, "Skipping brand summary row");
                report.record_skip();
                continue;
            };
            let key = (category_id, YearMonth::from_date(row.month), metric);
            products.add(key.clone(), i64::from(row.product_count));
            totals.add(key, row.brand_id, row.total_value);
            report.record_success();
        }

        let rows: Vec<CategorySummaryRow> = totals
            .into_rows()
            .map(|(key, total_value, brand_count)| {
                let product_count = products.get(&key) as usize;
                let (category_id, month, metric) = key;
                CategorySummaryRow {
                    category_id,
                    month,
                    metric,
                    total_value,
                    brand_count,
                    product_count,
                }
            })
            .collect();

        info!(rows = rows.len(), "Writing category summaries");
        let written = self
            .summaries
            .replace_category_summaries(rows, self.engine.insert_chunk_size)
            .await?;
        report.add_rows_written(written);

        Ok(finish_stage(report))
    }
}
