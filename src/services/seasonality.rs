use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::engine::seasonality::{group_units, normalize};
use crate::engine::CurveOutcome;
use crate::errors::ServiceError;
use crate::models::{MetricKind, MonthlyDistribution, RowFailure, Stage, StageReport};
use crate::repositories::{CatalogRepository, FactRepository, ProductFilter};

use super::finish_stage;

/// Recomputes every seasonality group's curve from the reference year.
#[derive(Debug, Clone)]
pub struct SeasonalityService {
    catalog: CatalogRepository,
    facts: FactRepository,
    engine: EngineConfig,
}

impl SeasonalityService {
    pub fn new(db_pool: Arc<DbPool>, engine: EngineConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            facts: FactRepository::new(db_pool),
            engine,
        }
    }

    /// Groups with no reference-year units are skipped and keep their stored
    /// curve. Every other group gets all 12 months overwritten at once.
    #[instrument(skip(self), fields(reference_year = self.engine.reference_year))]
    pub async fn recompute(&self, run_id: Uuid) -> Result<StageReport, ServiceError> {
        let mut report = StageReport::start(Stage::Seasonality, run_id, self.engine.error_report_limit);
        let window = self.engine.reference_window();

        let groups = self.catalog.seasonality_groups().await?;
        let members: HashMap<i32, i32> = self
            .catalog
            .products(ProductFilter::All)
            .await?
            .into_iter()
            .filter(|p| !p.eol)
            .filter_map(|p| p.seasonality_group_id.map(|group| (p.id, group)))
            .collect();

        let unit_facts = self
            .facts
            .facts_within(&window)
            .await?
            .into_iter()
            .filter(|f| f.kind() == Some(MetricKind::Units))
            .map(|f| (f.product_id, f.year_month(), f.value));
        let units = group_units(&members, unit_facts, &window);

        info!(
            groups = groups.len(),
            members = members.len(),
            %window,
            "Computing seasonality curves"
        );

        for group in &groups {
            let monthly = units
                .get(&group.id)
                .copied()
                .unwrap_or_else(MonthlyDistribution::zeros);

            let curve = match normalize(&monthly) {
                CurveOutcome::NoUnits => {
                    warn!(group_id = group.id, group = %group.name, "No reference-year units, keeping stored curve");
                    report.record_skip();
                    continue;
                }
                CurveOutcome::Computed(curve) => curve,
            };

            if !curve.is_finite() {
                error!(group_id = group.id, "Non-finite seasonality curve");
                report.record_failure(RowFailure {
                    entity: "seasonality_group",
                    id: group.id.into(),
                    message: format!("non-finite unit totals: {:?}", monthly.values()),
                });
                continue;
            }

            match self.catalog.set_group_distribution(group.id, &curve).await {
                Ok(rows) => {
                    report.add_rows_written(rows);
                    report.record_success();
                }
                Err(e) => {
                    error!(group_id = group.id, error = %e, "Failed to store seasonality curve");
                    report.record_failure(RowFailure {
                        entity: "seasonality_group",
                        id: group.id.into(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(finish_stage(report))
    }
}
