use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{ensure_positive_id, with_stage_events, Command},
    config::EngineConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{Stage, StageReport, TrailingScope},
    services::TrailingMetricsService,
};

#[derive(Debug, Clone, Validate)]
pub struct RunTrailingMetricsCommand {
    #[validate]
    pub engine: EngineConfig,
    pub scope: TrailingScope,
    pub run_id: Uuid,
}

impl RunTrailingMetricsCommand {
    pub fn new(engine: EngineConfig, scope: TrailingScope, run_id: Uuid) -> Self {
        Self {
            engine,
            scope,
            run_id,
        }
    }
}

#[async_trait]
impl Command for RunTrailingMetricsCommand {
    type Result = Vec<StageReport>;

    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id, scope = %self.scope))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ensure_positive_id("brand", self.scope.brand_id())?;

        let stage = if self.scope.includes_products() {
            Stage::TrailingMetrics
        } else {
            Stage::BrandTrailingMetrics
        };
        let service = TrailingMetricsService::new(db_pool, self.engine.clone());
        with_stage_events(
            stage,
            self.run_id,
            &event_sender,
            service.recompute(self.scope, self.run_id),
        )
        .await
    }
}
