use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{with_stage_events, Command},
    config::EngineConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{OverstockMode, Stage, StageReport},
    services::OverstockService,
};

#[derive(Debug, Clone, Validate)]
pub struct RunOverstockCommand {
    #[validate]
    pub engine: EngineConfig,
    pub mode: OverstockMode,
    pub run_id: Uuid,
}

impl RunOverstockCommand {
    pub fn new(engine: EngineConfig, mode: OverstockMode, run_id: Uuid) -> Self {
        Self {
            engine,
            mode,
            run_id,
        }
    }
}

#[async_trait]
impl Command for RunOverstockCommand {
    type Result = Vec<StageReport>;

    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id, mode = %self.mode))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let stage = if self.mode.includes_products() {
            Stage::Overstock
        } else {
            Stage::BrandOverstock
        };
        let service = OverstockService::new(db_pool, self.engine.clone());
        with_stage_events(
            stage,
            self.run_id,
            &event_sender,
            service.recompute(self.mode, self.run_id),
        )
        .await
    }
}
