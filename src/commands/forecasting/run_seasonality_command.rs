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
    models::{Stage, StageReport},
    services::SeasonalityService,
};

#[derive(Debug, Clone, Validate)]
pub struct RunSeasonalityCommand {
    #[validate]
    pub engine: EngineConfig,
    pub run_id: Uuid,
}

impl RunSeasonalityCommand {
    pub fn new(engine: EngineConfig, run_id: Uuid) -> Self {
        Self { engine, run_id }
    }
}

#[async_trait]
impl Command for RunSeasonalityCommand {
    type Result = Vec<StageReport>;

    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let service = SeasonalityService::new(db_pool, self.engine.clone());
        with_stage_events(Stage::Seasonality, self.run_id, &event_sender, async {
            Ok(vec![service.recompute(self.run_id).await?])
        })
        .await
    }
}
