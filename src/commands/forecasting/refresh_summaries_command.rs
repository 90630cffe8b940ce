use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{with_stage_events, Command},
    config::EngineConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{Stage, StageReport, SummaryTables},
    services::SummaryService,
};

#[derive(Debug, Clone, Validate)]
pub struct RefreshSummariesCommand {
    #[validate]
    pub engine: EngineConfig,
    pub tables: SummaryTables,
    pub run_id: Uuid,
}

impl RefreshSummariesCommand {
    pub fn new(engine: EngineConfig, tables: SummaryTables, run_id: Uuid) -> Self {
        Self {
            engine,
            tables,
            run_id,
        }
    }
}

#[async_trait]
impl Command for RefreshSummariesCommand {
    type Result = Vec<StageReport>;

    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        if !self.tables.brand && !self.tables.category {
            info!("No summary tables selected");
            return Ok(Vec::new());
        }

        let stage = if self.tables.brand {
            Stage::BrandSummaries
        } else {
            Stage::CategorySummaries
        };
        let service = SummaryService::new(db_pool, self.engine.clone());
        with_stage_events(
            stage,
            self.run_id,
            &event_sender,
            service.refresh(self.tables, self.run_id),
        )
        .await
    }
}
