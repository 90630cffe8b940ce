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
    models::{ForecastScope, Stage, StageReport},
    services::ForecastService,
};

#[derive(Debug, Clone, Validate)]
pub struct RunForecastCommand {
    #[validate]
    pub engine: EngineConfig,
    pub scope: ForecastScope,
    /// Log each product's forecast basis
    pub debug: bool,
    pub run_id: Uuid,
}

impl RunForecastCommand {
    pub fn new(engine: EngineConfig, scope: ForecastScope, run_id: Uuid) -> Self {
        Self {
            engine,
            scope,
            debug: false,
            run_id,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[async_trait]
impl Command for RunForecastCommand {
    type Result = Vec<StageReport>;

    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id, scope = %self.scope))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ensure_positive_id("product", self.scope.product_id())?;

        let service = ForecastService::new(db_pool, self.engine.clone());
        with_stage_events(
            Stage::Forecast,
            self.run_id,
            &event_sender,
            service.recompute(self.scope, self.debug, self.run_id),
        )
        .await
    }
}
