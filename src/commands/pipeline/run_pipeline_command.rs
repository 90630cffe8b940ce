use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{
        Command, RefreshSummariesCommand, RunForecastCommand, RunOverstockCommand,
        RunSeasonalityCommand, RunTrailingMetricsCommand,
    },
    config::EngineConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{ForecastScope, OverstockMode, Stage, StageReport, SummaryTables, TrailingScope},
};

type Step = Box<dyn Command<Result = Vec<StageReport>>>;

/// Every stage in dependency order.
#[derive(Debug, Clone, Validate)]
pub struct RunPipelineCommand {
    #[validate]
    pub engine: EngineConfig,
    pub run_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub message: String,
    pub exit_code: i32,
}

/// Reports of the stages that ran, and the fatal error that stopped the run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub reports: Vec<StageReport>,
    pub failure: Option<PipelineFailure>,
}

impl PipelineOutcome {
    pub fn exit_code(&self) -> i32 {
        self.failure.as_ref().map_or(0, |f| f.exit_code)
    }
}

impl RunPipelineCommand {
    pub fn new(engine: EngineConfig, run_id: Uuid) -> Self {
        Self { engine, run_id }
    }

    fn steps(&self) -> Vec<(Stage, Step)> {
        let engine = self.engine.clone();
        let run_id = self.run_id;
        vec![
            (
                Stage::Seasonality,
                Box::new(RunSeasonalityCommand::new(engine.clone(), run_id)) as Step,
            ),
            (
                Stage::TrailingMetrics,
                Box::new(RunTrailingMetricsCommand::new(engine.clone(), TrailingScope::All, run_id)) as Step,
            ),
            (
                Stage::Forecast,
                Box::new(RunForecastCommand::new(engine.clone(), ForecastScope::All, run_id)) as Step,
            ),
            (
                Stage::Overstock,
                Box::new(RunOverstockCommand::new(engine.clone(), OverstockMode::Both, run_id)) as Step,
            ),
            (
                Stage::BrandSummaries,
                Box::new(RefreshSummariesCommand::new(engine, SummaryTables::default(), run_id)) as Step,
            ),
        ]
    }
}

#[async_trait]
impl Command for RunPipelineCommand {
    type Result = PipelineOutcome;

    /// Stops at the first failed stage; the stages after it do not run.
    #[instrument(skip(self, db_pool, event_sender), fields(run_id = %self.run_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let mut outcome = PipelineOutcome {
            run_id: self.run_id,
            reports: Vec::new(),
            failure: None,
        };

        for (stage, step) in self.steps() {
            match step.execute(db_pool.clone(), event_sender.clone()).await {
                Ok(reports) => outcome.reports.extend(reports),
                Err(e) => {
                    error!(%stage, error = %e, "Stage failed, stopping run");
                    outcome.failure = Some(PipelineFailure {
                        stage,
                        message: e.to_string(),
                        exit_code: e.exit_code(),
                    });
                    break;
                }
            }
        }

        info!(
            stages = outcome.reports.len(),
            failed = outcome.failure.is_some(),
            "Pipeline finished"
        );
        Ok(outcome)
    }
}
