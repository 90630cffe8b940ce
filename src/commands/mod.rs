use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Stage, StageReport},
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

pub mod forecasting;
pub mod pipeline;

pub use forecasting::{
    refresh_summaries_command::RefreshSummariesCommand,
    run_forecast_command::RunForecastCommand, run_overstock_command::RunOverstockCommand,
    run_seasonality_command::RunSeasonalityCommand,
    run_trailing_metrics_command::RunTrailingMetricsCommand,
};
pub use pipeline::run_pipeline_command::{PipelineOutcome, RunPipelineCommand};

/// Command trait for implementing the Command Pattern
///
/// Each batch entry point is a command: it validates itself, runs its stage(s)
/// and publishes lifecycle events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish batch events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

/// Wraps a stage run with start, completion and failure events.
pub(crate) async fn with_stage_events<Fut>(
    stage: Stage,
    run_id: Uuid,
    event_sender: &EventSender,
    run: Fut,
) -> Result<Vec<StageReport>, ServiceError>
where
    Fut: Future<Output = Result<Vec<StageReport>, ServiceError>>,
{
    event_sender
        .send_or_log(Event::StageStarted { stage, run_id })
        .await;

    match run.await {
        Ok(reports) => {
            for report in &reports {
                event_sender
                    .send_or_log(Event::StageCompleted(report.clone()))
                    .await;
            }
            Ok(reports)
        }
        Err(e) => {
            event_sender
                .send_or_log(Event::StageFailed {
                    stage,
                    run_id,
                    message: e.to_string(),
                })
                .await;
            Err(e)
        }
    }
}

/// Ids passed on the command line must be positive.
pub(crate) fn ensure_positive_id(entity: &str, id: Option<i32>) -> Result<(), ServiceError> {
    match id {
        Some(id) if id <= 0 => Err(ServiceError::ValidationError(format!(
            "{} id must be positive, got {}",
            entity, id
        ))),
        _ => Ok(()),
    }
}
