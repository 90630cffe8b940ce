//! Batch stages. Each service loads its working set, runs the engine over it
//! and writes the results back, reporting per-row outcomes in a [`StageReport`].

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::models::StageReport;

pub mod forecasting;
pub mod overstock;
pub mod seasonality;
pub mod summaries;
pub mod trailing_metrics;

pub use forecasting::ForecastService;
pub use overstock::OverstockService;
pub use seasonality::SeasonalityService;
pub use summaries::SummaryService;
pub use trailing_metrics::TrailingMetricsService;

/// Stops the stage clock, logs the summary line and records stage metrics.
pub(crate) fn finish_stage(report: StageReport) -> StageReport {
    let report = report.finish();
    let stage = report.stage.to_string();

    counter!("portfolio_forecast.stage.rows_processed", report.processed, "stage" => stage.clone());
    counter!("portfolio_forecast.stage.rows_failed", report.failed, "stage" => stage.clone());
    histogram!(
        "portfolio_forecast.stage.duration_seconds",
        report.elapsed_ms as f64 / 1000.0,
        "stage" => stage
    );

    if report.is_clean() {
        info!("{}", report);
    } else {
        warn!(truncated = report.truncated_errors(), "{}", report);
    }
    report
}
