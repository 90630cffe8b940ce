use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Batch stages, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Seasonality,
    TrailingMetrics,
    BrandTrailingMetrics,
    Forecast,
    BrandForecast,
    Overstock,
    BrandOverstock,
    BrandSummaries,
    CategorySummaries,
}

/// A single row that could not be processed. The row keeps its prior state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub entity: &'static str,
    pub id: i64,
    pub message: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.entity, self.id, self.message)
    }
}

/// Operator-facing outcome of one stage run.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub run_id: Uuid,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub processed: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub rows_written: u64,
    /// First `error_limit` row failures, in processing order.
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
    #[serde(skip)]
    error_limit: usize,
    #[serde(skip)]
    clock: Option<Instant>,
}

impl StageReport {
    pub fn start(stage: Stage, run_id: Uuid, error_limit: usize) -> Self {
        Self {
            run_id,
            stage,
            started_at: Utc::now(),
            processed: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            rows_written: 0,
            errors: Vec::new(),
            elapsed_ms: 0,
            error_limit,
            clock: Some(Instant::now()),
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_skip(&mut self) {
        self.processed += 1;
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, failure: RowFailure) {
        self.processed += 1;
        self.failed += 1;
        if self.errors.len() < self.error_limit {
            self.errors.push(failure.to_string());
        }
    }

    pub fn add_rows_written(&mut self, rows: u64) {
        self.rows_written += rows;
    }

    pub fn finish(mut self) -> Self {
        if let Some(clock) = self.clock.take() {
            self.elapsed_ms = clock.elapsed().as_millis() as u64;
        }
        self
    }

    /// True when no row failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Failures beyond the retained error messages.
    pub fn truncated_errors(&self) -> u64 {
        self.failed.saturating_sub(self.errors.len() as u64)
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] processed={} succeeded={} skipped={} failed={} rows_written={} elapsed={}ms",
            self.stage,
            self.processed,
            self.succeeded,
            self.skipped,
            self.failed,
            self.rows_written,
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_first_errors() {
        let mut report = StageReport::start(Stage::TrailingMetrics, Uuid::new_v4(), 2);
        for id in 1..=5 {
            report.record_failure(RowFailure {
                entity: "product",
                id,
                message: "bad value".into(),
            });
        }
        report.record_success();
        report.record_skip();
        let report = report.finish();

        assert_eq!(report.processed, 7);
        assert_eq!(report.failed, 5);
        assert_eq!(report.errors, vec!["product 1: bad value", "product 2: bad value"]);
        assert_eq!(report.truncated_errors(), 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn stage_names_are_kebab_case() {
        assert_eq!(Stage::TrailingMetrics.to_string(), "trailing-metrics");
        assert_eq!(
            serde_json::to_value(Stage::BrandForecast).unwrap(),
            serde_json::json!("brand-forecast")
        );
        assert_eq!("overstock".parse::<Stage>().unwrap(), Stage::Overstock);
    }
}
