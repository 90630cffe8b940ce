pub mod calendar;
pub mod distribution;
pub mod metric;
pub mod report;
pub mod scope;

pub use calendar::{MonthWindow, YearMonth};
pub use distribution::MonthlyDistribution;
pub use metric::{MetricKind, SummaryMetric};
pub use report::{RowFailure, Stage, StageReport};
pub use scope::{ForecastScope, OverstockMode, SummaryTables, TrailingScope};
