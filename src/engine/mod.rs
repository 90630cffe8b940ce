//! Deterministic numeric transformations behind every batch stage.
//!
//! Nothing in here touches the store: services load a working set, hand it to
//! these functions and write the results back.

pub mod forecast;
pub mod overstock;
pub mod rollup;
pub mod seasonality;
pub mod trailing;

pub use forecast::{allocate, ForecastBasis, ForecastMonth, ProductForecast, ZeroReason};
pub use overstock::{CurrentStock, Overstock, StockTotals};
pub use rollup::{CountingRollup, Rollup};
pub use seasonality::CurveOutcome;
pub use trailing::{TrailingAccumulator, TrailingMetrics, TrailingWindows};
