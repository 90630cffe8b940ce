//! Trailing (LTM) metric aggregation.

use serde::Serialize;
use std::ops::AddAssign;

use crate::models::{MetricKind, MonthWindow, YearMonth};

/// Windows the trailing stage sums over.
#[derive(Debug, Clone, Copy)]
pub struct TrailingWindows {
    /// The 12 months ending at the last closed month.
    pub trailing: MonthWindow,
    /// The recent months the forecast run-rate is anchored on.
    pub anchor: MonthWindow,
}

/// `margin / revenue * 100`, or 0 when there is no positive revenue.
pub fn margin_pct(margin: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        margin / revenue * 100.0
    } else {
        0.0
    }
}

/// Headline metrics cached on a product or brand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrailingMetrics {
    pub revenue: f64,
    pub margin: f64,
    pub margin_pct: f64,
    pub units: f64,
    pub stock_value: f64,
    pub recent_units: f64,
    pub recent_revenue: f64,
}

impl TrailingMetrics {
    pub fn is_finite(&self) -> bool {
        [
            self.revenue,
            self.margin,
            self.margin_pct,
            self.units,
            self.stock_value,
            self.recent_units,
            self.recent_revenue,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Recomputes `margin_pct` from the (possibly summed) margin and revenue.
    pub fn with_derived_pct(mut self) -> Self {
        self.margin_pct = margin_pct(self.margin, self.revenue);
        self
    }
}

/// Summation for rollups. Percentages are never summed: callers re-derive them
/// with [`TrailingMetrics::with_derived_pct`].
impl AddAssign for TrailingMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.revenue += rhs.revenue;
        self.margin += rhs.margin;
        self.units += rhs.units;
        self.stock_value += rhs.stock_value;
        self.recent_units += rhs.recent_units;
        self.recent_revenue += rhs.recent_revenue;
    }
}

/// Per-product accumulator fed with facts and stock snapshots in any order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingAccumulator {
    revenue: f64,
    margin: f64,
    units: f64,
    stock_value: f64,
    recent_units: f64,
    recent_revenue: f64,
}

impl TrailingAccumulator {
    pub fn add_fact(&mut self, windows: &TrailingWindows, kind: MetricKind, month: YearMonth, value: f64) {
        if windows.trailing.contains(month) {
            match kind {
                MetricKind::Revenue => self.revenue += value,
                MetricKind::Margin => self.margin += value,
                MetricKind::Units => self.units += value,
            }
        }
        if windows.anchor.contains(month) {
            match kind {
                MetricKind::Revenue => self.recent_revenue += value,
                MetricKind::Units => self.recent_units += value,
                MetricKind::Margin => {}
            }
        }
    }

    /// Stock value is summed over every snapshot (all locations) in the window.
    pub fn add_stock_value(&mut self, windows: &TrailingWindows, month: YearMonth, value: f64) {
        if windows.trailing.contains(month) {
            self.stock_value += value;
        }
    }

    pub fn finish(&self) -> Result<TrailingMetrics, String> {
        let metrics = TrailingMetrics {
            revenue: self.revenue,
            margin: self.margin,
            margin_pct: 0.0,
            units: self.units,
            stock_value: self.stock_value,
            recent_units: self.recent_units,
            recent_revenue: self.recent_revenue,
        }
        .with_derived_pct();

        if metrics.is_finite() {
            Ok(metrics)
        } else {
            Err(format!("non-finite trailing metrics: {:?}", metrics))
        }
    }
}
