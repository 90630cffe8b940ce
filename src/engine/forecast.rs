//! Forward unit and revenue allocation.
//!
//! A product's recent units are divided by the share of the seasonality curve
//! covering the same calendar months. The resulting scale factor (`run_rate`,
//! units per unit of curve mass, not an annual total) is then spread over the
//! forecast months by the curve and priced at a single unit price.

use serde::Serialize;
use strum::Display;

use crate::models::{MetricKind, MonthWindow, MonthlyDistribution, YearMonth};

/// Why a product was given an all-zero forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ZeroReason {
    EndOfLife,
    /// No group, an uncomputed curve, or a zero curve value for the anchor's
    /// first month.
    NoSeasonality,
    /// The curve mass over the anchor window is exactly zero.
    DegenerateCurve,
}

/// Everything the allocator needs to know about one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastBasis {
    pub eol: bool,
    pub curve: Option<MonthlyDistribution>,
    pub recent_units: f64,
    pub recent_revenue: f64,
    pub trailing_units: f64,
    pub trailing_revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastMonth {
    pub month: YearMonth,
    pub units: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForecast {
    pub months: Vec<ForecastMonth>,
    pub run_rate: f64,
    pub unit_price: f64,
    pub zero_reason: Option<ZeroReason>,
}

impl ProductForecast {
    /// Explicit zeros for every month, so downstream joins stay complete.
    pub fn zeros(horizon: &MonthWindow, reason: ZeroReason) -> Self {
        Self {
            months: horizon
                .months()
                .map(|month| ForecastMonth {
                    month,
                    units: 0.0,
                    revenue: 0.0,
                })
                .collect(),
            run_rate: 0.0,
            unit_price: 0.0,
            zero_reason: Some(reason),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.months
            .iter()
            .all(|m| m.units.is_finite() && m.revenue.is_finite())
    }

    /// Units forecast over the months of `window`.
    pub fn units_within(&self, window: &MonthWindow) -> f64 {
        self.months
            .iter()
            .filter(|m| window.contains(m.month))
            .map(|m| m.units)
            .sum()
    }

    /// Flattened `(metric, month, value)` points, units first then revenue.
    pub fn points(&self) -> impl Iterator<Item = (MetricKind, YearMonth, f64)> + '_ {
        let units = self.months.iter().map(|m| (MetricKind::Units, m.month, m.units));
        let revenue = self
            .months
            .iter()
            .map(|m| (MetricKind::Revenue, m.month, m.revenue));
        units.chain(revenue)
    }
}

/// Unit price: recent revenue per recent unit, else trailing revenue per
/// trailing unit when both are positive, else 0.
pub fn unit_price(recent_units: f64, recent_revenue: f64, trailing_units: f64, trailing_revenue: f64) -> f64 {
    if recent_units > 0.0 {
        recent_revenue / recent_units
    } else if trailing_units > 0.0 && trailing_revenue > 0.0 {
        trailing_revenue / trailing_units
    } else {
        0.0
    }
}

/// Allocates a product's forecast over `horizon`. The first matching case wins:
/// end-of-life, missing curve, degenerate anchor mass, then the allocation.
pub fn allocate(basis: &ForecastBasis, anchor: &MonthWindow, horizon: &MonthWindow) -> ProductForecast {
    if basis.eol {
        return ProductForecast::zeros(horizon, ZeroReason::EndOfLife);
    }

    let Some(curve) = basis.curve else {
        return ProductForecast::zeros(horizon, ZeroReason::NoSeasonality);
    };
    if curve.for_month(anchor.start()) == 0.0 {
        return ProductForecast::zeros(horizon, ZeroReason::NoSeasonality);
    }

    let anchor_mass = curve.window_sum(anchor);
    if anchor_mass == 0.0 {
        return ProductForecast::zeros(horizon, ZeroReason::DegenerateCurve);
    }

    let run_rate = basis.recent_units / anchor_mass;
    let unit_price = unit_price(
        basis.recent_units,
        basis.recent_revenue,
        basis.trailing_units,
        basis.trailing_revenue,
    );

    let months = horizon
        .months()
        .map(|month| {
            let units = curve.for_month(month) * run_rate;
            ForecastMonth {
                month,
                units,
                revenue: units * unit_price,
            }
        })
        .collect();

    ProductForecast {
        months,
        run_rate,
        unit_price,
        zero_reason: None,
    }
}
