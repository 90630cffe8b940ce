use serde::{Deserialize, Serialize};

use crate::models::calendar::{MonthWindow, YearMonth};

/// Twelve values indexed by calendar month (1 = January .. 12 = December).
///
/// Used both for raw monthly unit totals and for the normalized seasonality
/// curve of a group. Indexing is always by calendar month, never by position in
/// some window, so a window that starts in November reads months 11, 12, 1, ...
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyDistribution([f64; 12]);

impl MonthlyDistribution {
    pub fn new(values: [f64; 12]) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self([0.0; 12])
    }

    /// Value for calendar month `month` (1..=12). Out-of-range months read as 0.
    pub fn get(&self, month: u32) -> f64 {
        match month {
            1..=12 => self.0[(month - 1) as usize],
            _ => 0.0,
        }
    }

    pub fn for_month(&self, month: YearMonth) -> f64 {
        self.get(month.month())
    }

    pub fn add(&mut self, month: u32, value: f64) {
        if let 1..=12 = month {
            self.0[(month - 1) as usize] += value;
        }
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Sum of the curve over the calendar months covered by `window`.
    pub fn window_sum(&self, window: &MonthWindow) -> f64 {
        window.months().map(|m| self.for_month(m)).sum()
    }

    pub fn values(&self) -> &[f64; 12] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 12]> for MonthlyDistribution {
    fn from(values: [f64; 12]) -> Self {
        Self(values)
    }
}
