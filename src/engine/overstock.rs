//! Overstock: on-hand stock beyond the demand covered by the near-term forecast.

use serde::Serialize;
use std::ops::AddAssign;

use crate::models::YearMonth;

/// On-hand stock of one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrentStock {
    pub units: f64,
    pub value: f64,
}

impl CurrentStock {
    /// Sum over all locations of the most recent snapshot month. Older months
    /// are ignored; no snapshots means no stock.
    pub fn from_snapshots<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = (YearMonth, i64, f64)>,
    {
        let mut latest: Option<YearMonth> = None;
        let mut stock = Self::default();
        for (month, quantity, value) in snapshots {
            match latest {
                Some(current) if month < current => continue,
                Some(current) if month == current => {
                    stock.units += quantity as f64;
                    stock.value += value;
                }
                _ => {
                    latest = Some(month);
                    stock = Self {
                        units: quantity as f64,
                        value,
                    };
                }
            }
        }
        stock
    }

    /// Cost per unit, 0 unless both units and value are positive.
    pub fn unit_cogs(&self) -> f64 {
        if self.units > 0.0 && self.value > 0.0 {
            self.value / self.units
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Overstock {
    pub units: f64,
    pub value: f64,
    pub unit_cogs: f64,
}

impl Overstock {
    /// `max(0, stock - covered_units)` valued at unit COGS. Never negative.
    pub fn evaluate(stock: &CurrentStock, covered_units: f64) -> Self {
        let units = (stock.units - covered_units).max(0.0);
        let unit_cogs = stock.unit_cogs();
        let value = if units > 0.0 { units * unit_cogs } else { 0.0 };
        Self {
            units,
            value,
            unit_cogs,
        }
    }
}

/// Stock and overstock columns rolled up from products onto a brand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StockTotals {
    pub stock_units: f64,
    pub stock_value: f64,
    pub overstock_units: f64,
    pub overstock_value: f64,
}

impl AddAssign for StockTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.stock_units += rhs.stock_units;
        self.stock_value += rhs.stock_value;
        self.overstock_units += rhs.overstock_units;
        self.overstock_value += rhs.overstock_value;
    }
}
