//! Seasonality curves from one reference year of unit sales.

use std::collections::{BTreeMap, HashMap};

use crate::models::{MonthWindow, MonthlyDistribution, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveOutcome {
    /// Normalized curve summing to 1.
    Computed(MonthlyDistribution),
    /// No net units in the reference year. The stored curve stays as it is.
    NoUnits,
}

/// Sums unit facts per group and calendar month.
///
/// `members` maps eligible product ids to their group; facts for any other
/// product, or outside `window`, are ignored.
pub fn group_units<I>(
    members: &HashMap<i32, i32>,
    unit_facts: I,
    window: &MonthWindow,
) -> BTreeMap<i32, MonthlyDistribution>
where
    I: IntoIterator<Item = (i32, YearMonth, f64)>,
{
    let mut units: BTreeMap<i32, MonthlyDistribution> = BTreeMap::new();
    for (product_id, month, value) in unit_facts {
        let Some(group_id) = members.get(&product_id) else {
            continue;
        };
        if !window.contains(month) {
            continue;
        }
        units
            .entry(*group_id)
            .or_insert_with(MonthlyDistribution::zeros)
            .add(month.month(), value);
    }
    units
}

/// `distribution[m] = units[m] / total`.
pub fn normalize(units: &MonthlyDistribution) -> CurveOutcome {
    let total = units.total();
    if total == 0.0 {
        return CurveOutcome::NoUnits;
    }
    CurveOutcome::Computed(MonthlyDistribution::new(units.values().map(|v| v / total)))
}
