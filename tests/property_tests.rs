//! Property-based tests for the engine's numeric invariants.

use portfolio_forecast::engine::{
    allocate, seasonality::normalize, CurrentStock, CurveOutcome, ForecastBasis, Overstock,
    Rollup,
};
use portfolio_forecast::models::{MonthWindow, MonthlyDistribution, YearMonth};
use proptest::prelude::*;

fn month_units() -> impl Strategy<Value = [f64; 12]> {
    prop::array::uniform12(0.0f64..10_000.0)
}

fn windows() -> (MonthWindow, MonthWindow) {
    let last: YearMonth = "2025-10".parse().unwrap();
    (MonthWindow::ending_at(last, 3), MonthWindow::new(last.next(), 12))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn normalized_curves_sum_to_one(units in month_units()) {
        let units = MonthlyDistribution::new(units);
        match normalize(&units) {
            CurveOutcome::Computed(curve) => {
                prop_assert!((curve.total() - 1.0).abs() < 1e-9);
                prop_assert!(curve.values().iter().all(|v| *v >= 0.0));
            }
            CurveOutcome::NoUnits => prop_assert_eq!(units.total(), 0.0),
        }
    }

    #[test]
    fn overstock_is_never_negative(
        units in -1_000i64..100_000,
        value in -10_000.0f64..1_000_000.0,
        covered in -1_000.0f64..200_000.0,
    ) {
        let stock = CurrentStock::from_snapshots(vec![("2025-10".parse().unwrap(), units, value)]);
        let overstock = Overstock::evaluate(&stock, covered);
        prop_assert!(overstock.units >= 0.0);
        prop_assert!(overstock.value >= 0.0);
        prop_assert!(overstock.unit_cogs >= 0.0);
    }

    #[test]
    fn rollup_depends_only_on_children(
        children in prop::collection::vec((prop::option::of(1i32..6), 1u32..13, -1_000i32..1_000), 0..60),
    ) {
        let rows = |rows: &[(Option<i32>, u32, i32)]| {
            rows.iter()
                .map(|(brand, month, value)| (brand.map(|b| (b, *month)), f64::from(*value)))
                .collect::<Vec<_>>()
        };
        let first = Rollup::from_children(rows(&children));
        let again = Rollup::from_children(rows(&children));
        prop_assert_eq!(&first, &again);

        let mut reversed = children.clone();
        reversed.reverse();
        let reversed = Rollup::from_children(rows(&reversed));
        // integer-valued f64 sums are exact, so order cannot matter
        prop_assert_eq!(first, reversed);
    }

    #[test]
    fn revenue_is_units_times_one_price(
        curve in month_units(),
        recent_units in 0.0f64..1_000.0,
        recent_revenue in 0.0f64..100_000.0,
        trailing_units in 0.0f64..10_000.0,
        trailing_revenue in 0.0f64..1_000_000.0,
        eol in any::<bool>(),
    ) {
        let (anchor, horizon) = windows();
        let basis = ForecastBasis {
            eol,
            curve: Some(MonthlyDistribution::new(curve)),
            recent_units,
            recent_revenue,
            trailing_units,
            trailing_revenue,
        };
        let forecast = allocate(&basis, &anchor, &horizon);
        prop_assert_eq!(forecast.months.len(), 12);
        if eol {
            prop_assert!(forecast.months.iter().all(|m| m.units == 0.0 && m.revenue == 0.0));
        }
        for month in &forecast.months {
            prop_assert!(month.units >= 0.0);
            prop_assert!((month.revenue - month.units * forecast.unit_price).abs() <= 1e-6 * month.revenue.abs().max(1.0));
        }
    }
}
