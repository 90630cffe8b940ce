mod common;

use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use common::{ym, TestStore};
use portfolio_forecast::{
    commands::{Command, RunForecastCommand, RunPipelineCommand, RunTrailingMetricsCommand},
    entities::brand_forecast,
    errors::{ServiceError, EXIT_STAGE_FAILURE},
    events::Event,
    models::{ForecastScope, MetricKind, OverstockMode, Stage, SummaryTables, TrailingScope},
    repositories::{ForecastRepository, ForecastRow, SummaryRepository},
    services::{
        ForecastService, OverstockService, SeasonalityService, SummaryService,
        TrailingMetricsService,
    },
};
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, Statement};
use uuid::Uuid;

const TOYS_UNITS: [f64; 12] = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 30.0, 30.0, 30.0, 10.0, 10.0];
const QUIET: f64 = 10.0 / 180.0;
const PEAK: f64 = 30.0 / 180.0;
const TOYS_CURVE: [f64; 12] = [QUIET, QUIET, QUIET, QUIET, QUIET, QUIET, QUIET, PEAK, PEAK, PEAK, QUIET, QUIET];

/// Aug..Oct 2025 sales: 30 units and 300 revenue per month.
async fn recent_sales(store: &TestStore, product_id: i32) {
    for month in ["2025-08", "2025-09", "2025-10"] {
        store.fact(product_id, "NET UNITS", month, 30.0).await;
        store.fact(product_id, "net revenue", month, 300.0).await;
    }
}

async fn brand_rows(store: &TestStore) -> Vec<(i32, String, chrono::NaiveDate, f64)> {
    brand_forecast::Entity::find()
        .order_by_asc(brand_forecast::Column::BrandId)
        .order_by_asc(brand_forecast::Column::Metric)
        .order_by_asc(brand_forecast::Column::Month)
        .all(store.db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.brand_id, row.metric, row.month, row.value))
        .collect()
}

#[tokio::test]
async fn seasonality_curve_from_reference_year() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let toys = store.group("Toys").await;
    let gifts = store
        .group_with_curve("Gifts", [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .await;
    let fresh = store.group("Fresh").await;

    let active = store.product("B001", Some(brand), Some(toys), false).await;
    let retired = store.product("B002", Some(brand), Some(toys), true).await;
    let unbranded = store.product("B003", None, Some(toys), false).await;

    store.year_of_facts(active, "Net units", 2024, TOYS_UNITS).await;
    store.fact(active, "Net units", "2023-01", 999.0).await;
    store.fact(active, "Net revenue", "2024-01", 5000.0).await;
    store.fact(retired, "Net units", "2024-01", 1000.0).await;
    store.fact(unbranded, "Net units", "2024-01", 500.0).await;

    let service = SeasonalityService::new(store.db.clone(), store.engine.clone());
    let report = service.recompute(Uuid::new_v4()).await.unwrap();

    assert_eq!(report.stage, Stage::Seasonality);
    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 2);
    assert!(report.is_clean());

    let curve = store.group_row(toys).await.distribution().unwrap();
    for (i, expected) in TOYS_CURVE.iter().enumerate() {
        assert_abs_diff_eq!(curve.get(i as u32 + 1), *expected, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(curve.total(), 1.0, epsilon = 1e-9);

    // zero-unit groups keep whatever they had
    assert_eq!(store.group_row(gifts).await.month_01, Some(0.5));
    assert_eq!(store.group_row(fresh).await.distribution(), None);
}

#[tokio::test]
async fn toys_end_to_end_forecast() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let toys = store.group("Toys").await;
    let product = store.product("B001", Some(brand), Some(toys), false).await;
    store.year_of_facts(product, "Net units", 2024, TOYS_UNITS).await;
    recent_sales(&store, product).await;

    let run_id = Uuid::new_v4();
    SeasonalityService::new(store.db.clone(), store.engine.clone())
        .recompute(run_id)
        .await
        .unwrap();
    TrailingMetricsService::new(store.db.clone(), store.engine.clone())
        .recompute(TrailingScope::All, run_id)
        .await
        .unwrap();
    let reports = ForecastService::new(store.db.clone(), store.engine.clone())
        .recompute(ForecastScope::All, true, run_id)
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].stage, Stage::Forecast);
    assert_eq!(reports[0].rows_written, 24);
    assert_eq!(reports[1].stage, Stage::BrandForecast);

    let row = store.product_row(product).await;
    assert_abs_diff_eq!(row.recent_units, 90.0);
    assert_abs_diff_eq!(row.recent_revenue, 900.0);
    // Nov and Dec 2024 fall inside the trailing window too
    assert_abs_diff_eq!(row.trailing_units, 110.0);

    let points = store.product_points(product).await;
    assert_eq!(points.len(), 24);
    let value = |metric: MetricKind, month: &str| {
        points
            .iter()
            .find(|(m, at, _)| m == metric.label() && *at == ym(month))
            .map(|(_, _, v)| *v)
            .unwrap()
    };
    assert_abs_diff_eq!(value(MetricKind::Units, "2025-11"), 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(value(MetricKind::Revenue, "2025-11"), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(value(MetricKind::Units, "2026-08"), 30.0, epsilon = 1e-9);
    assert_abs_diff_eq!(value(MetricKind::Revenue, "2026-08"), 300.0, epsilon = 1e-9);
    assert!(points.iter().all(|(_, at, _)| *at >= ym("2025-11") && *at <= ym("2026-10")));

    let brand_points = brand_rows(&store).await;
    assert_eq!(brand_points.len(), 24);
    let nov_units = brand_points
        .iter()
        .find(|(_, metric, month, _)| metric == "Net units" && *month == ym("2025-11").first_day())
        .unwrap();
    assert_eq!(nov_units.0, brand);
    assert_abs_diff_eq!(nov_units.3, 10.0, epsilon = 1e-9);
}

#[tokio::test]
async fn missing_inputs_forecast_explicit_zeros() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let toys = store.group_with_curve("Toys", TOYS_CURVE).await;
    let spring = store
        .group_with_curve("Spring", [0.2, 0.2, 0.2, 0.2, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        .await;
    let uncomputed = store.group("Uncomputed").await;

    let retired = store.product("EOL", Some(brand), Some(toys), true).await;
    let ungrouped = store.product("NOGROUP", Some(brand), None, false).await;
    let zero_anchor = store.product("SPRING", Some(brand), Some(spring), false).await;
    let no_curve = store.product("NOCURVE", Some(brand), Some(uncomputed), false).await;
    for product in [retired, ungrouped, zero_anchor, no_curve] {
        recent_sales(&store, product).await;
    }

    let run_id = Uuid::new_v4();
    TrailingMetricsService::new(store.db.clone(), store.engine.clone())
        .recompute(TrailingScope::ProductsOnly, run_id)
        .await
        .unwrap();
    let reports = ForecastService::new(store.db.clone(), store.engine.clone())
        .recompute(ForecastScope::All, false, run_id)
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 4);

    for product in [retired, ungrouped, zero_anchor, no_curve] {
        let points = store.product_points(product).await;
        assert_eq!(points.len(), 24, "product {}", product);
        assert!(points.iter().all(|(_, _, v)| *v == 0.0), "product {}", product);
    }
}

#[tokio::test]
async fn price_falls_back_to_trailing_units() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let toys = store.group_with_curve("Toys", TOYS_CURVE).await;

    // sold last winter, nothing since
    let quiet = store.product("QUIET", Some(brand), Some(toys), false).await;
    store.fact(quiet, "Net units", "2024-11", 50.0).await;
    store.fact(quiet, "Net revenue", "2024-11", 1000.0).await;

    // returns outweigh sales over the anchor months
    let returned = store.product("RETURNED", Some(brand), Some(toys), false).await;
    store.fact(returned, "Net units", "2024-12", 100.0).await;
    store.fact(returned, "Net revenue", "2024-12", 2000.0).await;
    store.fact(returned, "Net units", "2025-08", 10.0).await;
    store.fact(returned, "Net revenue", "2025-08", 100.0).await;
    store.fact(returned, "Net units", "2025-09", -30.0).await;
    store.fact(returned, "Net revenue", "2025-09", -300.0).await;

    let run_id = Uuid::new_v4();
    TrailingMetricsService::new(store.db.clone(), store.engine.clone())
        .recompute(TrailingScope::ProductsOnly, run_id)
        .await
        .unwrap();
    ForecastService::new(store.db.clone(), store.engine.clone())
        .recompute(ForecastScope::All, false, run_id)
        .await
        .unwrap();

    let row = store.product_row(returned).await;
    assert_abs_diff_eq!(row.recent_units, -20.0);
    assert_abs_diff_eq!(row.trailing_units, 80.0);
    assert_abs_diff_eq!(row.trailing_revenue, 1800.0);

    for (product, price) in [(quiet, 20.0), (returned, 1800.0 / 80.0)] {
        let points = store.product_points(product).await;
        assert_eq!(points.len(), 24, "product {}", product);
        // revenue rows sort before unit rows, both by month
        let (revenue, units) = points.split_at(12);
        for (r, u) in revenue.iter().zip(units) {
            assert_eq!(r.0, MetricKind::Revenue.label());
            assert_eq!(u.0, MetricKind::Units.label());
            assert_eq!(r.1, u.1);
            assert_abs_diff_eq!(r.2, u.2 * price, epsilon = 1e-9);
        }
    }

    let returned_points = store.product_points(returned).await;
    let nov_units = returned_points
        .iter()
        .find(|(m, at, _)| m == MetricKind::Units.label() && *at == ym("2025-11"))
        .unwrap();
    // -20 units over an anchor curve mass of 0.5
    assert_abs_diff_eq!(nov_units.2, -40.0 * QUIET, epsilon = 1e-9);
    assert!(store.product_points(quiet).await.iter().all(|(_, _, v)| *v == 0.0));
}

#[tokio::test]
async fn overstock_against_six_month_forecast() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let stocked = store.product("B001", Some(brand), None, false).await;
    let empty = store.product("B002", Some(brand), None, false).await;

    store.snapshot(Some(stocked), "FBA", "2025-10", 300, 600.0).await;
    store.snapshot(Some(stocked), "WH", "2025-10", 200, 400.0).await;
    store.snapshot(Some(stocked), "FBA", "2025-09", 999, 5000.0).await;
    store.snapshot(None, "FBA", "2025-10", 50, 100.0).await;

    let horizon = store.engine.forecast_window();
    let mut rows = Vec::new();
    for (i, month) in horizon.months().enumerate() {
        for product in [stocked, empty] {
            rows.push(ForecastRow {
                entity_id: product,
                metric: MetricKind::Units,
                month,
                value: if i < 6 { 50.0 } else { 1000.0 },
            });
            rows.push(ForecastRow {
                entity_id: product,
                metric: MetricKind::Revenue,
                month,
                value: 1.0,
            });
        }
    }
    ForecastRepository::new(store.db.clone())
        .replace_product_forecasts(ForecastScope::All, rows, 7)
        .await
        .unwrap();

    let reports = OverstockService::new(store.db.clone(), store.engine.clone())
        .recompute(OverstockMode::Both, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].stage, Stage::Overstock);
    assert_eq!(reports[1].stage, Stage::BrandOverstock);

    let row = store.product_row(stocked).await;
    assert_abs_diff_eq!(row.stock_units, 500.0);
    assert_abs_diff_eq!(row.stock_value, 1000.0);
    assert_abs_diff_eq!(row.overstock_units, 200.0);
    assert_abs_diff_eq!(row.overstock_value, 400.0);

    let row = store.product_row(empty).await;
    assert_eq!(row.stock_units, 0.0);
    assert_eq!(row.overstock_units, 0.0);
    assert_eq!(row.overstock_value, 0.0);

    let brand_row = store.brand_row(brand).await;
    assert_abs_diff_eq!(brand_row.stock_units, 500.0);
    assert_abs_diff_eq!(brand_row.overstock_value, 400.0);
}

#[tokio::test]
async fn trailing_metrics_roll_up_onto_brands() {
    let store = TestStore::new().await;
    let category = store.category("Toys & Games").await;
    let brand = store.brand("Acme", Some(category)).await;
    let other = store.brand("Other", None).await;
    let p1 = store.product("B001", Some(brand), None, false).await;
    let p2 = store.product("B002", Some(brand), None, false).await;
    let p3 = store.product("B003", None, None, false).await;
    let p4 = store.product("B004", Some(other), None, false).await;

    store.fact(p1, "Net revenue", "2025-01", 1000.0).await;
    store.fact(p1, "net revenue", "2024-10", 500.0).await;
    store.fact(p1, "CM3", "2025-01", 250.0).await;
    store.fact(p1, "cm2", "2025-01", 999.0).await;
    store.fact(p1, "Net units", "2025-09", 10.0).await;
    store.fact(p2, "NET REVENUE", "2025-05", 1000.0).await;
    store.fact(p2, "cm3", "2025-05", -50.0).await;
    store.fact(p3, "Net revenue", "2025-01", 777.0).await;
    store.fact(p4, "Net revenue", "2025-02", 400.0).await;
    store.snapshot(Some(p1), "FBA", "2025-01", 10, 100.0).await;
    store.snapshot(Some(p1), "WH", "2025-01", 5, 50.0).await;
    store.snapshot(Some(p1), "FBA", "2024-01", 10, 999.0).await;

    let service = TrailingMetricsService::new(store.db.clone(), store.engine.clone());
    let run_id = Uuid::new_v4();

    let reports = service.recompute(TrailingScope::ProductsOnly, run_id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].succeeded, 3);
    assert_eq!(store.brand_row(brand).await.trailing_revenue, 0.0);

    let row = store.product_row(p1).await;
    assert_abs_diff_eq!(row.trailing_revenue, 1000.0);
    assert_abs_diff_eq!(row.trailing_margin, 250.0);
    assert_abs_diff_eq!(row.trailing_margin_pct, 25.0);
    assert_abs_diff_eq!(row.trailing_units, 10.0);
    assert_abs_diff_eq!(row.trailing_stock_value, 150.0);
    assert_abs_diff_eq!(row.recent_units, 10.0);
    assert!(row.metrics_refreshed_at.is_some());

    let row = store.product_row(p2).await;
    assert_abs_diff_eq!(row.trailing_margin_pct, -5.0);

    let row = store.product_row(p3).await;
    assert_eq!(row.trailing_revenue, 0.0);
    assert!(row.metrics_refreshed_at.is_none());

    // one brand only
    let reports = service.recompute(TrailingScope::Brand(other), run_id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stage, Stage::BrandTrailingMetrics);
    assert_eq!(reports[0].processed, 1);
    assert_abs_diff_eq!(store.brand_row(other).await.trailing_revenue, 400.0);
    assert_eq!(store.brand_row(brand).await.trailing_revenue, 0.0);

    let reports = service.recompute(TrailingScope::BrandsOnly, run_id).await.unwrap();
    assert_eq!(reports[0].processed, 2);
    let row = store.brand_row(brand).await;
    assert_abs_diff_eq!(row.trailing_revenue, 2000.0);
    assert_abs_diff_eq!(row.trailing_margin, 200.0);
    assert_abs_diff_eq!(row.trailing_margin_pct, 10.0);
    assert_abs_diff_eq!(row.trailing_stock_value, 150.0);
    assert_abs_diff_eq!(row.trailing_units, 10.0);
}

#[tokio::test]
async fn single_product_forecast_leaves_everything_else() {
    let store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    let toys = store.group_with_curve("Toys", TOYS_CURVE).await;
    let x = store.product("X", Some(brand), Some(toys), false).await;
    let y = store.product("Y", Some(brand), Some(toys), false).await;
    recent_sales(&store, x).await;
    recent_sales(&store, y).await;

    let trailing = TrailingMetricsService::new(store.db.clone(), store.engine.clone());
    let forecast = ForecastService::new(store.db.clone(), store.engine.clone());
    let run_id = Uuid::new_v4();

    trailing.recompute(TrailingScope::All, run_id).await.unwrap();
    forecast.recompute(ForecastScope::All, false, run_id).await.unwrap();
    let y_before = store.product_points(y).await;
    let x_before = store.product_points(x).await;
    let brands_before = brand_rows(&store).await;

    store.fact(x, "Net units", "2025-08", 90.0).await;
    trailing
        .recompute(TrailingScope::BrandProducts(brand), run_id)
        .await
        .unwrap();
    let reports = forecast
        .recompute(ForecastScope::Product(x), false, run_id)
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].processed, 1);

    let x_after = store.product_points(x).await;
    assert_eq!(x_after.len(), 24);
    assert!(x_after[12].2 > x_before[12].2);
    assert_eq!(store.product_points(y).await, y_before);
    assert_eq!(brand_rows(&store).await, brands_before);
}

#[tokio::test]
async fn brand_rollup_is_idempotent() {
    let store = TestStore::new().await;
    let acme = store.brand("Acme", None).await;
    let other = store.brand("Other", None).await;
    let toys = store.group_with_curve("Toys", TOYS_CURVE).await;
    for (external_id, brand) in [("A1", acme), ("A2", acme), ("O1", other)] {
        let product = store.product(external_id, Some(brand), Some(toys), false).await;
        recent_sales(&store, product).await;
    }
    // unbranded products never reach a brand
    let stray = store.product("S1", None, Some(toys), false).await;
    recent_sales(&store, stray).await;

    let run_id = Uuid::new_v4();
    TrailingMetricsService::new(store.db.clone(), store.engine.clone())
        .recompute(TrailingScope::All, run_id)
        .await
        .unwrap();
    let service = ForecastService::new(store.db.clone(), store.engine.clone());
    service.recompute(ForecastScope::All, false, run_id).await.unwrap();
    let first = brand_rows(&store).await;

    let report = service.rollup_brands(run_id).await.unwrap();
    assert_eq!(report.succeeded, 2);
    let second = brand_rows(&store).await;

    assert_eq!(first.len(), 48);
    assert_eq!(first, second);

    let product_rows = ForecastRepository::new(store.db.clone())
        .product_forecasts()
        .await
        .unwrap();
    assert_eq!(product_rows.len(), 72);
}

#[tokio::test]
async fn summaries_group_by_brand_then_category() {
    let store = TestStore::new().await;
    let category = store.category("Toys & Games").await;
    let b1 = store.brand("Acme", Some(category)).await;
    let b2 = store.brand("Bolt", Some(category)).await;
    let b3 = store.brand("Loose", None).await;
    let p1 = store.product("P1", Some(b1), None, false).await;
    let p2 = store.product("P2", Some(b1), None, false).await;
    let p3 = store.product("P3", Some(b2), None, false).await;
    let p4 = store.product("P4", Some(b3), None, false).await;
    let p5 = store.product("P5", None, None, false).await;

    store.fact(p1, "Net revenue", "2025-01", 100.0).await;
    store.fact(p2, "net revenue", "2025-01", 50.0).await;
    store.fact(p3, "Net revenue", "2025-01", 30.0).await;
    store.fact(p4, "Net revenue", "2025-01", 10.0).await;
    store.fact(p5, "Net revenue", "2025-01", 999.0).await;
    store.fact(p1, "cm3", "2025-01", 20.0).await;
    store.fact(p1, "CM1", "2025-01", 6.0).await;
    store.fact(p2, "cm1 ", "2025-01", 4.0).await;
    store.fact(p3, "Advertising spend", "2025-01", 7.0).await;
    store.fact(p5, "CM1", "2025-01", 50.0).await;

    let service = SummaryService::new(store.db.clone(), store.engine.clone());
    let reports = service
        .refresh(SummaryTables::default(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].succeeded, 8);
    // only the unbranded product's facts
    assert_eq!(reports[0].skipped, 2);

    let repo = SummaryRepository::new(store.db.clone());
    let brands = repo.brand_summaries().await.unwrap();
    assert_eq!(brands.len(), 6);
    let acme_revenue = brands
        .iter()
        .find(|r| r.brand_id == b1 && r.metric == "Net revenue")
        .unwrap();
    assert_eq!(acme_revenue.category_id, Some(category));
    assert_abs_diff_eq!(acme_revenue.total_value, 150.0);
    assert_eq!(acme_revenue.product_count, 2);
    assert!(brands.iter().any(|r| r.brand_id == b1 && r.metric == "CM3"));
    let acme_cm1 = brands
        .iter()
        .find(|r| r.brand_id == b1 && r.metric == "CM1")
        .unwrap();
    assert_abs_diff_eq!(acme_cm1.total_value, 10.0);
    assert_eq!(acme_cm1.product_count, 2);
    assert!(brands
        .iter()
        .any(|r| r.brand_id == b2 && r.metric == "Advertising spend"));
    assert!(brands.iter().any(|r| r.brand_id == b3 && r.category_id.is_none()));

    let categories = repo.category_summaries().await.unwrap();
    let mut metrics: Vec<&str> = categories.iter().map(|r| r.metric.as_str()).collect();
    metrics.sort_unstable();
    assert_eq!(metrics, vec!["Advertising spend", "CM1", "CM3", "Net revenue"]);
    let revenue = categories.iter().find(|r| r.metric == "Net revenue").unwrap();
    assert_eq!(revenue.category_id, category);
    assert_abs_diff_eq!(revenue.total_value, 180.0);
    assert_eq!(revenue.brand_count, 2);
    assert_eq!(revenue.product_count, 3);

    let reports = service
        .refresh(
            SummaryTables {
                brand: false,
                category: true,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stage, Stage::CategorySummaries);
    assert_eq!(repo.category_summaries().await.unwrap().len(), 4);
}

#[tokio::test]
async fn pipeline_runs_every_stage_in_order() {
    let mut store = TestStore::new().await;
    let category = store.category("Toys & Games").await;
    let brand = store.brand("Acme", Some(category)).await;
    let toys = store.group("Toys").await;
    let product = store.product("B001", Some(brand), Some(toys), false).await;
    store.year_of_facts(product, "Net units", 2024, TOYS_UNITS).await;
    recent_sales(&store, product).await;
    store.snapshot(Some(product), "FBA", "2025-10", 500, 1000.0).await;

    let command = RunPipelineCommand::new(store.engine.clone(), Uuid::new_v4());
    let outcome = command
        .execute(store.db.clone(), store.event_sender.clone())
        .await
        .unwrap();

    assert!(outcome.failure.is_none());
    assert_eq!(outcome.exit_code(), 0);
    let stages: Vec<Stage> = outcome.reports.iter().map(|r| r.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Seasonality,
            Stage::TrailingMetrics,
            Stage::BrandTrailingMetrics,
            Stage::Forecast,
            Stage::BrandForecast,
            Stage::Overstock,
            Stage::BrandOverstock,
            Stage::BrandSummaries,
            Stage::CategorySummaries,
        ]
    );
    assert!(outcome.reports.iter().all(|r| r.run_id == outcome.run_id));

    // Nov 2025 .. Apr 2026 covers 10 * 6 = 60 units at a unit cost of 2
    let row = store.product_row(product).await;
    assert_abs_diff_eq!(row.overstock_units, 440.0, epsilon = 1e-9);
    assert_abs_diff_eq!(row.overstock_value, 880.0, epsilon = 1e-9);

    let events = store.drain_events();
    let started = events
        .iter()
        .filter(|e| matches!(e, Event::StageStarted { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, Event::StageCompleted(_)))
        .count();
    assert_eq!(started, 5);
    assert_eq!(completed, 9);
}

#[tokio::test]
async fn pipeline_stops_at_a_fatal_stage() {
    let mut store = TestStore::new().await;
    let brand = store.brand("Acme", None).await;
    store.product("B001", Some(brand), None, false).await;

    let backend = store.db.get_database_backend();
    store
        .db
        .execute(Statement::from_string(backend, "DROP TABLE product_forecasts"))
        .await
        .unwrap();

    let outcome = RunPipelineCommand::new(store.engine.clone(), Uuid::new_v4())
        .execute(store.db.clone(), store.event_sender.clone())
        .await
        .unwrap();

    let failure = outcome.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Forecast);
    assert_eq!(outcome.exit_code(), EXIT_STAGE_FAILURE);
    assert_eq!(outcome.reports.len(), 3);

    let events = store.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::StageFailed { stage: Stage::Forecast, .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::StageStarted { stage: Stage::Overstock, .. })));
}

#[tokio::test]
async fn commands_reject_bad_scopes() {
    let mut store = TestStore::new().await;

    let result = RunForecastCommand::new(store.engine.clone(), ForecastScope::Product(0), Uuid::new_v4())
        .execute(store.db.clone(), store.event_sender.clone())
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let result = RunForecastCommand::new(store.engine.clone(), ForecastScope::Product(42), Uuid::new_v4())
        .execute(store.db.clone(), store.event_sender.clone())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
    assert!(store
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::StageFailed { stage: Stage::Forecast, .. })));

    let mut engine = store.engine.clone();
    engine.overstock_horizon_months = 13;
    let result = RunTrailingMetricsCommand::new(engine, TrailingScope::All, Uuid::new_v4())
        .execute(store.db.clone(), store.event_sender.clone())
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}
