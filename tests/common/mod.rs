#![allow(dead_code)]

use std::sync::Arc;

use portfolio_forecast::{
    config::{AppConfig, EngineConfig},
    db::{self, DbPool},
    entities::{
        brand, category, financial_fact, product, seasonality_group, stock_snapshot,
    },
    events::{self, Event, EventSender},
    models::{MonthlyDistribution, YearMonth},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tokio::sync::mpsc;

pub fn ym(s: &str) -> YearMonth {
    s.parse().expect("valid year-month")
}

/// Fresh in-memory store with the schema migrated.
pub struct TestStore {
    pub db: Arc<DbPool>,
    pub engine: EngineConfig,
    pub event_sender: Arc<EventSender>,
    pub events: mpsc::Receiver<Event>,
}

impl TestStore {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations");

        let (sender, rx) = events::channel(256);
        Self {
            db: Arc::new(pool),
            engine: EngineConfig::default(),
            event_sender: Arc::new(sender),
            events: rx,
        }
    }

    /// Events published so far, without waiting.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub async fn category(&self, name: &str) -> i32 {
        category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert category")
        .id
    }

    pub async fn brand(&self, name: &str, category_id: Option<i32>) -> i32 {
        brand::ActiveModel {
            name: Set(name.to_string()),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert brand")
        .id
    }

    pub async fn group(&self, name: &str) -> i32 {
        seasonality_group::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert group")
        .id
    }

    pub async fn group_with_curve(&self, name: &str, curve: [f64; 12]) -> i32 {
        let mut model = seasonality_group::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };
        model.set_distribution(&MonthlyDistribution::new(curve));
        model
            .insert(self.db.as_ref())
            .await
            .expect("insert group")
            .id
    }

    pub async fn product(
        &self,
        external_id: &str,
        brand_id: Option<i32>,
        group_id: Option<i32>,
        eol: bool,
    ) -> i32 {
        product::ActiveModel {
            external_id: Set(external_id.to_string()),
            brand_id: Set(brand_id),
            seasonality_group_id: Set(group_id),
            eol: Set(eol),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert product")
        .id
    }

    pub async fn fact(&self, product_id: i32, metric: &str, month: &str, value: f64) {
        financial_fact::ActiveModel {
            product_id: Set(product_id),
            metric: Set(metric.to_string()),
            month: Set(ym(month).first_day()),
            value: Set(value),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert fact");
    }

    /// One fact per month of `year`, `values[0]` being January.
    pub async fn year_of_facts(&self, product_id: i32, metric: &str, year: i32, values: [f64; 12]) {
        for (i, value) in values.iter().enumerate() {
            self.fact(product_id, metric, &format!("{}-{:02}", year, i + 1), *value)
                .await;
        }
    }

    pub async fn snapshot(
        &self,
        product_id: Option<i32>,
        location: &str,
        month: &str,
        quantity: i64,
        value: f64,
    ) {
        stock_snapshot::ActiveModel {
            product_id: Set(product_id),
            location: Set(location.to_string()),
            month: Set(ym(month).first_day()),
            quantity: Set(quantity),
            unit_cost: Set(None),
            value: Set(value),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert snapshot");
    }

    pub async fn product_row(&self, id: i32) -> product::Model {
        product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .expect("query product")
            .expect("product exists")
    }

    pub async fn brand_row(&self, id: i32) -> brand::Model {
        brand::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .expect("query brand")
            .expect("brand exists")
    }

    pub async fn group_row(&self, id: i32) -> seasonality_group::Model {
        seasonality_group::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .expect("query group")
            .expect("group exists")
    }

    /// `(metric, month, value)` forecast points of one product in month order.
    pub async fn product_points(&self, product_id: i32) -> Vec<(String, YearMonth, f64)> {
        use portfolio_forecast::entities::product_forecast;

        product_forecast::Entity::find()
            .filter(product_forecast::Column::ProductId.eq(product_id))
            .order_by_asc(product_forecast::Column::Metric)
            .order_by_asc(product_forecast::Column::Month)
            .all(self.db.as_ref())
            .await
            .expect("query forecasts")
            .into_iter()
            .map(|row| (row.metric, YearMonth::from_date(row.month), row.value))
            .collect()
    }
}
