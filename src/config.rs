use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::calendar::{MonthWindow, YearMonth};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://portfolio.db?mode=rwc";
const CONFIG_DIR: &str = "config";
const DEFAULT_REFERENCE_YEAR: i32 = 2024;
const DEFAULT_LAST_CLOSED_MONTH: &str = "2025-10";
const DEFAULT_OVERSTOCK_HORIZON_MONTHS: u32 = 6;
const DEFAULT_ERROR_REPORT_LIMIT: usize = 10;
const DEFAULT_INSERT_CHUNK_SIZE: usize = 250;

/// Length of every trailing (LTM) window.
pub const TRAILING_WINDOW_MONTHS: u32 = 12;
/// Length of the recent window the run-rate is anchored on.
pub const ANCHOR_WINDOW_MONTHS: u32 = 3;
/// Number of forecast months produced per product and metric.
pub const FORECAST_HORIZON_MONTHS: u32 = 12;

/// Engine configuration: the fixed windows every batch stage works over.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Calendar year the seasonality curves are computed from
    #[serde(default = "default_reference_year")]
    #[validate(range(min = 1900, max = 9999))]
    pub reference_year: i32,

    /// Last month with complete facts (`YYYY-MM`)
    #[serde(default = "default_last_closed_month")]
    pub last_closed_month: YearMonth,

    /// Forecast months counted as covered demand when evaluating overstock
    #[serde(default = "default_overstock_horizon_months")]
    #[validate(range(min = 1, max = 12))]
    pub overstock_horizon_months: u32,

    /// Row error messages kept in a stage summary
    #[serde(default = "default_error_report_limit")]
    pub error_report_limit: usize,

    /// Rows per bulk insert statement
    #[serde(default = "default_insert_chunk_size")]
    #[validate(custom = "validate_insert_chunk_size")]
    pub insert_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            last_closed_month: default_last_closed_month(),
            overstock_horizon_months: default_overstock_horizon_months(),
            error_report_limit: default_error_report_limit(),
            insert_chunk_size: default_insert_chunk_size(),
        }
    }
}

impl EngineConfig {
    /// Calendar year of unit facts feeding the seasonality curves.
    pub fn reference_window(&self) -> MonthWindow {
        MonthWindow::calendar_year(self.reference_year)
    }

    /// The 12 months ending at the last closed month.
    pub fn trailing_window(&self) -> MonthWindow {
        MonthWindow::ending_at(self.last_closed_month, TRAILING_WINDOW_MONTHS)
    }

    /// The 3 months ending at the last closed month.
    pub fn anchor_window(&self) -> MonthWindow {
        MonthWindow::ending_at(self.last_closed_month, ANCHOR_WINDOW_MONTHS)
    }

    /// The 12 months following the last closed month.
    pub fn forecast_window(&self) -> MonthWindow {
        MonthWindow::new(self.last_closed_month.next(), FORECAST_HORIZON_MONTHS)
    }

    /// Leading forecast months compared against on-hand stock.
    pub fn overstock_window(&self) -> MonthWindow {
        self.forecast_window().take(self.overstock_horizon_months)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations before a command
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Batch engine windows and limits
    #[serde(default)]
    #[validate]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Creates a new configuration with default pool and engine settings
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: default_true_bool(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            engine: EngineConfig::default(),
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        // In-memory sqlite databases are per connection
        if self.database_url.contains("mode=memory") && self.db_max_connections != 1 {
            let mut err = ValidationError::new("db_max_connections");
            err.message = Some("in-memory sqlite requires APP__DB_MAX_CONNECTIONS=1".into());
            errors.add("db_max_connections", err);
        }

        if self.engine.reference_year > self.engine.last_closed_month.year() {
            let mut err = ValidationError::new("reference_year");
            err.message = Some("reference_year must not be after last_closed_month".into());
            errors.add("reference_year", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AppConfigError> for crate::errors::ServiceError {
    fn from(err: AppConfigError) -> Self {
        crate::errors::ServiceError::ConfigError(err.to_string())
    }
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true_bool() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    8
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_reference_year() -> i32 {
    DEFAULT_REFERENCE_YEAR
}

fn default_last_closed_month() -> YearMonth {
    YearMonth::from_parts(2025, 10)
}

fn default_overstock_horizon_months() -> u32 {
    DEFAULT_OVERSTOCK_HORIZON_MONTHS
}

fn default_error_report_limit() -> usize {
    DEFAULT_ERROR_REPORT_LIMIT
}

fn default_insert_chunk_size() -> usize {
    DEFAULT_INSERT_CHUNK_SIZE
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_insert_chunk_size(size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        let mut err = ValidationError::new("insert_chunk_size");
        err.message = Some("insert_chunk_size must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("portfolio_forecast={},portfolio_cli={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration from `./config`.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (`<dir>/default.toml`)
/// 3. Environment-specific config (`<dir>/{env}.toml`)
/// 4. Environment variables (`APP__*`, nested keys separated by `__`)
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("engine.reference_year", DEFAULT_REFERENCE_YEAR as i64)?
        .set_default("engine.last_closed_month", DEFAULT_LAST_CLOSED_MONTH)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(
        reference_year = app_config.engine.reference_year,
        last_closed_month = %app_config.engine.last_closed_month,
        "Configuration loaded successfully"
    );
    Ok(app_config)
}
