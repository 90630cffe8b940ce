pub mod refresh_summaries_command;
pub mod run_forecast_command;
pub mod run_overstock_command;
pub mod run_seasonality_command;
pub mod run_trailing_metrics_command;
