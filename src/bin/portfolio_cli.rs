use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use portfolio_forecast::{
    commands::{
        Command, RefreshSummariesCommand, RunForecastCommand, RunOverstockCommand,
        RunPipelineCommand, RunSeasonalityCommand, RunTrailingMetricsCommand,
    },
    config::{self, AppConfig},
    db::{self, DbPool},
    errors::{ServiceError, EXIT_CONFIG_FAILURE, EXIT_STAGE_FAILURE},
    events::{self, EventSender},
    models::{ForecastScope, OverstockMode, StageReport, SummaryTables, TrailingScope},
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "portfolio-cli",
    about = "Seasonality, forecast and overstock batch jobs",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Print stage reports as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the schema
    Migrate,
    /// Recompute every seasonality group from the reference year
    RunSeasonality,
    /// Recompute trailing 12-month metrics
    RunTrailingMetrics(TrailingArgs),
    /// Recompute 12-month forecasts
    RunForecast(ForecastArgs),
    /// Recompute current stock and overstock
    RunOverstock(OverstockArgs),
    /// Rebuild the brand and category summary tables
    RefreshSummaries(SummaryArgs),
    /// Run every stage in order
    RunAll,
}

#[derive(Args)]
struct TrailingArgs {
    #[arg(long, value_name = "ID", help = "Roll up a single brand from its products")]
    brand_id: Option<i32>,
    #[arg(
        long,
        value_name = "ID",
        conflicts_with = "brand_id",
        help = "Recompute only the products of one brand"
    )]
    for_brand_products: Option<i32>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        conflicts_with_all = ["brand_id", "for_brand_products", "brands_only"],
        help = "Skip the brand rollup"
    )]
    products_only: bool,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        conflicts_with_all = ["brand_id", "for_brand_products"],
        help = "Only roll up brands from cached product metrics"
    )]
    brands_only: bool,
}

impl TrailingArgs {
    fn scope(&self) -> TrailingScope {
        if let Some(id) = self.brand_id {
            TrailingScope::Brand(id)
        } else if let Some(id) = self.for_brand_products {
            TrailingScope::BrandProducts(id)
        } else if self.products_only {
            TrailingScope::ProductsOnly
        } else if self.brands_only {
            TrailingScope::BrandsOnly
        } else {
            TrailingScope::All
        }
    }
}

#[derive(Args)]
struct ForecastArgs {
    #[arg(long, value_name = "ID", help = "Forecast one product and skip the brand rollup")]
    product: Option<i32>,
    #[arg(long, action = ArgAction::SetTrue, help = "Log every product's forecast basis")]
    debug: bool,
}

#[derive(Args)]
struct OverstockArgs {
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "brands_only")]
    products_only: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    brands_only: bool,
}

#[derive(Args)]
struct SummaryArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Leave the brand summary table as it is")]
    skip_brand: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Leave the category summary table as it is")]
    skip_category: bool,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    run_id: Uuid,
}

impl CliContext {
    async fn initialize(config: AppConfig) -> Result<(Self, tokio::task::JoinHandle<()>)> {
        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        db::check_connection(&db_pool)
            .await
            .context("database did not answer ping")?;
        let db = Arc::new(db_pool);

        let (event_sender, event_rx) = events::channel(config.event_channel_capacity);
        let event_loop = tokio::spawn(events::process_events(event_rx));

        Ok((
            Self {
                config,
                db,
                event_sender: Arc::new(event_sender),
                run_id: Uuid::new_v4(),
            },
            event_loop,
        ))
    }

    async fn execute<C>(&self, command: C) -> Result<C::Result>
    where
        C: Command,
    {
        let result = command
            .execute(self.db.clone(), self.event_sender.clone())
            .await?;
        Ok(result)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG_FAILURE as u8);
        }
    };
    config::init_tracing(config.log_level(), config.log_json);

    match run(cli, config).await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            let code = e
                .downcast_ref::<ServiceError>()
                .map_or(EXIT_STAGE_FAILURE, ServiceError::exit_code);
            error!(error = %format!("{:#}", e), "Run failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<i32> {
    let auto_migrate = config.auto_migrate;
    let (context, event_loop) = CliContext::initialize(config).await?;

    if matches!(cli.command, Commands::Migrate) || auto_migrate {
        db::run_migrations(&context.db)
            .await
            .context("failed to run migrations")?;
    }

    let engine = context.config.engine.clone();
    let run_id = context.run_id;
    info!(%run_id, "Starting batch run");

    let outcome = match cli.command {
        Commands::Migrate => {
            println!("Schema is up to date");
            Ok(0)
        }
        Commands::RunSeasonality => context
            .execute(RunSeasonalityCommand::new(engine, run_id))
            .await
            .and_then(|reports| print_reports(&reports, cli.json)),
        Commands::RunTrailingMetrics(args) => context
            .execute(RunTrailingMetricsCommand::new(engine, args.scope(), run_id))
            .await
            .and_then(|reports| print_reports(&reports, cli.json)),
        Commands::RunForecast(args) => {
            let scope = args.product.map_or(ForecastScope::All, ForecastScope::Product);
            context
                .execute(RunForecastCommand::new(engine, scope, run_id).with_debug(args.debug))
                .await
                .and_then(|reports| print_reports(&reports, cli.json))
        }
        Commands::RunOverstock(args) => {
            let mode = if args.products_only {
                OverstockMode::ProductsOnly
            } else if args.brands_only {
                OverstockMode::BrandsOnly
            } else {
                OverstockMode::Both
            };
            context
                .execute(RunOverstockCommand::new(engine, mode, run_id))
                .await
                .and_then(|reports| print_reports(&reports, cli.json))
        }
        Commands::RefreshSummaries(args) => {
            let tables = SummaryTables {
                brand: !args.skip_brand,
                category: !args.skip_category,
            };
            context
                .execute(RefreshSummariesCommand::new(engine, tables, run_id))
                .await
                .and_then(|reports| print_reports(&reports, cli.json))
        }
        Commands::RunAll => context
            .execute(RunPipelineCommand::new(engine, run_id))
            .await
            .and_then(|outcome| {
                if cli.json {
                    print_json(&outcome)?;
                } else {
                    print_reports(&outcome.reports, false)?;
                    if let Some(failure) = &outcome.failure {
                        println!("stopped at {}: {}", failure.stage, failure.message);
                    }
                }
                Ok(outcome.exit_code())
            }),
    };

    let CliContext {
        db, event_sender, ..
    } = context;
    drop(event_sender);
    if let Err(e) = event_loop.await {
        error!(error = %e, "Event loop ended abnormally");
    }
    if let Ok(pool) = Arc::try_unwrap(db) {
        db::close_pool(pool).await.context("failed to close pool")?;
    }

    outcome
}

fn print_reports(reports: &[StageReport], json: bool) -> Result<i32> {
    if json {
        print_json(&reports)?;
        return Ok(0);
    }
    for report in reports {
        println!("{}", report);
        for message in &report.errors {
            println!("  - {}", message);
        }
        let truncated = report.truncated_errors();
        if truncated > 0 {
            println!("  ... {} more", truncated);
        }
    }
    Ok(0)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
