//! Colosseum Hackathon Bot CLI
//!
//! An autonomous agent for the Colosseum hackathon: simulated trading,
//! contest engagement, and a read-only dashboard API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colosseum_bot::api::{bind_with_fallback, create_app, AppState};
use colosseum_bot::services::{with_linear_retry, RetryPolicy};
use colosseum_bot::{Config, ContestClient, Database, Orchestrator, ProjectPayload};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "colosseum-bot")]
#[command(about = "Autonomous hackathon agent with a read-only dashboard API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot loop and the dashboard API together
    Run {
        /// Seconds between cycles
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many cycles
        #[arg(short, long)]
        max_cycles: Option<u64>,
    },

    /// Serve the dashboard API only, without the bot loop
    Serve,

    /// Show trade statistics from the local store
    Stats,

    /// Push the current project profile to the contest platform and exit
    PushUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run {
            interval,
            max_cycles,
        } => run_bot(config, interval, max_cycles).await?,
        Commands::Serve => serve_api(config).await?,
        Commands::Stats => show_stats(&config).await?,
        Commands::PushUpdate => push_update(&config).await?,
    }

    Ok(())
}

/// Run the orchestrator loop and the dashboard API in one process.
/// The API outlives a bounded loop so a finished run stays inspectable.
async fn run_bot(
    mut config: Config,
    interval: Option<u64>,
    max_cycles: Option<u64>,
) -> Result<()> {
    if let Some(interval) = interval {
        config.cycle_interval_seconds = interval;
    }
    if let Some(max) = max_cycles {
        config.max_cycles = Some(max);
    }

    let db = Arc::new(Database::new(&config.database_path).await?);

    info!(
        "Starting {} (contest API: {}, advisor: {})",
        config.project.name,
        if config.contest_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        if config.advisory_api_key.is_some() {
            "enabled"
        } else {
            "fallback"
        },
    );

    let orchestrator = Orchestrator::new(config.clone(), Arc::clone(&db));
    tokio::spawn(async move {
        if let Err(e) = orchestrator.run().await {
            error!("Bot loop stopped: {:#}", e);
        }
    });

    let listener = bind_with_fallback(config.port).await?;
    let app = create_app(AppState::new(config, db));
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_api(config: Config) -> Result<()> {
    let db = Arc::new(Database::new(&config.database_path).await?);
    let listener = bind_with_fallback(config.port).await?;
    let app = create_app(AppState::new(config, db));
    axum::serve(listener, app).await?;
    Ok(())
}

async fn show_stats(config: &Config) -> Result<()> {
    let db = Database::new(&config.database_path).await?;
    let stats = db.trade_stats().await?;

    println!("\n{}", "=".repeat(50));
    println!("  TRADE STATISTICS");
    println!("{}", "=".repeat(50));
    println!("  Total trades:   {}", stats.total_trades);
    println!("  Winning trades: {}", stats.winning_trades);
    println!("  Losing trades:  {}", stats.losing_trades);
    println!("  Win rate:       {:.1}%", stats.win_rate());
    println!("  Total P&L:      {:+.6} SOL", stats.total_pnl);
    println!(
        "  Balance:        {:.6} SOL (started {:.2})",
        config.starting_balance + stats.total_pnl,
        config.starting_balance
    );
    println!("{}\n", "=".repeat(50));

    Ok(())
}

/// One-shot project update with linear-backoff retry. Unlike the loop,
/// a missing credential here is a hard failure.
async fn push_update(config: &Config) -> Result<()> {
    let contest = ContestClient::new(config);
    let payload = ProjectPayload::from_config(config);

    let project = with_linear_retry(&RetryPolicy::default(), "push-update", || async {
        contest.update_project(&payload).await.into_result()
    })
    .await?;

    info!(
        "Project updated: {} (status: {})",
        project.name.as_deref().unwrap_or(&payload.name),
        project.status.as_deref().unwrap_or("unknown"),
    );
    Ok(())
}
