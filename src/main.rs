//! Pronosticar CLI - spend forecasting server
//!
//! # Commands
//!
//! - `serve` - Train on the dataset and start the HTTP server
//! - `train` - Train and print the evaluation report
//! - `info` - Show version info

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pronosticar::{
    api::{create_router, AppState},
    config::{ServeConfig, DEFAULT_DATA_PATH},
    dataset::Dataset,
    model::{ForestConfig, Regressor},
    train::{self, TrainingConfig},
    viz::terminal,
    ForecastContext,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pronosticar - purchases and CPA forecasts from ad spend
#[derive(Parser)]
#[command(name = "pronosticar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the dataset and serve forecasts over HTTP
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "PORT", default_value = "8080")]
        port: u16,

        /// CSV file with date, spend and purchases columns
        #[arg(short, long, env = "DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Maximum charts rendered at once (defaults to available cores)
        #[arg(long, env = "RENDER_CONCURRENCY")]
        render_concurrency: Option<usize>,

        /// Number of trees in the forest
        #[arg(long)]
        trees: Option<usize>,
    },
    /// Train on the dataset and print the evaluation report
    Train {
        /// CSV file with date, spend and purchases columns
        #[arg(short, long, env = "DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Number of trees in the forest
        #[arg(long)]
        trees: Option<usize>,

        /// Histogram bins for held-out errors
        #[arg(long, default_value = "8")]
        bins: usize,
    },
    /// Show version info
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pronosticar=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data,
            render_concurrency,
            trees,
        } => {
            let mut config = ServeConfig::default()
                .with_host(host)
                .with_port(port)
                .with_data_path(data)
                .with_training(training_config(trees));
            if let Some(permits) = render_concurrency {
                config = config.with_render_concurrency(permits);
            }
            serve(config).await?;
        },
        Commands::Train { data, trees, bins } => {
            run_train(&data, &training_config(trees), bins)?;
        },
        Commands::Info => {
            println!("Pronosticar v{}", pronosticar::VERSION);
            println!("Purchases and CPA forecasts from advertising spend");
            println!();
            println!("Model:");
            let forest = ForestConfig::default();
            println!(
                "  - Random forest, {} trees, min_samples_split {}, min_samples_leaf {}",
                forest.n_estimators, forest.min_samples_split, forest.min_samples_leaf
            );
            println!("  - 80/20 seeded train/test split, floored MAE");
        },
    }

    Ok(())
}

fn training_config(trees: Option<usize>) -> TrainingConfig {
    let forest = match trees {
        Some(n) => ForestConfig::default().with_n_estimators(n),
        None => ForestConfig::default(),
    };
    TrainingConfig::default().with_forest(forest)
}

async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;

    tracing::info!(path = %config.data_path.display(), "Loading dataset");
    let data_path = config.data_path.clone();
    let training = config.training;
    let context = tokio::task::spawn_blocking(move || {
        ForecastContext::bootstrap(&data_path, &training)
    })
    .await
    .context("training task panicked")?
    .with_context(|| format!("failed to train on {}", config.data_path.display()))?;

    if let Some(report) = context.report() {
        tracing::info!(
            rows = report.total_rows,
            mae = report.mae,
            duration_ms = report.duration.as_millis() as u64,
            "Model ready"
        );
    }

    let state = AppState::new(context).with_render_concurrency(config.render_concurrency);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, render_concurrency = config.render_concurrency, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

fn run_train(data: &Path, training: &TrainingConfig, bins: usize) -> anyhow::Result<()> {
    let dataset = Dataset::from_path(data)?;
    let trained = train::train(&dataset, training)?;
    let report = &trained.report;

    println!("Trained {} on {}", trained.model.name(), data.display());
    println!("{report}");

    if !report.test_errors.is_empty() {
        println!();
        println!("Held-out absolute error:");
        print!("{}", terminal::histogram(&report.test_errors, bins, 40));
        println!("  {}", terminal::sparkline(&report.test_errors, 40));
    }
    Ok(())
}
