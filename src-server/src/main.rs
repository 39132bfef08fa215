//! CLI entry point: serve predictions, run training, or seed the collection.

use anyhow::{Context, Result, anyhow};
use car_price_lib::{AppConfig, AppState, TrainPipeline, start_server};
use car_price_learning::CancellationToken;
use car_price_processing::DocumentSource;
use car_price_processing::io::read_csv;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Car price training pipeline and prediction service",
    long_about = "Trains car price regressors from a document collection, publishes the \
                  best model to an object store and serves predictions over HTTP.\n\n\
                  Settings are read from the environment (and a .env file); see \
                  ARTIFACTS_DIR, SCHEMA_CONFIG, MODEL_CONFIG, DOCUMENT_STORE_DIR, \
                  OBJECT_STORE_DIR and VALIDATION_POLICY."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the prediction form and the training trigger over HTTP
    Serve {
        /// Bind address, overrides APP_HOST
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides APP_PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the training pipeline once
    Train {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a CSV file into the document collection
    Seed {
        /// CSV file with one car per row
        #[arg(long)]
        csv: PathBuf,
    },
}

/// Initialize the tracing subscriber; `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    dotenv().ok();

    let mut config = AppConfig::from_env()?;
    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let addr: SocketAddr = format!("{}:{}", config.host, config.port)
                .parse()
                .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
            start_server(addr, AppState::from_config(config)).await
        }
        Command::Train { json } => run_training(config, json).await,
        Command::Seed { csv } => seed(&config, csv).await,
    }
}

async fn run_training(config: AppConfig, json: bool) -> Result<()> {
    let state = AppState::from_config(config);
    let token = CancellationToken::new();

    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current step");
            ctrl_c_token.cancel();
        }
    });

    let pipeline = TrainPipeline::builder()
        .config(state.config.as_ref().clone())
        .document_source(state.source.clone())
        .object_store(state.store.clone())
        .model_cache(state.model_cache.clone())
        .cancellation_token(token)
        .on_progress(|update| {
            info!(
                "[{}] {:.0}% {}",
                update.stage,
                update.progress * 100.0,
                update.message
            )
        })
        .build()?;

    let run = tokio::task::spawn_blocking(move || pipeline.run()).await??;
    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    println!("Run directory:  {}", run.run_dir.display());
    println!(
        "Best model:     {} (test r2 {:.4})",
        run.trainer.best_model_name, run.trainer.best_model_score
    );
    match &run.pushed {
        Some(pushed) => println!(
            "Published to:   {}/{}",
            pushed.bucket_name, pushed.s3_model_path
        ),
        None => println!(
            "Not published:  no improvement over the current model ({:+.4})",
            run.evaluation.changed_accuracy
        ),
    }
    Ok(())
}

async fn seed(config: &AppConfig, csv: PathBuf) -> Result<()> {
    if !csv.exists() {
        return Err(anyhow!("Input file not found: {}", csv.display()));
    }
    let state = AppState::from_config(config.clone());
    let (database, collection) = (config.database_name.clone(), config.collection_name.clone());

    let inserted = tokio::task::spawn_blocking(move || -> Result<usize> {
        let df = read_csv(&csv)?;
        Ok(state.source.insert_records(&database, &collection, &df)?)
    })
    .await??;

    info!(
        "Inserted {inserted} records into {}/{}",
        config.database_name, config.collection_name
    );
    Ok(())
}
