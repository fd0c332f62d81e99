use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::RwLock;
use tracing::info;

use vigil::classify::binary::OnnxBinaryClassifier;
use vigil::classify::zero_shot::OnnxThreatClassifier;
use vigil::classify::Orchestrator;
use vigil::config::Config;
use vigil::datasets::DatasetStore;
use vigil::model_status::StatusStore;
use vigil::training::{Retrainer, TrainingStats};
use vigil::web::retrain_job::TrainingJobStatus;
use vigil::web::AppState;

/// Vigil: hybrid ML backend for malicious-text detection.
///
/// Classifies URLs, email bodies, and HTML snippets with a binary
/// malicious/benign model and a zero-shot threat-type model, keeps a scan
/// history, and exposes an admin surface for mode switching and retraining.
#[derive(Parser)]
#[command(name = "vigil", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP backend
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Initialize the database, data directory, and model status document
    Init,

    /// Download the classifier models and the trainer backbone (~400 MB)
    DownloadModel,

    /// Show system status (mode, scan count, last training run)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vigil=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_models()?;

            // Explicit initialization: schema and status document are
            // created here, never as a side effect of a read.
            let db = vigil::db::open_sqlite(&config.db_path)?;
            let status = Arc::new(StatusStore::new(config.status_path()));
            status.init()?;

            info!("Loading classifier models from {}", config.model_dir.display());
            let binary = Arc::new(OnnxBinaryClassifier::load(&config.model_dir)?);
            let multi = Arc::new(OnnxThreatClassifier::load(&config.model_dir)?);
            let orchestrator = Arc::new(Orchestrator::new(
                Arc::clone(&status),
                binary,
                multi,
            ));

            let datasets = Arc::new(DatasetStore::new(config.dataset_dir()));
            let retrainer = Arc::new(Retrainer::new(
                Arc::clone(&status),
                Arc::clone(&datasets),
                config.model_dir.clone(),
                config.metrics_path(),
            ));

            let state = AppState {
                db,
                orchestrator,
                status,
                datasets,
                retrainer,
                training_job: Arc::new(RwLock::new(TrainingJobStatus::default())),
            };

            vigil::web::run_server(state, port, &bind).await?;
        }

        Commands::Init => {
            info!("Initializing Vigil...");
            let config = Config::load()?;

            let db = vigil::db::open_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;

            std::fs::create_dir_all(config.dataset_dir())?;
            let status = StatusStore::new(config.status_path());
            status.init()?;

            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("Data directory: {}", config.data_dir.display());
            println!("\nVigil is ready. Next step: download the models");
            println!("  cargo run -- download-model");
            println!("\nThen run: cargo run -- serve");
        }

        Commands::DownloadModel => {
            let config = Config::load()?;

            println!("Downloading models...");
            println!("  Destination: {}", config.model_dir.display());

            vigil::download::download_models(&config.model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `vigil serve`.");
        }

        Commands::Status => {
            let config = Config::load()?;

            let db = vigil::db::open_sqlite(&config.db_path)?;
            let scans = db.list_scans().await?;

            let status_store = StatusStore::new(config.status_path());
            let mode = status_store.get_mode()?;
            let initialized = status_store.path().exists();

            println!("{}", "=== Vigil Status ===".bold());
            println!("  Database:       {}", config.db_path);
            println!("  Scans recorded: {}", scans.len());
            println!(
                "  Mode:           {mode}{}",
                if initialized { "" } else { " (defaults — run `vigil init`)" }
            );
            println!(
                "  Models:         {}",
                if vigil::download::inference_files_present(&config.model_dir) {
                    "downloaded".to_string()
                } else {
                    format!("{}", "missing — run `vigil download-model`".yellow())
                }
            );

            match TrainingStats::read_from(&config.metrics_path())? {
                Some(stats) => {
                    println!("  Last retrain:   {} ({})", stats.retrain_time, stats.dataset_used);
                    if let Some(m) = stats.binary_model {
                        println!(
                            "    binary: acc {:.4}  precision {:.4}  recall {:.4}  f1 {:.4}",
                            m.accuracy, m.precision, m.recall, m.f1_score
                        );
                    }
                    if let Some(m) = stats.multi_model {
                        println!(
                            "    multi:  acc {:.4}  precision {:.4}  recall {:.4}  f1 {:.4}",
                            m.accuracy, m.precision, m.recall, m.f1_score
                        );
                    }
                }
                None => println!("  Last retrain:   never"),
            }
        }
    }

    Ok(())
}
