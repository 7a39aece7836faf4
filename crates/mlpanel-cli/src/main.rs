//! mlpanel CLI: link MLflow experiments to datasets and serve the panel.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mlpanel_core::link;
use mlpanel_core::mlflow::MlflowClient;
use mlpanel_core::models::{RunConfig, DEFAULT_TRACKING_URI};
use mlpanel_core::store::RunStore;
use mlpanel_server::ServerConfig;

#[derive(Parser)]
#[command(
    name = "mlpanel",
    about = "📊 MLflow dashboards inside your dataset workspace",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the panel server for a dataset
    Serve {
        /// Dataset directory holding the linked runs
        #[arg(default_value = "datasets/quickstart")]
        dir: PathBuf,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value_t = 8000)]
        port: u16,
    },

    /// Link an MLflow experiment (and optionally one of its runs) to a dataset
    Link {
        /// MLflow experiment name
        experiment: String,

        /// MLflow run id to link beneath the experiment
        #[arg(long)]
        run_id: Option<String>,

        /// Dataset directory holding the linked runs
        #[arg(long, default_value = "datasets/quickstart")]
        dir: PathBuf,

        /// MLflow tracking server URI
        #[arg(long, default_value = DEFAULT_TRACKING_URI)]
        tracking_uri: String,
    },

    /// List the runs linked to a dataset
    Runs {
        /// Dataset directory holding the linked runs
        #[arg(default_value = "datasets/quickstart")]
        dir: PathBuf,
    },

    /// List the experiment URLs the panel would offer
    Urls {
        /// Dataset directory holding the linked runs
        #[arg(default_value = "datasets/quickstart")]
        dir: PathBuf,
    },

    /// Show the stored record of a linked run
    Info {
        /// Run key, as printed by `mlpanel runs`
        run_key: String,

        /// Dataset directory holding the linked runs
        #[arg(default_value = "datasets/quickstart")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { dir, host, port } => cmd_serve(dir, host, port).await?,
        Commands::Link {
            experiment,
            run_id,
            dir,
            tracking_uri,
        } => cmd_link(dir, experiment, run_id, tracking_uri).await?,
        Commands::Runs { dir } => cmd_runs(dir)?,
        Commands::Urls { dir } => cmd_urls(dir)?,
        Commands::Info { run_key, dir } => cmd_info(dir, run_key)?,
    }

    Ok(())
}

// ─── Command implementations ───────────────────────────────────────────────

async fn cmd_serve(dir: PathBuf, host: String, port: u16) -> Result<()> {
    println!("📊 MLflow Panel");
    println!("   Dataset: {}", dir.display());
    println!("   URL:     http://{}:{}", host, port);
    println!();

    let config = ServerConfig {
        dataset_dir: dir,
        host,
        port,
    };
    mlpanel_server::serve(config).await
}

async fn cmd_link(
    dir: PathBuf,
    experiment: String,
    run_id: Option<String>,
    tracking_uri: String,
) -> Result<()> {
    let store = RunStore::open(&dir)?;
    let client = MlflowClient::new(&tracking_uri)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Linking '{}' from {}", experiment, tracking_uri));

    let outcome = link::link_run_to_dataset(&store, &client, &experiment, run_id.as_deref()).await;
    spinner.finish_and_clear();
    outcome?;

    println!("✓ Linked experiment '{}'", experiment);
    if let Some(run_id) = run_id {
        println!("✓ Linked run {}", run_id);
    }
    Ok(())
}

fn cmd_runs(dir: PathBuf) -> Result<()> {
    let store = RunStore::open(&dir)?;
    let keys = store.list_runs()?;

    if keys.is_empty() {
        println!("No linked runs in '{}'", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Key", "Method", "Experiment", "Registered"]);

    for key in &keys {
        let record = match store.get_run_info(key) {
            Ok(record) => record,
            Err(_) => continue,
        };
        let experiment = match &record.config {
            RunConfig::MlflowExperiment(cfg) => cfg.experiment_name.clone(),
            RunConfig::MlflowRun(cfg) => format!("id {}", cfg.experiment_id),
        };
        let registered = record.timestamp.format("%Y-%m-%d %H:%M").to_string();
        table.add_row([
            key.as_str(),
            record.config.method(),
            experiment.as_str(),
            registered.as_str(),
        ]);
    }

    println!("Linked runs in: {}", dir.display());
    println!("{}", table);
    Ok(())
}

fn cmd_urls(dir: PathBuf) -> Result<()> {
    let store = RunStore::open(&dir)?;
    let urls = store.candidate_experiment_urls()?;

    if urls.is_empty() {
        println!("No experiment URLs for '{}'", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Experiment", "URL"]);
    for entry in &urls {
        table.add_row([entry.name.as_str(), entry.url.as_str()]);
    }

    println!("{}", table);
    Ok(())
}

fn cmd_info(dir: PathBuf, run_key: String) -> Result<()> {
    let store = RunStore::open(&dir)?;
    let record = store.get_run_info(&run_key)?;

    println!("Run key:    {}", record.key);
    println!("Registered: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Version:    {}", record.version);
    println!();
    println!("── Config ─────────────────────────────");
    print!("{}", serde_yaml::to_string(&record.config)?);
    Ok(())
}
