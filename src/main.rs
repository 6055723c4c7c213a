//! Spaceflow CLI
//!
//! Runs the registered shuttle-price pipelines against the configured catalog.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spaceflow::{
    build_runtime, register_pipelines, run_pipeline, tasks, Config, RunOptions, RunnerKind,
    TaskGraph,
};

#[derive(Parser)]
#[command(name = "spaceflow")]
#[command(about = "Spaceflight shuttle price pipelines", long_about = None)]
struct Cli {
    /// Path to a single configuration file (overrides --conf-source)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Configuration directory with base.yaml and per-environment overlays
    #[arg(long, default_value = "conf", global = true)]
    conf_source: PathBuf,

    /// Configuration environment overlaid on base
    #[arg(long, default_value = "local", global = true)]
    env: String,

    /// Override the runner (sequential or parallel)
    #[arg(long, global = true)]
    runner: Option<String>,

    /// Override the parallel runner's concurrency
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the default pipeline (also the default when no command is given)
    Run {
        /// Registered pipeline name
        #[arg(short, long, default_value = "__default__")]
        pipeline: String,

        /// Run only these nodes, comma-separated (no transitive closure)
        #[arg(long, value_delimiter = ',')]
        nodes: Option<Vec<String>>,
    },

    /// Run the training pipeline
    Train,

    /// Run the inference pipeline
    Inference,

    /// Run a single node of a pipeline, as a scheduled task does
    RunNode {
        /// Registered pipeline name
        #[arg(short, long)]
        pipeline: String,

        /// Node to execute
        #[arg(short, long)]
        node: String,
    },

    /// Export a pipeline as a scheduler task graph (JSON)
    ExportTasks {
        /// Registered pipeline name
        #[arg(short, long, default_value = "__default__")]
        pipeline: String,

        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration
    Validate,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "base.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        None => run_command(&config, "__default__", None),

        Some(Commands::Run { pipeline, nodes }) => run_command(&config, &pipeline, nodes),

        Some(Commands::Train) => run_command(&config, "train", None),

        Some(Commands::Inference) => run_command(&config, "inference", None),

        Some(Commands::RunNode { pipeline, node }) => {
            config.validate()?;
            let runtime = build_runtime(config.execution.worker_threads)?;
            let stats =
                runtime.block_on(async { tasks::run_single_node(&config, &pipeline, &node).await })?;
            tracing::info!("{stats}");
            Ok(())
        }

        Some(Commands::ExportTasks { pipeline, output }) => {
            export_tasks_command(&config, &pipeline, output)
        }

        Some(Commands::Validate) => {
            config.validate()?;
            println!("Configuration is valid");
            Ok(())
        }

        Some(Commands::GenerateConfig { output }) => generate_config_command(output),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(&cli.conf_source, &cli.env)?,
    };

    // Apply overrides
    if let Some(runner) = &cli.runner {
        config.execution.runner = match runner.as_str() {
            "sequential" => RunnerKind::Sequential,
            "parallel" => RunnerKind::Parallel,
            other => anyhow::bail!("unknown runner `{other}` (sequential or parallel)"),
        };
    }
    if let Some(c) = cli.concurrency {
        config.execution.concurrency = c;
    }

    Ok(config)
}

fn run_command(config: &Config, pipeline: &str, nodes: Option<Vec<String>>) -> Result<()> {
    config.validate()?;

    let options = RunOptions {
        nodes,
        concurrency: config.execution.concurrency,
    };

    let runtime = build_runtime(config.execution.worker_threads)?;
    let stats = runtime.block_on(async { run_pipeline(config, pipeline, options).await })?;
    tracing::info!("{stats}");

    Ok(())
}

fn export_tasks_command(config: &Config, pipeline_name: &str, output: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    let pipelines = register_pipelines()?;
    let pipeline = pipelines
        .get(pipeline_name)
        .ok_or_else(|| anyhow::anyhow!("no pipeline named `{pipeline_name}` is registered"))?;

    let graph = TaskGraph::for_pipeline(pipeline_name, pipeline, config)?;
    let json = graph.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Exported {} tasks to {}", graph.tasks.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    // Generate a commented YAML config
    let yaml = r#"# Spaceflow Configuration

# === PROJECT ===
project:
  name: "spaceflow"
  # Project root the exported scheduler tasks run against
  path: "."

# === DATA: Raw CSV inputs loaded into the catalog before a run ===
# Any entry left out must already be present in the catalog.
data:
  companies: "data/01_raw/companies.csv"
  shuttles: "data/01_raw/shuttles.csv"
  reviews: "data/01_raw/reviews.csv"

# === CATALOG ===
catalog:
  # Directory for the filesystem catalog. Omit to keep datasets in memory
  # (scheduled per-node runs need this set so datasets survive processes).
  dir: "data/catalog"

# === MODEL OPTIONS: Parameters for the data-science nodes ===
model_options:
  features:
    - engines
    - passenger_capacity
    - crew
    - d_check_complete
    - moon_clearance_complete
    - iata_approved
    - company_rating
    - review_scores_rating
  # Fraction of rows held out for testing
  test_size: 0.2
  # Seed for the shuffle split
  random_state: 3

# === EXECUTION ===
execution:
  # sequential or parallel
  runner: sequential
  # Max nodes in flight for the parallel runner
  concurrency: 4
  # Tokio worker threads (omit = num CPUs)
  # worker_threads: 8

# === OUTPUT ===
output:
  # Directory to export X_test.csv / y_test.csv after a training run
  # test_dir: "data/06_models"

# === SCHEDULER: Task-export settings ===
scheduler:
  dag_id: "spaceflow"
  schedule: "@once"
  # Retries the scheduler applies per task
  retries: 1
  retry_delay_secs: 300
  # Environment and conf directory each task loads
  env: "local"
  conf_source: "conf"
"#;

    std::fs::write(&output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_default() {
        // No subcommand - should default to the __default__ pipeline
        let cli = Cli::try_parse_from(["spaceflow"]);
        assert!(cli.is_ok());
        assert!(cli.unwrap().command.is_none());
    }

    #[test]
    fn test_cli_parse_run_with_nodes() {
        let cli = Cli::try_parse_from([
            "spaceflow",
            "run",
            "--pipeline",
            "train",
            "--nodes",
            "split_data_node,train_model_node",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run { pipeline, nodes }) => {
                assert_eq!(pipeline, "train");
                assert_eq!(
                    nodes,
                    Some(vec![
                        "split_data_node".to_string(),
                        "train_model_node".to_string()
                    ])
                );
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_node() {
        let cli = Cli::try_parse_from([
            "spaceflow",
            "run-node",
            "--pipeline",
            "train",
            "--node",
            "train_model_node",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_parse_overrides() {
        let cli =
            Cli::try_parse_from(["spaceflow", "--runner", "parallel", "--concurrency", "8", "train"])
                .unwrap();
        assert_eq!(cli.runner.as_deref(), Some("parallel"));
        assert_eq!(cli.concurrency, Some(8));
    }
}
