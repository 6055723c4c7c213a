//! Spaceflow
//!
//! A data pipeline for predicting the price of spaceflight shuttle trips.
//! Pipelines are composed from named nodes, resolved into a deterministic
//! execution order, and run against an explicit data catalog.
//!
//! # Architecture
//!
//! - **Graph**: Node and pipeline composition with topological resolution
//! - **Catalog**: Named dataset storage, in memory or on the filesystem
//! - **Pipelines**: The registered data-processing, data-science and
//!   reporting pipelines
//! - **Runner**: Sequential and bounded-concurrency parallel execution
//! - **Tasks**: Per-node task export for an external scheduler
//!
//! # Usage
//!
//! ```no_run
//! use spaceflow::{run_pipeline, Config, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     run_pipeline(&config, "train", RunOptions::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod data;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod pipelines;
pub mod runner;
pub mod tasks;

pub use catalog::{Catalog, FsCatalog, MemoryCatalog, Value};
pub use config::{Config, ModelOptions};
pub use graph::{GraphError, Node, Pipeline};
pub use metrics::Report;
pub use model::LinearModel;
pub use pipelines::register_pipelines;
pub use runner::{RunOptions, RunStats, RunnerKind};
pub use tasks::TaskGraph;

use anyhow::{Context, Result};
use std::sync::Arc;

/// Run a registered pipeline against the configured catalog.
///
/// The catalog is filesystem-backed when `catalog.dir` is set, in-memory
/// otherwise. Model options and any configured raw CSVs are seeded before
/// the run unless the catalog already holds them.
pub async fn run_pipeline(
    config: &Config,
    pipeline_name: &str,
    options: RunOptions,
) -> Result<RunStats> {
    config.validate()?;

    let pipelines = register_pipelines()?;
    let pipeline = pipelines
        .get(pipeline_name)
        .with_context(|| format!("no pipeline named `{pipeline_name}` is registered"))?;

    let catalog: Arc<dyn Catalog> = match &config.catalog.dir {
        Some(dir) => Arc::new(FsCatalog::new(dir)?),
        None => Arc::new(MemoryCatalog::new()),
    };

    seed_catalog(config, catalog.as_ref())?;

    tracing::info!("Starting pipeline `{pipeline_name}`");
    let stats = runner::run(config.execution.runner, pipeline, catalog.clone(), &options).await?;

    export_test_split(config, catalog.as_ref())?;

    Ok(stats)
}

/// Seed model options and configured raw datasets, skipping anything the
/// catalog already holds.
fn seed_catalog(config: &Config, catalog: &dyn Catalog) -> Result<()> {
    if !catalog.contains("params:model_options")? {
        catalog.set(
            "params:model_options",
            Value::Params(config.model_options.clone()),
        )?;
    }

    let sources = [
        ("companies", &config.data.companies),
        ("shuttles", &config.data.shuttles),
        ("reviews", &config.data.reviews),
    ];
    for (name, path) in sources {
        let Some(path) = path else { continue };
        if catalog.contains(name)? {
            continue;
        }
        let table = data::csv::read_table(path)
            .with_context(|| format!("loading dataset `{name}`"))?;
        tracing::info!("Loaded `{name}`: {} rows", table.n_rows());
        catalog.set(name, Value::Table(table))?;
    }

    Ok(())
}

/// Export the held-out split as CSVs when an output directory is configured.
fn export_test_split(config: &Config, catalog: &dyn Catalog) -> Result<()> {
    let Some(dir) = &config.output.test_dir else {
        return Ok(());
    };

    let (Some(x_test), Some(y_test)) = (catalog.get("X_test")?, catalog.get("y_test")?) else {
        return Ok(());
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    data::csv::write_table(&dir.join("X_test.csv"), x_test.as_table()?)?;
    data::csv::write_series(&dir.join("y_test.csv"), "price", y_test.as_series()?)?;
    tracing::info!("Exported test split to {}", dir.display());

    Ok(())
}

/// Build a Tokio runtime with the specified configuration.
pub fn build_runtime(worker_threads: Option<usize>) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    builder.enable_all();

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::test_fixtures::{raw_companies, raw_reviews, raw_shuttles};

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.catalog.dir = Some(dir.join("catalog"));
        config.model_options.features = vec![
            "engines".to_string(),
            "passenger_capacity".to_string(),
            "crew".to_string(),
        ];
        config
    }

    fn write_fixture_csvs(config: &mut Config, dir: &std::path::Path) {
        let fixtures = [
            ("companies", raw_companies()),
            ("shuttles", raw_shuttles()),
            ("reviews", raw_reviews()),
        ];
        for (name, table) in fixtures {
            let path = dir.join(format!("{name}.csv"));
            data::csv::write_table(&path, &table).unwrap();
            match name {
                "companies" => config.data.companies = Some(path),
                "shuttles" => config.data.shuttles = Some(path),
                _ => config.data.reviews = Some(path),
            }
        }
    }

    #[tokio::test]
    async fn test_run_pipeline_from_csvs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        write_fixture_csvs(&mut config, dir.path());
        config.output.test_dir = Some(dir.path().join("out"));

        let stats = run_pipeline(&config, "train", RunOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.nodes_run, 5);
        // The filesystem catalog persists the trained model.
        let catalog = FsCatalog::new(&dir.path().join("catalog")).unwrap();
        assert!(catalog.contains("regressor").unwrap());
        // And the held-out split was exported.
        assert!(dir.path().join("out/X_test.csv").exists());
        assert!(dir.path().join("out/y_test.csv").exists());
    }

    #[tokio::test]
    async fn test_run_pipeline_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let err = run_pipeline(&config, "nope", RunOptions::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("`nope`"));
    }

    #[tokio::test]
    async fn test_scheduled_node_sequence() {
        // Drive the train pipeline one node at a time, the way an external
        // scheduler would, sharing state through the filesystem catalog.
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        write_fixture_csvs(&mut config, dir.path());

        let pipelines = register_pipelines().unwrap();
        for pipeline_name in ["train", "inference"] {
            let plan =
                crate::graph::ExecutionPlan::resolve(&pipelines[pipeline_name], None).unwrap();
            let order: Vec<String> = plan.node_names().iter().map(|n| n.to_string()).collect();

            for node in &order {
                let stats = tasks::run_single_node(&config, pipeline_name, node)
                    .await
                    .unwrap();
                assert_eq!(stats.nodes_run, 1);
            }
        }

        // Training artifacts persisted across processes feed the inference run.
        let catalog = FsCatalog::new(&dir.path().join("catalog")).unwrap();
        assert!(catalog.contains("regressor").unwrap());
        assert!(catalog.contains("metrics").unwrap());
    }
}
