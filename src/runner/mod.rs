//! Pipeline execution against a catalog.
//!
//! Runners impose only the ordering constraint from resolution; node
//! failures are never retried or recovered here, they fail the run.

mod parallel;
mod sequential;

use crate::catalog::Catalog;
use crate::graph::{ExecutionPlan, Pipeline};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which runner executes the resolved plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    /// One node at a time, in resolved order.
    #[default]
    Sequential,
    /// Dependency-constrained execution with bounded node concurrency.
    Parallel,
}

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run only these nodes (no transitive closure). None = whole pipeline.
    pub nodes: Option<Vec<String>>,

    /// Maximum nodes in flight for the parallel runner.
    pub concurrency: usize,
}

/// Statistics from a pipeline run.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Nodes executed
    pub nodes_run: usize,

    /// Datasets written to the catalog
    pub datasets_written: usize,

    /// Wall-clock duration
    pub elapsed: Duration,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Nodes run: {}, Datasets written: {}, Elapsed: {:.2}s",
            self.nodes_run,
            self.datasets_written,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Execute a pipeline (or a node-name selection of it) against a catalog.
pub async fn run(
    kind: RunnerKind,
    pipeline: &Pipeline,
    catalog: Arc<dyn Catalog>,
    options: &RunOptions,
) -> Result<RunStats> {
    let plan = ExecutionPlan::resolve(pipeline, options.nodes.as_deref())?;

    tracing::info!(
        "Running {} nodes with the {:?} runner",
        plan.nodes.len(),
        kind
    );

    let start = Instant::now();
    let mut stats = match kind {
        RunnerKind::Sequential => sequential::run(&plan, catalog.as_ref())?,
        RunnerKind::Parallel => {
            let concurrency = options.concurrency.max(1);
            parallel::run(plan, catalog, concurrency).await?
        }
    };
    stats.elapsed = start.elapsed();

    tracing::info!("Run complete: {}", stats);
    Ok(stats)
}
