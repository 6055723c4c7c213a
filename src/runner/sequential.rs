//! One-node-at-a-time execution in resolved order.

use crate::catalog::{require, Catalog};
use crate::graph::ExecutionPlan;
use crate::runner::RunStats;
use anyhow::{Context, Result};

pub(super) fn run(plan: &ExecutionPlan, catalog: &dyn Catalog) -> Result<RunStats> {
    let mut stats = RunStats::default();

    for node in &plan.nodes {
        tracing::info!("Running node {}", node);

        let inputs = node
            .inputs()
            .iter()
            .map(|name| require(catalog, name))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("resolving inputs of node `{}`", node.name()))?;

        let outputs = node
            .run(&inputs)
            .with_context(|| format!("node `{}` failed", node.name()))?;

        for (name, value) in node.outputs().iter().zip(outputs) {
            catalog.set(name, value)?;
            stats.datasets_written += 1;
        }
        stats.nodes_run += 1;
    }

    Ok(stats)
}
