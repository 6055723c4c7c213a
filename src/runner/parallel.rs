//! Dependency-constrained execution with bounded node concurrency.
//!
//! Node functions are CPU-bound, so each runs in `spawn_blocking`. A node
//! becomes ready when all of its in-plan upstream nodes have finished; at
//! most `concurrency` nodes are in flight at once. The catalog outcome is
//! identical to the sequential runner.

use crate::catalog::{require, Catalog, Value};
use crate::graph::ExecutionPlan;
use crate::runner::RunStats;
use anyhow::{Context, Result};
use futures::future::select_all;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;

type NodeOutcome = (usize, Result<Vec<Value>>);

pub(super) async fn run(
    plan: ExecutionPlan,
    catalog: Arc<dyn Catalog>,
    concurrency: usize,
) -> Result<RunStats> {
    let n = plan.nodes.len();
    let mut remaining_deps: Vec<usize> = plan.deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, deps) in plan.deps.iter().enumerate() {
        for &d in deps {
            dependents[d].push(i);
        }
    }

    // Plan order is topological, so the initial ready queue keeps the
    // deterministic tie-break from resolution.
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| remaining_deps[i] == 0).collect();
    let mut in_flight: Vec<JoinHandle<NodeOutcome>> = Vec::new();
    let mut stats = RunStats::default();
    let mut failure: Option<anyhow::Error> = None;

    while (!ready.is_empty() || !in_flight.is_empty()) && failure.is_none() {
        // Fill the in-flight set up to the concurrency bound.
        while in_flight.len() < concurrency && failure.is_none() {
            let Some(i) = ready.pop_front() else { break };
            let node = plan.nodes[i].clone();

            tracing::info!("Running node {}", node);

            let inputs = node
                .inputs()
                .iter()
                .map(|name| require(catalog.as_ref(), name))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("resolving inputs of node `{}`", node.name()));
            match inputs {
                Ok(inputs) => in_flight.push(tokio::task::spawn_blocking(move || {
                    (i, node.run(&inputs))
                })),
                // Fall through to the drain below so in-flight tasks join.
                Err(e) => failure = Some(e),
            }
        }

        if failure.is_some() || in_flight.is_empty() {
            break;
        }

        let (joined, _idx, rest) = select_all(in_flight).await;
        in_flight = rest;

        let (i, result) = match joined.context("node task panicked") {
            Ok(outcome) => outcome,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        let node = &plan.nodes[i];
        match result {
            Ok(outputs) => {
                for (name, value) in node.outputs().iter().zip(outputs) {
                    if let Err(e) = catalog.set(name, value) {
                        failure = Some(
                            e.context(format!("writing outputs of node `{}`", node.name())),
                        );
                        break;
                    }
                    stats.datasets_written += 1;
                }
                if failure.is_some() {
                    break;
                }
                stats.nodes_run += 1;

                for &dep in &dependents[i] {
                    remaining_deps[dep] -= 1;
                    if remaining_deps[dep] == 0 {
                        ready.push_back(dep);
                    }
                }
            }
            Err(e) => {
                failure = Some(e.context(format!("node `{}` failed", node.name())));
            }
        }
    }

    // Drain whatever is still running before reporting a failure.
    for handle in in_flight {
        let _ = handle.await;
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}
