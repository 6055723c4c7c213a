//! External-scheduler adapter.
//!
//! A pipeline can be exported as a task graph: one task per node plus the
//! explicit upstream/downstream edges, serialized to JSON for whatever
//! orchestrator owns the schedule. Each scheduled task then re-enters the
//! project through [`run_single_node`], which executes exactly one node
//! against the shared filesystem catalog. Retries and backoff stay with the
//! scheduler; the task spec only carries the settings it should apply.

use crate::config::Config;
use crate::graph::{ExecutionPlan, Pipeline};
use crate::runner::{RunOptions, RunStats};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One schedulable unit of work: a single node of a named pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Scheduler-facing identifier, a hyphenated slug of the node name.
    pub task_id: String,

    /// Registry name of the pipeline the node belongs to.
    pub pipeline_name: String,

    /// Node to execute.
    pub node_name: String,

    /// Project root the task runs in.
    pub project_path: PathBuf,

    /// Configuration environment the task loads.
    pub env: String,

    /// Configuration source directory.
    pub conf_source: PathBuf,

    /// Retries the scheduler should apply.
    pub retries: usize,

    /// Delay between retries, in seconds.
    pub retry_delay_secs: u64,
}

/// A whole pipeline flattened into scheduler tasks and dependency edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskGraph {
    pub dag_id: String,
    pub schedule: String,
    pub tasks: Vec<TaskSpec>,
    /// (upstream task_id, downstream task_id) pairs.
    pub edges: Vec<(String, String)>,
}

impl TaskGraph {
    /// Flatten a pipeline into tasks, one per node, in resolved order.
    pub fn for_pipeline(
        pipeline_name: &str,
        pipeline: &Pipeline,
        config: &Config,
    ) -> Result<Self> {
        let plan = ExecutionPlan::resolve(pipeline, None)?;

        let tasks = plan
            .nodes
            .iter()
            .map(|node| TaskSpec {
                task_id: slug(node.name()),
                pipeline_name: pipeline_name.to_string(),
                node_name: node.name().to_string(),
                project_path: config.project.path.clone(),
                env: config.scheduler.env.clone(),
                conf_source: config.scheduler.conf_source.clone(),
                retries: config.scheduler.retries,
                retry_delay_secs: config.scheduler.retry_delay_secs,
            })
            .collect::<Vec<_>>();

        let mut edges = Vec::new();
        for (i, deps) in plan.deps.iter().enumerate() {
            for &d in deps {
                edges.push((tasks[d].task_id.clone(), tasks[i].task_id.clone()));
            }
        }

        Ok(Self {
            dag_id: config.scheduler.dag_id.clone(),
            schedule: config.scheduler.schedule.clone(),
            tasks,
            edges,
        })
    }

    /// Serialize to pretty JSON for the orchestrator to consume.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing task graph")
    }
}

/// Scheduler-safe task identifier.
fn slug(node_name: &str) -> String {
    node_name.replace('_', "-")
}

/// Run exactly one node of a registered pipeline, as a scheduled task does.
///
/// Upstream tasks are expected to have materialized the node's inputs in the
/// shared catalog already; nothing else from the pipeline runs.
pub async fn run_single_node(
    config: &Config,
    pipeline_name: &str,
    node_name: &str,
) -> Result<RunStats> {
    let options = RunOptions {
        nodes: Some(vec![node_name.to_string()]),
        concurrency: 1,
    };
    crate::run_pipeline(config, pipeline_name, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::register_pipelines;
    use std::collections::BTreeSet;

    #[test]
    fn test_task_graph_mirrors_dependencies() {
        let pipelines = register_pipelines().unwrap();
        let config = Config::default();
        let graph = TaskGraph::for_pipeline("train", &pipelines["train"], &config).unwrap();

        assert_eq!(graph.dag_id, "spaceflow");
        assert_eq!(graph.tasks.len(), pipelines["train"].len());

        // The model-input join waits on both preprocessing tasks.
        let incoming: BTreeSet<&str> = graph
            .edges
            .iter()
            .filter(|(_, down)| down == "create-model-input-table-node")
            .map(|(up, _)| up.as_str())
            .collect();
        assert_eq!(
            incoming,
            BTreeSet::from(["preprocess-companies-node", "preprocess-shuttles-node"])
        );

        // Training waits on the split.
        assert!(graph
            .edges
            .contains(&("split-data-node".to_string(), "train-model-node".to_string())));
    }

    #[test]
    fn test_tasks_carry_scheduler_settings() {
        let pipelines = register_pipelines().unwrap();
        let mut config = Config::default();
        config.scheduler.retries = 2;
        config.scheduler.env = "prod".to_string();

        let graph =
            TaskGraph::for_pipeline("reporting", &pipelines["reporting"], &config).unwrap();
        for task in &graph.tasks {
            assert_eq!(task.retries, 2);
            assert_eq!(task.env, "prod");
            assert_eq!(task.pipeline_name, "reporting");
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let pipelines = register_pipelines().unwrap();
        let config = Config::default();
        let graph =
            TaskGraph::for_pipeline("__default__", &pipelines["__default__"], &config).unwrap();

        let parsed: TaskGraph = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
        assert_eq!(parsed, graph);
    }
}
