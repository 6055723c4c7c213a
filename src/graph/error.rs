//! Structural errors raised by pipeline composition and resolution.

use thiserror::Error;

/// Errors detected while composing or resolving a pipeline graph.
///
/// All of these are fatal to the call that detected them; node-function
/// failures are not represented here, they pass through to the runner
/// as ordinary `anyhow` errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Two distinct nodes declare the same output dataset.
    #[error("dataset `{output}` is produced by both `{first}` and `{second}`")]
    ConflictingOutputs {
        output: String,
        first: String,
        second: String,
    },

    /// Two distinct nodes share a name but disagree on inputs or outputs.
    #[error("node `{name}` is declared more than once with different inputs or outputs")]
    ConflictingNodes { name: String },

    /// The dependency graph contains a cycle.
    #[error("pipeline is cyclic; nodes involved in or blocked by the cycle: {}", nodes.join(", "))]
    CyclicPipeline { nodes: Vec<String> },

    /// A requested node name does not exist in the pipeline.
    #[error("node `{name}` is not in the pipeline")]
    UnknownNode { name: String },
}
