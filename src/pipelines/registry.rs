//! The pipeline registry: every runnable pipeline, by name.

use crate::graph::{compose, GraphError, Pipeline};
use crate::pipelines::{data_processing, data_science, reporting};
use std::collections::BTreeMap;

/// Name of the pipeline run when none is asked for.
pub const DEFAULT_PIPELINE: &str = "__default__";

/// Build the map of registered pipelines.
///
/// Composition is pure and deterministic; the map is rebuilt on each call
/// rather than cached, which keeps node closures out of global state.
pub fn register_pipelines() -> Result<BTreeMap<String, Pipeline>, GraphError> {
    let processing = data_processing::create_pipeline()?;
    let training = data_science::create_training_pipeline()?;
    let inference = data_science::create_inference_pipeline()?;
    let reporting = reporting::create_pipeline()?;

    let mut pipelines = BTreeMap::new();
    pipelines.insert(
        DEFAULT_PIPELINE.to_string(),
        processing.compose(&reporting)?,
    );
    pipelines.insert("train".to_string(), processing.compose(&training)?);
    pipelines.insert(
        "inference".to_string(),
        compose([&processing, &inference, &reporting])?,
    );
    pipelines.insert("reporting".to_string(), reporting);

    Ok(pipelines)
}
