//! The registered pipelines: data processing, data science and reporting.

pub mod data_processing;
pub mod data_science;
pub mod registry;
pub mod reporting;

pub use registry::{register_pipelines, DEFAULT_PIPELINE};

#[cfg(test)]
pub(crate) mod test_fixtures;
