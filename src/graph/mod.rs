//! Pipeline graph core: nodes, composition, and dependency resolution.

mod error;
mod node;
mod pipeline;
mod resolve;

pub use error::GraphError;
pub use node::{Node, NodeFn};
pub use pipeline::{compose, Pipeline};
pub use resolve::{topological_order, ExecutionPlan};
