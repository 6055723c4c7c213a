//! Named units of computation with declared dataset inputs and outputs.

use crate::catalog::Value;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// The computation a node wraps.
///
/// Receives the node's input datasets in declaration order and returns its
/// output datasets in declaration order. Functions are pure with respect to
/// the catalog: they never read or write it directly.
pub type NodeFn = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>;

/// A named unit of computation in a pipeline.
///
/// Immutable once constructed. Two nodes are considered identical when their
/// name, inputs, and outputs all match; function bodies are not comparable.
#[derive(Clone)]
pub struct Node {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    func: NodeFn,
}

impl Node {
    /// Create a new node.
    pub fn new(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
        func: NodeFn,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            func,
        }
    }

    /// The node's unique name within a pipeline.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input dataset names, in declaration order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Output dataset names, in declaration order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// The wrapped computation.
    pub fn func(&self) -> NodeFn {
        Arc::clone(&self.func)
    }

    /// Invoke the node on resolved input values.
    ///
    /// Checks that the function returned exactly as many values as the node
    /// declares outputs; everything else passes through untouched.
    pub fn run(&self, inputs: &[Value]) -> Result<Vec<Value>> {
        anyhow::ensure!(
            inputs.len() == self.inputs.len(),
            "node `{}` expects {} inputs, got {}",
            self.name,
            self.inputs.len(),
            inputs.len()
        );
        let outputs = (self.func)(inputs)?;
        anyhow::ensure!(
            outputs.len() == self.outputs.len(),
            "node `{}` declares {} outputs but returned {}",
            self.name,
            self.outputs.len(),
            outputs.len()
        );
        Ok(outputs)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.inputs == other.inputs && self.outputs == other.outputs
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}([{}]) -> [{}]",
            self.name,
            self.inputs.join(","),
            self.outputs.join(",")
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A node that copies its first input to every output, or produces a
    /// placeholder when it has no inputs. Enough for graph-shape tests.
    pub fn stub_node(name: &str, inputs: &[&str], outputs: &[&str]) -> Node {
        let n_out = outputs.len();
        Node::new(
            name,
            inputs.iter().copied(),
            outputs.iter().copied(),
            Arc::new(move |values: &[Value]| {
                let out = values
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Value::Series(ndarray::arr1(&[1.0])));
                Ok(vec![out; n_out])
            }),
        )
    }
}
