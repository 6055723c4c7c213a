//! Pipelines: composable, insertion-ordered collections of nodes.

use crate::graph::{GraphError, Node};
use std::collections::{BTreeSet, HashMap};

/// A collection of nodes forming a dependency graph.
///
/// Nodes keep their insertion order, which breaks ties between otherwise
/// independent nodes during resolution so runs are reproducible. Invariants
/// enforced at construction:
///
/// - no two distinct nodes produce the same output dataset (single writer)
/// - no two distinct nodes share a name
///
/// Duplicate identical nodes are collapsed, so composing a pipeline with
/// itself is idempotent and composition is commutative in the node-set sense.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    nodes: Vec<Node>,
}

impl Pipeline {
    /// Build a pipeline from nodes, enforcing the structural invariants.
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Result<Self, GraphError> {
        let mut accepted: Vec<Node> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut producer_of: HashMap<String, String> = HashMap::new();

        for node in nodes {
            if let Some(&idx) = by_name.get(node.name()) {
                if accepted[idx] == node {
                    continue;
                }
                return Err(GraphError::ConflictingNodes {
                    name: node.name().to_string(),
                });
            }

            // Check-then-insert per output so a node repeating its own
            // output name is caught too.
            for output in node.outputs() {
                if let Some(first) = producer_of.get(output) {
                    return Err(GraphError::ConflictingOutputs {
                        output: output.clone(),
                        first: first.clone(),
                        second: node.name().to_string(),
                    });
                }
                producer_of.insert(output.clone(), node.name().to_string());
            }
            by_name.insert(node.name().to_string(), accepted.len());
            accepted.push(node);
        }

        Ok(Self { nodes: accepted })
    }

    /// Compose two pipelines into the union of their node sets.
    ///
    /// Fails if the union would violate the single-writer invariant or
    /// contain two different nodes with the same name.
    pub fn compose(&self, other: &Pipeline) -> Result<Pipeline, GraphError> {
        Pipeline::new(self.nodes.iter().chain(other.nodes.iter()).cloned())
    }

    /// The nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pipeline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dataset names consumed by some node but produced by none.
    ///
    /// These are expected to be supplied externally through the catalog.
    pub fn free_inputs(&self) -> BTreeSet<String> {
        let produced: BTreeSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.outputs().iter().map(String::as_str))
            .collect();

        self.nodes
            .iter()
            .flat_map(|n| n.inputs().iter())
            .filter(|name| !produced.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// All dataset names produced by this pipeline.
    pub fn all_outputs(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .flat_map(|n| n.outputs().iter().cloned())
            .collect()
    }
}

/// Compose a sequence of pipelines into one.
pub fn compose<'a>(pipelines: impl IntoIterator<Item = &'a Pipeline>) -> Result<Pipeline, GraphError> {
    let mut result = Pipeline::default();
    for p in pipelines {
        result = result.compose(p)?;
    }
    Ok(result)
}

impl PartialEq for Pipeline {
    /// Node-set equality, independent of insertion order.
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        let mut a: Vec<&Node> = self.nodes.iter().collect();
        let mut b: Vec<&Node> = other.nodes.iter().collect();
        a.sort_by_key(|n| n.name());
        b.sort_by_key(|n| n.name());
        a == b
    }
}

impl Eq for Pipeline {}
