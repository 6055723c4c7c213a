//! Dependency resolution: topological ordering and node-name selection.
//!
//! An edge runs from node P to node C iff some output of P equals some input
//! of C. Inputs with no in-pipeline producer are externally supplied datasets
//! and create no edge. Ties between independent nodes are broken by insertion
//! sequence so the resolved order is deterministic.

use crate::graph::{GraphError, Node, Pipeline};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A resolved, ready-to-execute view of a pipeline.
///
/// `nodes` is in topological order; `deps[i]` holds the indices (into
/// `nodes`) of the in-plan upstream nodes of `nodes[i]`, so `deps[i]`
/// only ever references earlier positions.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub nodes: Vec<Node>,
    pub deps: Vec<Vec<usize>>,
}

impl ExecutionPlan {
    /// Resolve the full pipeline, or the given subset of node names.
    ///
    /// With a selection, exactly the named nodes run, in the full order
    /// restricted to the subset; their transitive dependencies are *not*
    /// pulled in (the catalog is expected to already hold the inputs).
    pub fn resolve(pipeline: &Pipeline, selection: Option<&[String]>) -> Result<Self, GraphError> {
        let order = topological_order(pipeline)?;

        let keep: Option<HashSet<&str>> = match selection {
            Some(names) => {
                for name in names {
                    if pipeline.get(name).is_none() {
                        return Err(GraphError::UnknownNode { name: name.clone() });
                    }
                }
                Some(names.iter().map(String::as_str).collect())
            }
            None => None,
        };

        let selected: Vec<&Node> = order
            .into_iter()
            .map(|i| &pipeline.nodes()[i])
            .filter(|n| keep.as_ref().map_or(true, |k| k.contains(n.name())))
            .collect();

        // Dependency edges restricted to the selected nodes.
        let producer_of: HashMap<&str, usize> = selected
            .iter()
            .enumerate()
            .flat_map(|(i, n)| n.outputs().iter().map(move |o| (o.as_str(), i)))
            .collect();

        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); selected.len()];
        for (i, node) in selected.iter().enumerate() {
            let mut seen = HashSet::new();
            for input in node.inputs() {
                if let Some(&p) = producer_of.get(input.as_str()) {
                    if p != i && seen.insert(p) {
                        deps[i].push(p);
                    }
                }
            }
            deps[i].sort_unstable();
        }

        Ok(Self {
            nodes: selected.into_iter().cloned().collect(),
            deps,
        })
    }

    /// Node names in execution order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }
}

/// Topologically order a pipeline's nodes, returning insertion indices.
///
/// Kahn's algorithm with a min-heap keyed on insertion index, so independent
/// nodes come out in insertion order. Fails with `CyclicPipeline` when a
/// cycle prevents every node from being placed; the error lists all nodes
/// that could not be placed (cycle members and everything downstream).
pub fn topological_order(pipeline: &Pipeline) -> Result<Vec<usize>, GraphError> {
    let nodes = pipeline.nodes();
    let producer_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .flat_map(|(i, n)| n.outputs().iter().map(move |o| (o.as_str(), i)))
        .collect();

    let mut indegree = vec![0usize; nodes.len()];
    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        let mut seen = HashSet::new();
        for input in node.inputs() {
            if let Some(&p) = producer_of.get(input.as_str()) {
                // A node may consume its own output name only through a cycle
                // with another node; a direct self-loop is also a cycle.
                if seen.insert(p) {
                    indegree[i] += 1;
                    downstream[p].push(i);
                }
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &c in &downstream[i] {
            indegree[c] -= 1;
            if indegree[c] == 0 {
                ready.push(Reverse(c));
            }
        }
    }

    if order.len() < nodes.len() {
        let placed: HashSet<usize> = order.iter().copied().collect();
        let stuck: Vec<String> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !placed.contains(i))
            .map(|(_, n)| n.name().to_string())
            .collect();
        return Err(GraphError::CyclicPipeline { nodes: stuck });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::test_support::stub_node;

    fn pipeline(nodes: Vec<Node>) -> Pipeline {
        Pipeline::new(nodes).unwrap()
    }

    #[test]
    fn test_order_respects_producers() {
        // Inserted out of dependency order on purpose.
        let p = pipeline(vec![
            stub_node("consume", &["x"], &["y"]),
            stub_node("produce", &[], &["x"]),
            stub_node("finish", &["y"], &["z"]),
        ]);

        let plan = ExecutionPlan::resolve(&p, None).unwrap();
        let names = plan.node_names();

        let pos = |n: &str| names.iter().position(|&x| x == n).unwrap();
        assert!(pos("produce") < pos("consume"));
        assert!(pos("consume") < pos("finish"));
    }

    #[test]
    fn test_independent_nodes_keep_insertion_order() {
        let p = pipeline(vec![
            stub_node("b_second", &[], &["x2"]),
            stub_node("a_first", &[], &["x1"]),
            stub_node("join", &["x1", "x2"], &["y"]),
        ]);

        let plan = ExecutionPlan::resolve(&p, None).unwrap();
        assert_eq!(plan.node_names(), vec!["b_second", "a_first", "join"]);
    }

    #[test]
    fn test_missing_producer_is_external_not_error() {
        let p = pipeline(vec![stub_node("only", &["external_dataset"], &["y"])]);

        let plan = ExecutionPlan::resolve(&p, None).unwrap();
        assert_eq!(plan.node_names(), vec!["only"]);
        assert!(plan.deps[0].is_empty());
    }

    #[test]
    fn test_cycle_is_detected() {
        // P1 -> P2 -> P3 -> back into P2's input chain via x.
        let p = pipeline(vec![
            stub_node("p1", &[], &["x"]),
            stub_node("p2", &["x", "w"], &["y"]),
            stub_node("p3", &["y"], &["w"]),
        ]);

        let err = topological_order(&p).unwrap_err();
        match err {
            GraphError::CyclicPipeline { nodes } => {
                assert!(nodes.contains(&"p2".to_string()));
                assert!(nodes.contains(&"p3".to_string()));
                assert!(!nodes.contains(&"p1".to_string()));
            }
            other => panic!("expected CyclicPipeline, got {other:?}"),
        }
    }

    #[test]
    fn test_two_node_cycle_detected() {
        // P3 closes the loop by producing a dataset P2 consumes. Writing `x`
        // from both P1 and P3 would violate single-writer, so the canonical
        // cycle uses a distinct name per producer.
        let p = pipeline(vec![
            stub_node("p2", &["x"], &["y"]),
            stub_node("p3", &["y"], &["x"]),
        ]);

        assert!(matches!(
            topological_order(&p),
            Err(GraphError::CyclicPipeline { .. })
        ));
    }

    #[test]
    fn test_selection_runs_exactly_named_nodes() {
        let p = pipeline(vec![
            stub_node("produce", &[], &["x"]),
            stub_node("consume", &["x"], &["y"]),
            stub_node("finish", &["y"], &["z"]),
        ]);

        let names = vec!["finish".to_string(), "consume".to_string()];
        let plan = ExecutionPlan::resolve(&p, Some(&names)).unwrap();

        // No transitive closure: `produce` is excluded, order preserved.
        assert_eq!(plan.node_names(), vec!["consume", "finish"]);
        assert!(plan.deps[0].is_empty());
        assert_eq!(plan.deps[1], vec![0]);
    }

    #[test]
    fn test_unknown_node_selection() {
        let p = pipeline(vec![stub_node("only", &[], &["x"])]);
        let names = vec!["missing".to_string()];

        assert_eq!(
            ExecutionPlan::resolve(&p, Some(&names)).unwrap_err(),
            GraphError::UnknownNode {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_plan_deps_reference_earlier_positions() {
        let p = pipeline(vec![
            stub_node("c", &["b_out"], &["c_out"]),
            stub_node("a", &[], &["a_out"]),
            stub_node("b", &["a_out"], &["b_out"]),
        ]);

        let plan = ExecutionPlan::resolve(&p, None).unwrap();
        for (i, deps) in plan.deps.iter().enumerate() {
            for &d in deps {
                assert!(d < i);
            }
        }
    }
}
