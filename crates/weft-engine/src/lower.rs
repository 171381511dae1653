use std::collections::{HashMap, HashSet};

use tracing::debug;

use weft_core::{Result, WeftError};

use crate::exec::{ExecutableGraph, ExecutableNode, LoweredEdge, Shim};
use crate::graph::Graph;

const LOWERED_PREFIX: &str = "__weft::";

/// Rewrite a public node name into the interpreter namespace.
pub fn lowered_name(public: &str) -> String {
    format!("{LOWERED_PREFIX}{public}")
}

/// Recover the public name from a lowered one.
pub fn public_name(lowered: &str) -> &str {
    lowered.strip_prefix(LOWERED_PREFIX).unwrap_or(lowered)
}

/// Lower a construction-time graph into a sealed [`ExecutableGraph`].
///
/// Validates every declared signature, wraps each action in a payload shim,
/// and rewrites all names. Lowering is memoized per node within one pass —
/// a node is marked lowered before its edges are walked, which is what makes
/// cyclic graphs safe.
///
/// Any failed check is fatal immediately; nothing is deferred to run time
/// except the strict-mode payload revalidation.
pub fn lower(graph: &Graph) -> Result<ExecutableGraph> {
    let start = graph
        .nodes
        .get(&graph.start)
        .ok_or(WeftError::MissingStart)?;
    let input_type = start.action.input();

    // The output node is implicitly terminal; its action's output type
    // becomes the graph's output type.
    let output = match &graph.output {
        Some(name) => {
            let node = graph
                .nodes
                .get(name)
                .ok_or_else(|| WeftError::UnknownNode(name.clone()))?;
            Some((lowered_name(name), node.action.output()))
        }
        None => None,
    };

    let mut lowerer = Lowerer {
        graph,
        visited: HashSet::new(),
        lowered: HashMap::new(),
    };
    lowerer.lower_node(&graph.start)?;

    // Pick up nodes not reachable from the start (permitted when the
    // builder's orphan check is disabled). Sorted for determinism.
    let mut names: Vec<&String> = graph.nodes.keys().collect();
    names.sort();
    for name in names {
        lowerer.lower_node(name)?;
    }

    debug!(
        nodes = lowerer.lowered.len(),
        start = %graph.start,
        strict = graph.strict_types,
        "graph lowered"
    );

    Ok(ExecutableGraph::new(
        lowerer.lowered,
        lowered_name(&graph.start),
        input_type,
        output,
        graph.strict_types,
    ))
}

struct Lowerer<'g> {
    graph: &'g Graph,
    visited: HashSet<String>,
    lowered: HashMap<String, ExecutableNode>,
}

impl Lowerer<'_> {
    fn lower_node(&mut self, name: &str) -> Result<()> {
        // Memoized before the edges are walked so a cycle terminates.
        if !self.visited.insert(name.to_string()) {
            return Ok(());
        }

        let node = self
            .graph
            .nodes
            .get(name)
            .ok_or_else(|| WeftError::UnknownNode(name.to_string()))?;
        let produced = node.action.output();

        let mut edges = Vec::with_capacity(node.edges.len());
        for edge in &node.edges {
            if !self.graph.nodes.contains_key(&edge.target) {
                return Err(WeftError::UnknownNode(edge.target.clone()));
            }
            if let Some(cond) = &edge.condition {
                if cond.output() != weft_core::TypeDesc::of::<bool>() {
                    return Err(WeftError::ConditionNotBool {
                        from: name.to_string(),
                        to: edge.target.clone(),
                        found: cond.output().name().to_string(),
                    });
                }
                if cond.input() != produced {
                    return Err(WeftError::ConditionInput {
                        from: name.to_string(),
                        to: edge.target.clone(),
                        expected: cond.input().name().to_string(),
                        found: produced.name().to_string(),
                    });
                }
            }
            edges.push(LoweredEdge {
                target: lowered_name(&edge.target),
                condition: edge.condition.clone(),
            });
            self.lower_node(&edge.target)?;
        }

        let epsilon = match &node.epsilon {
            Some(eps) => {
                if eps.input() != produced || eps.output() != produced {
                    return Err(WeftError::EpsilonSignature {
                        node: name.to_string(),
                        expected: produced.name().to_string(),
                        input: eps.input().name().to_string(),
                        output: eps.output().name().to_string(),
                    });
                }
                Some(Shim::new(eps.clone()))
            }
            None => None,
        };

        debug!(node = %name, edges = edges.len(), "node lowered");
        self.lowered.insert(
            lowered_name(name),
            ExecutableNode {
                name: lowered_name(name),
                action: Shim::new(node.action.clone()),
                edges,
                epsilon,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use weft_core::{Action, Condition, TypeDesc};

    use super::*;
    use crate::graph::{GraphEdge, GraphNode};

    fn identity() -> Action {
        Action::new(|x: i64| x)
    }

    #[test]
    fn test_name_mangling_roundtrip() {
        let lowered = lowered_name("research");
        assert_ne!(lowered, "research");
        assert_eq!(public_name(&lowered), "research");
        // Unprefixed names pass through.
        assert_eq!(public_name("plain"), "plain");
    }

    #[test]
    fn test_lowering_is_idempotent_across_a_cycle() {
        let mut graph = Graph::new("a");
        graph.insert(GraphNode::new("a", identity()).with_edge(GraphEdge::always("b")));
        graph.insert(GraphNode::new("b", identity()).with_edge(GraphEdge::always("a")));

        let exe = lower(&graph).expect("cycle lowers without recursing forever");
        assert_eq!(exe.node_count(), 2);

        // A second pass over the same graph yields the same shape.
        let again = lower(&graph).unwrap();
        assert_eq!(again.node_count(), 2);
    }

    #[test]
    fn test_missing_start_node() {
        let graph = Graph::new("ghost");
        assert!(matches!(lower(&graph), Err(WeftError::MissingStart)));
    }

    #[test]
    fn test_unknown_output_node() {
        let mut graph = Graph::new("a").with_output("never-built");
        graph.insert(GraphNode::new("a", identity()));
        assert!(matches!(
            lower(&graph),
            Err(WeftError::UnknownNode(name)) if name == "never-built"
        ));
    }

    #[test]
    fn test_unknown_edge_target() {
        let mut graph = Graph::new("a");
        graph.insert(GraphNode::new("a", identity()).with_edge(GraphEdge::always("nowhere")));
        assert!(matches!(
            lower(&graph),
            Err(WeftError::UnknownNode(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn test_non_bool_condition_rejected() {
        let bogus = Condition::from_raw(
            TypeDesc::of::<i64>(),
            TypeDesc::of::<String>(),
            Arc::new(|_| Ok(true)),
        );
        let mut graph = Graph::new("a");
        graph.insert(GraphNode::new("a", identity()).with_edge(GraphEdge::when("b", bogus)));
        graph.insert(GraphNode::new("b", identity()));

        assert!(matches!(
            lower(&graph),
            Err(WeftError::ConditionNotBool { .. })
        ));
    }

    #[test]
    fn test_condition_input_must_match_source_output() {
        let wrong_input = Condition::new(|s: &String| s.is_empty());
        let mut graph = Graph::new("a");
        graph.insert(GraphNode::new("a", identity()).with_edge(GraphEdge::when("b", wrong_input)));
        graph.insert(GraphNode::new("b", identity()));

        assert!(matches!(
            lower(&graph),
            Err(WeftError::ConditionInput { .. })
        ));
    }

    #[test]
    fn test_epsilon_signature_must_close_over_output() {
        let mut graph = Graph::new("a");
        graph.insert(GraphNode::new("a", identity()).with_epsilon(Action::new(|s: String| s)));

        assert!(matches!(
            lower(&graph),
            Err(WeftError::EpsilonSignature { .. })
        ));
    }

    #[test]
    fn test_derived_types() {
        let mut graph = Graph::new("parse").with_output("render");
        graph.insert(
            GraphNode::new("parse", Action::new(|s: String| s.len() as i64))
                .with_edge(GraphEdge::always("render")),
        );
        graph.insert(GraphNode::new("render", Action::new(|n: i64| n.to_string())));

        let exe = lower(&graph).unwrap();
        assert_eq!(exe.input_type(), TypeDesc::of::<String>());
        assert_eq!(exe.output_type(), Some(TypeDesc::of::<String>()));
    }
}
