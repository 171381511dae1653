use std::collections::HashMap;

use weft_core::{Action, Condition};

/// An edge from its owning node to `target`.
///
/// An absent condition always matches.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub target: String,
    pub condition: Option<Condition>,
}

impl GraphEdge {
    /// Create an unconditional edge.
    pub fn always(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            condition: None,
        }
    }

    /// Create a conditional edge.
    pub fn when(target: impl Into<String>, condition: Condition) -> Self {
        Self {
            target: target.into(),
            condition: Some(condition),
        }
    }
}

/// A node in the construction-time graph.
///
/// Edges are ordered; the interpreter evaluates and fires them
/// left to right. The epsilon action, if set, is applied to the node's own
/// output when no edge matches.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub action: Action,
    pub edges: Vec<GraphEdge>,
    pub epsilon: Option<Action>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            action,
            edges: vec![],
            epsilon: None,
        }
    }

    pub fn with_edge(mut self, edge: GraphEdge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_epsilon(mut self, epsilon: Action) -> Self {
        self.epsilon = Some(epsilon);
        self
    }
}

/// The user-facing graph handed to lowering.
///
/// Mutable during construction, consumed by [`crate::lower::lower`]. The
/// `strict_types` toggle is the one graph-wide setting; it is fixed at
/// lowering time.
#[derive(Debug, Clone)]
pub struct Graph {
    pub nodes: HashMap<String, GraphNode>,
    pub start: String,
    pub output: Option<String>,
    pub strict_types: bool,
}

impl Graph {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            start: start.into(),
            output: None,
            strict_types: false,
        }
    }

    pub fn insert(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }
}
