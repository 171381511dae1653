use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use weft_core::{Action, Condition, Result, Step, WeftError};
use weft_engine::graph::{Graph, GraphEdge, GraphNode};
use weft_engine::{lower, ExecutableGraph};

/// Imperative graph construction over named steps.
///
/// Steps map onto nodes by name, idempotently: ensuring the same step (or
/// another step with the same name) again reuses the existing node. The
/// terminal [`build`](Self::build) validates topology and invokes lowering.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    nodes: HashMap<String, GraphNode>,
    identities: HashMap<String, usize>,
    start: Option<String>,
    output: Option<String>,
    strict_types: bool,
    check_orphans: bool,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            identities: HashMap::new(),
            start: None,
            output: None,
            strict_types: false,
            check_orphans: true,
        }
    }

    /// Ensure the step's node and make it the graph's entry point.
    pub fn start_with(&mut self, step: &Step) -> String {
        let (name, _) = self.ensure_node(step);
        self.start = Some(name.clone());
        name
    }

    /// Make an already-ensured node the entry point.
    pub fn set_start(&mut self, name: &str) -> Result<()> {
        if !self.nodes.contains_key(name) {
            return Err(WeftError::UnknownNode(name.to_string()));
        }
        self.start = Some(name.to_string());
        Ok(())
    }

    /// Existing-or-new node for a step; the flag is true when the node was
    /// newly created.
    pub fn ensure_node(&mut self, step: &Step) -> (String, bool) {
        let name = step.name().to_string();
        if let Some(identity) = self.identities.get(&name) {
            if *identity != step.action().identity() {
                warn!(node = %name, "step name reused with a different action; keeping the first");
            }
            return (name, false);
        }
        debug!(node = %name, "node created");
        self.identities.insert(name.clone(), step.action().identity());
        self.nodes
            .insert(name.clone(), GraphNode::new(&name, step.action().clone()));
        (name, true)
    }

    /// Append an outgoing edge. Edge order is evaluation order.
    pub fn add_edge(&mut self, from: &str, to: &str, condition: Option<Condition>) -> Result<()> {
        if !self.nodes.contains_key(to) {
            return Err(WeftError::UnknownNode(to.to_string()));
        }
        let node = self
            .nodes
            .get_mut(from)
            .ok_or_else(|| WeftError::UnknownNode(from.to_string()))?;
        debug!(from = %from, to = %to, conditional = condition.is_some(), "edge added");
        node.edges.push(GraphEdge {
            target: to.to_string(),
            condition,
        });
        Ok(())
    }

    /// Ensure both steps and wire an edge between them.
    pub fn connect(&mut self, from: &Step, to: &Step, condition: Option<Condition>) -> Result<()> {
        let (from_name, _) = self.ensure_node(from);
        let (to_name, _) = self.ensure_node(to);
        self.add_edge(&from_name, &to_name, condition)
    }

    /// Override the node's epsilon action (applied to the node's own output
    /// when no edge matches).
    pub fn set_epsilon(&mut self, node: &str, epsilon: Action) -> Result<()> {
        let node = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| WeftError::UnknownNode(node.to_string()))?;
        node.epsilon = Some(epsilon);
        Ok(())
    }

    /// Name the node whose payloads become the run's outputs.
    ///
    /// Validated at build time, so designation and construction can happen
    /// in either order.
    pub fn designate_output(&mut self, name: impl Into<String>) {
        self.output = Some(name.into());
    }

    /// Toggle run-time payload revalidation. Fixed at lowering time.
    pub fn strict_types(&mut self, strict: bool) {
        self.strict_types = strict;
    }

    /// Toggle the reachability check performed by [`build`](Self::build).
    pub fn check_orphans(&mut self, check: bool) {
        self.check_orphans = check;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validate topology and lower into an executable graph.
    pub fn build(self) -> Result<ExecutableGraph> {
        let start = self.start.clone().ok_or(WeftError::MissingStart)?;

        if let Some(output) = &self.output {
            if !self.nodes.contains_key(output) {
                return Err(WeftError::UnknownNode(output.clone()));
            }
        }

        if self.check_orphans {
            let unreachable = self.unreachable_from(&start);
            if !unreachable.is_empty() {
                return Err(WeftError::Unreachable(unreachable));
            }
        }

        let mut graph = Graph::new(start).with_strict_types(self.strict_types);
        graph.output = self.output.clone();
        for node in self.nodes.into_values() {
            graph.insert(node);
        }
        lower(&graph)
    }

    fn unreachable_from(&self, start: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(name) = queue.pop_front() {
            if let Some(node) = self.nodes.get(name) {
                for edge in &node.edges {
                    if seen.insert(&edge.target) {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
        let mut missing: Vec<String> = self
            .nodes
            .keys()
            .filter(|name| !seen.contains(name.as_str()))
            .cloned()
            .collect();
        missing.sort();
        missing
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
