use serde::Serialize;

use crate::path::PathId;

/// Record of one completed node execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStep {
    /// Public (pre-lowering) node name.
    pub node: String,
    pub input_type: String,
    pub output_type: String,
    /// Path id of the frame that executed the node.
    pub path: PathId,
    /// How many epsilon applications it took to find an exit (0 if the
    /// first match succeeded or the node was terminal).
    pub epsilon_retries: usize,
}

/// Record of one taken transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: String,
    pub to: String,
    /// Position of the edge among its source node's outgoing edges.
    pub edge_index: usize,
    /// Whether the edge carried a condition.
    pub conditional: bool,
    /// Path id of the frame spawned by this transition.
    pub path: PathId,
}

/// Side-channel observer of a run.
///
/// Hooks are invoked synchronously as the interpreter progresses and never
/// affect control flow. Both default to no-ops so an implementation can
/// subscribe to one kind of event only.
pub trait Tracer {
    fn step_completed(&mut self, step: &ExecutionStep) {
        let _ = step;
    }

    fn transition_taken(&mut self, transition: &TransitionRecord) {
        let _ = transition;
    }
}

/// Tracer that accumulates every event, in order.
#[derive(Debug, Default)]
pub struct CollectingTracer {
    pub steps: Vec<ExecutionStep>,
    pub transitions: Vec<TransitionRecord>,
}

impl CollectingTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for CollectingTracer {
    fn step_completed(&mut self, step: &ExecutionStep) {
        self.steps.push(step.clone());
    }

    fn transition_taken(&mut self, transition: &TransitionRecord) {
        self.transitions.push(transition.clone());
    }
}

/// Tracer used when the caller supplies none.
pub(crate) struct NoopTracer;

impl Tracer for NoopTracer {}
