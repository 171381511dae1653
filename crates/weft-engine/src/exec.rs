use std::collections::HashMap;

use tracing::{debug, trace};

use weft_core::{Condition, Result, StepPayload, TypeDesc, Value, WeftError};

use crate::lower::public_name;
use crate::path::PathId;
use crate::trace::{ExecutionStep, NoopTracer, Tracer, TransitionRecord};

/// Per-run context, accumulating the structural path id.
///
/// Each branch extends a copy; an ancestor frame's context is never
/// mutated.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    path: PathId,
}

impl ExecutionContext {
    pub fn root() -> Self {
        Self {
            path: PathId::root(),
        }
    }

    pub fn branch(&self, index: usize) -> Self {
        Self {
            path: self.path.child(index),
        }
    }

    pub fn path(&self) -> &PathId {
        &self.path
    }
}

/// Wrapper installed around every action during lowering.
///
/// Unwraps the incoming payload, revalidates it in strict mode, invokes the
/// real action, and re-wraps the result tagged with the declared output
/// type (whose instance check is always eager).
#[derive(Clone)]
pub(crate) struct Shim {
    action: weft_core::Action,
}

impl Shim {
    pub(crate) fn new(action: weft_core::Action) -> Self {
        Self { action }
    }

    pub(crate) fn output(&self) -> TypeDesc {
        self.action.output()
    }

    pub(crate) fn input(&self) -> TypeDesc {
        self.action.input()
    }

    fn invoke(&self, node: &str, payload: StepPayload, strict: bool) -> Result<StepPayload> {
        if strict && payload.type_desc() != self.action.input() {
            return Err(WeftError::StrictType {
                node: node.to_string(),
                expected: self.action.input().name().to_string(),
                found: payload.type_desc().name().to_string(),
            });
        }
        let value = self.action.invoke_raw(payload.into_value()).map_err(|e| match e {
            WeftError::StepFailed { node: n, message } if n.is_empty() => WeftError::StepFailed {
                node: node.to_string(),
                message,
            },
            other => other,
        })?;
        StepPayload::with_type(self.action.output(), value)
    }
}

/// A lowered edge: target in the interpreter namespace, optional condition.
pub(crate) struct LoweredEdge {
    pub(crate) target: String,
    pub(crate) condition: Option<Condition>,
}

/// A lowered node, sealed inside an [`ExecutableGraph`].
pub(crate) struct ExecutableNode {
    pub(crate) name: String,
    pub(crate) action: Shim,
    pub(crate) edges: Vec<LoweredEdge>,
    pub(crate) epsilon: Option<Shim>,
}

/// One pending unit of work: a payload headed for a node.
struct Frame {
    node: String,
    payload: StepPayload,
    ctx: ExecutionContext,
}

/// Sealed output of lowering; one instance serves any number of
/// independent runs, concurrently if desired.
pub struct ExecutableGraph {
    nodes: HashMap<String, ExecutableNode>,
    start: String,
    input_type: TypeDesc,
    output: Option<(String, TypeDesc)>,
    strict: bool,
}

impl ExecutableGraph {
    pub(crate) fn new(
        nodes: HashMap<String, ExecutableNode>,
        start: String,
        input_type: TypeDesc,
        output: Option<(String, TypeDesc)>,
        strict: bool,
    ) -> Self {
        Self {
            nodes,
            start,
            input_type,
            output,
            strict,
        }
    }

    pub fn input_type(&self) -> TypeDesc {
        self.input_type
    }

    pub fn output_type(&self) -> Option<TypeDesc> {
        self.output.as_ref().map(|(_, ty)| *ty)
    }

    /// Public name of the designated output node, if any.
    pub fn output_node(&self) -> Option<&str> {
        self.output.as_ref().map(|(name, _)| public_name(name))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn strict_types(&self) -> bool {
        self.strict
    }

    /// Run with an already-wrapped payload, collecting the payloads of
    /// every path that reaches the designated output node.
    pub fn execute(&self, input: StepPayload) -> Result<Vec<StepPayload>> {
        self.execute_traced(input, &mut NoopTracer)
    }

    /// Same as [`execute`](Self::execute) with a tracer attached.
    ///
    /// The tracer is a pure side channel; it observes every completed step
    /// and every taken transition but never affects control flow.
    pub fn execute_traced(
        &self,
        input: StepPayload,
        tracer: &mut dyn Tracer,
    ) -> Result<Vec<StepPayload>> {
        if input.type_desc() != self.input_type {
            return Err(WeftError::InputType {
                expected: self.input_type.name().to_string(),
                found: input.type_desc().name().to_string(),
            });
        }

        let mut frontier = vec![Frame {
            node: self.start.clone(),
            payload: input,
            ctx: ExecutionContext::root(),
        }];
        let mut outputs = Vec::new();
        let mut level = 0usize;

        // Drain the whole frontier level by level; all frames at one depth
        // complete before any of their children run.
        while !frontier.is_empty() {
            trace!(level, frames = frontier.len(), "processing frontier");
            let mut next = Vec::new();
            for frame in frontier {
                self.step_frame(frame, &mut next, &mut outputs, tracer)?;
            }
            frontier = next;
            level += 1;
        }

        debug!(outputs = outputs.len(), levels = level, "run complete");
        Ok(outputs)
    }

    /// Typed convenience over [`execute`](Self::execute).
    pub fn run<I: Value, O: Value>(&self, input: I) -> Result<Vec<O>> {
        self.run_traced(input, &mut NoopTracer)
    }

    pub fn run_traced<I: Value, O: Value>(
        &self,
        input: I,
        tracer: &mut dyn Tracer,
    ) -> Result<Vec<O>> {
        if let Some((_, out_ty)) = &self.output {
            let requested = TypeDesc::of::<O>();
            if requested != *out_ty {
                return Err(WeftError::PayloadType {
                    declared: out_ty.name().to_string(),
                    actual: requested.name().to_string(),
                });
            }
        }
        let outputs = self.execute_traced(StepPayload::new(input), tracer)?;
        outputs.into_iter().map(StepPayload::downcast::<O>).collect()
    }

    fn is_output(&self, lowered: &str) -> bool {
        self.output.as_ref().is_some_and(|(name, _)| name == lowered)
    }

    fn step_frame(
        &self,
        frame: Frame,
        next: &mut Vec<Frame>,
        outputs: &mut Vec<StepPayload>,
        tracer: &mut dyn Tracer,
    ) -> Result<()> {
        let node = self
            .nodes
            .get(&frame.node)
            .ok_or_else(|| WeftError::UnknownNode(public_name(&frame.node).to_string()))?;
        let public = public_name(&node.name).to_string();
        let step_path = frame.ctx.path().clone();

        let mut output = node.action.invoke(&public, frame.payload, self.strict)?;

        // The designated output node is implicitly terminal: its payload
        // joins the run's outputs and its edges are not evaluated.
        if self.is_output(&frame.node) {
            tracer.step_completed(&ExecutionStep {
                node: public.clone(),
                input_type: node.action.input().name().to_string(),
                output_type: node.action.output().name().to_string(),
                path: step_path.clone(),
                epsilon_retries: 0,
            });
            debug!(node = %public, path = %step_path, "output node reached");
            outputs.push(output);
            return Ok(());
        }

        let mut ctx = frame.ctx;
        let mut retries = 0usize;
        let mut matched = self.matching_edges(node, &output)?;

        if matched.is_empty() {
            if let Some(eps) = &node.epsilon {
                // Epsilon retry loop: transform the node's own output until
                // an edge matches. An unchanged output is livelock — fatal
                // immediately, never capped.
                loop {
                    let candidate = eps.invoke(&public, output.clone(), self.strict)?;
                    if candidate.same_value(&output) {
                        return Err(WeftError::Livelock { node: public });
                    }
                    retries += 1;
                    ctx = ctx.branch(0);
                    output = candidate;
                    matched = self.matching_edges(node, &output)?;
                    if !matched.is_empty() {
                        trace!(node = %public, retries, "epsilon converged");
                        break;
                    }
                }
            }
        }

        tracer.step_completed(&ExecutionStep {
            node: public.clone(),
            input_type: node.action.input().name().to_string(),
            output_type: node.action.output().name().to_string(),
            path: step_path.clone(),
            epsilon_retries: retries,
        });
        debug!(node = %public, path = %step_path, retries, "step completed");

        if matched.is_empty() {
            // Terminal, non-output frame: the defined dead-end outcome.
            debug!(node = %public, path = %step_path, "terminal frame dropped");
            return Ok(());
        }

        // All matching edges fire, left to right. The last one takes the
        // payload by move; the rest clone.
        if let Some((&last_index, rest)) = matched.split_last() {
            for &edge_index in rest {
                self.fire(node, edge_index, output.clone(), &ctx, &public, next, tracer);
            }
            self.fire(node, last_index, output, &ctx, &public, next, tracer);
        }
        Ok(())
    }

    fn fire(
        &self,
        node: &ExecutableNode,
        edge_index: usize,
        payload: StepPayload,
        ctx: &ExecutionContext,
        public: &str,
        next: &mut Vec<Frame>,
        tracer: &mut dyn Tracer,
    ) {
        let edge = &node.edges[edge_index];
        let child = ctx.branch(edge_index);
        tracer.transition_taken(&TransitionRecord {
            from: public.to_string(),
            to: public_name(&edge.target).to_string(),
            edge_index,
            conditional: edge.condition.is_some(),
            path: child.path().clone(),
        });
        trace!(from = %public, to = %public_name(&edge.target), edge_index, "transition taken");
        next.push(Frame {
            node: edge.target.clone(),
            payload,
            ctx: child,
        });
    }

    fn matching_edges(&self, node: &ExecutableNode, output: &StepPayload) -> Result<Vec<usize>> {
        let mut matched = Vec::new();
        for (index, edge) in node.edges.iter().enumerate() {
            let fires = match &edge.condition {
                None => true,
                Some(cond) => cond.evaluate(output.value())?,
            };
            if fires {
                matched.push(index);
            }
        }
        Ok(matched)
    }
}
