//! Named control-flow combinators over a structural [`Flow`] contract.
//!
//! A flow is a composable graph region exposing attachable input and output
//! points. Combinators nest: guards on attach points are ANDed as structure
//! wraps structure, and everything materializes into the same
//! [`GraphBuilder`] the other layers use.

mod sequence;
mod switch;
mod while_loop;

pub use sequence::Sequence;
pub use switch::Switch;
pub use while_loop::While;

use weft_core::{Condition, Result, Step, WeftError};
use weft_engine::ExecutableGraph;

use crate::builder::GraphBuilder;

/// A point where edges can attach to a flow: a node name plus an optional
/// guard carried onto any edge wired through it.
#[derive(Debug, Clone)]
pub struct AttachPoint {
    pub node: String,
    pub guard: Option<Condition>,
}

impl AttachPoint {
    pub fn plain(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            guard: None,
        }
    }

    pub fn guarded(node: impl Into<String>, guard: Condition) -> Self {
        Self {
            node: node.into(),
            guard: Some(guard),
        }
    }

    /// AND another guard onto this point (nesting semantics).
    pub fn and_guard(mut self, guard: &Condition) -> Self {
        self.guard = Some(match &self.guard {
            Some(existing) => guard.and(existing),
            None => guard.clone(),
        });
        self
    }
}

/// Combine the guards of an output point and an input point into one edge
/// condition.
pub(crate) fn combine(a: &Option<Condition>, b: &Option<Condition>) -> Option<Condition> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.and(b)),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}

/// The structural contract every combinator satisfies.
pub trait Flow {
    /// Attachment points through which control enters this flow.
    fn inputs(&self) -> Vec<AttachPoint>;

    /// Attachment points through which control leaves this flow.
    fn outputs(&self) -> Vec<AttachPoint>;

    /// Create this flow's nodes and internal edges in the builder.
    ///
    /// Returns true when any node was newly created. Materializing the same
    /// structure again is a no-op — inter-flow wiring keys off this flag,
    /// which keeps repeated materialization idempotent.
    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool>;
}

/// A single step is a leaf flow: one node, entered and left unguarded.
impl Flow for Step {
    fn inputs(&self) -> Vec<AttachPoint> {
        vec![AttachPoint::plain(self.name())]
    }

    fn outputs(&self) -> Vec<AttachPoint> {
        vec![AttachPoint::plain(self.name())]
    }

    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool> {
        let (_, created) = builder.ensure_node(self);
        Ok(created)
    }
}

impl Flow for Box<dyn Flow> {
    fn inputs(&self) -> Vec<AttachPoint> {
        self.as_ref().inputs()
    }

    fn outputs(&self) -> Vec<AttachPoint> {
        self.as_ref().outputs()
    }

    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool> {
        self.as_ref().materialize(builder)
    }
}

/// Options for [`compile_with`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Node designated as the run output.
    pub output: Option<String>,
    pub strict_types: bool,
    pub check_orphans: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            output: None,
            strict_types: false,
            check_orphans: true,
        }
    }
}

impl CompileOptions {
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            output: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Compile a flow with default options.
pub fn compile(flow: &dyn Flow) -> Result<ExecutableGraph> {
    compile_with(flow, CompileOptions::default())
}

/// Materialize a flow into a fresh builder and lower it.
///
/// The flow's first input attach point becomes the start node. A guard on
/// the entry has no producing edge to live on and is not applied there;
/// guards on every interior edge apply as usual.
pub fn compile_with(flow: &dyn Flow, options: CompileOptions) -> Result<ExecutableGraph> {
    let mut builder = GraphBuilder::new();
    builder.strict_types(options.strict_types);
    builder.check_orphans(options.check_orphans);

    flow.materialize(&mut builder)?;

    let entry = flow
        .inputs()
        .into_iter()
        .next()
        .ok_or(WeftError::MissingStart)?;
    builder.set_start(&entry.node)?;

    if let Some(output) = options.output {
        builder.designate_output(output);
    }
    builder.build()
}
