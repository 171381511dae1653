//! weft — typed workflow graphs.
//!
//! Compose computation steps into directed graphs with conditional
//! branching, looping, and multi-way switching; lower the graph into a
//! sealed executable form; run it through a frontier interpreter that fans
//! out across every matching edge and reports each step to an optional
//! tracer.
//!
//! The three construction layers (imperative [`GraphBuilder`], operator
//! algebra via [`start`]/[`Handle`], structural combinators via
//! [`Sequence`]/[`While`]/[`Switch`]) all compile to the same graph
//! primitives.
//!
//! ```
//! use weft::{start, Step};
//!
//! let inc = Step::new("inc", |x: i64| x + 1);
//! let double = Step::new("double", |x: i64| x * 2);
//!
//! let graph = start(&inc).then(&double)?.compile_output()?;
//! assert_eq!(graph.run::<i64, i64>(3)?, vec![8]);
//! # Ok::<(), weft::WeftError>(())
//! ```

pub use weft_core::{
    Action, Condition, Result, Runnable, Step, StepPayload, TypeDesc, Value, WeftError,
};
pub use weft_engine::{
    lower, lowered_name, public_name, CollectingTracer, ExecutableGraph, ExecutionContext,
    ExecutionStep, Graph, GraphEdge, GraphNode, PathId, Tracer, TransitionRecord,
};
pub use weft_flow::{
    compile, compile_with, start, when, AttachPoint, Attachment, CompileOptions, Flow,
    GraphBuilder, Handle, Sequence, Switch, While,
};
