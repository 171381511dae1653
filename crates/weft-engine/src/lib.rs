//! Low-level workflow engine: graph IR, lowering, and the frontier
//! interpreter.
//!
//! A [`graph::Graph`] of named nodes is lowered into a sealed
//! [`ExecutableGraph`] — every action wrapped in a type-checking shim, every
//! name rewritten into an internal namespace — and then run any number of
//! times. One run drains a frontier of frames level by level, firing every
//! matching edge, retrying epsilon actions at dead ends, and reporting each
//! step and transition to an optional [`Tracer`].

pub mod exec;
pub mod graph;
pub mod lower;
pub mod path;
pub mod trace;

pub use exec::{ExecutableGraph, ExecutionContext};
pub use graph::{Graph, GraphEdge, GraphNode};
pub use lower::{lower, lowered_name, public_name};
pub use path::PathId;
pub use trace::{CollectingTracer, ExecutionStep, Tracer, TransitionRecord};
