//! Construction layers over the weft engine.
//!
//! Three ways to build the same graphs, lowest to highest:
//! [`GraphBuilder`] wires named steps imperatively; the algebra layer
//! ([`start`], [`Handle::then`], [`Handle::join`], [`when`]) composes
//! handles fluently; the combinator layer ([`Sequence`], [`While`],
//! [`Switch`]) assembles structural [`Flow`]s. All of them terminate in one
//! compile call producing an [`weft_engine::ExecutableGraph`].

pub mod algebra;
pub mod builder;
pub mod combinator;

pub use algebra::{start, when, Attachment, Handle};
pub use builder::GraphBuilder;
pub use combinator::{
    compile, compile_with, AttachPoint, CompileOptions, Flow, Sequence, Switch, While,
};
