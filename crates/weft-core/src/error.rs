use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    // Signature errors (lowering time)
    #[error("condition on edge {from} -> {to} must return bool, found {found}")]
    ConditionNotBool {
        from: String,
        to: String,
        found: String,
    },

    #[error("condition on edge {from} -> {to} expects {expected}, but '{from}' produces {found}")]
    ConditionInput {
        from: String,
        to: String,
        expected: String,
        found: String,
    },

    #[error("epsilon action on node '{node}' must map {expected} to itself, found {input} -> {output}")]
    EpsilonSignature {
        node: String,
        expected: String,
        input: String,
        output: String,
    },

    // Payload errors
    #[error("payload type mismatch: declared {declared}, value is {actual}")]
    PayloadType { declared: String, actual: String },

    #[error("node '{node}' expected {expected}, received {found}")]
    StrictType {
        node: String,
        expected: String,
        found: String,
    },

    #[error("graph input is {expected}, received {found}")]
    InputType { expected: String, found: String },

    // Topology errors (build time)
    #[error("graph has no start node")]
    MissingStart,

    #[error("unknown node: '{0}'")]
    UnknownNode(String),

    #[error("nodes unreachable from start: {0:?}")]
    Unreachable(Vec<String>),

    #[error("handles belong to different graphs and cannot be combined")]
    ForeignHandle,

    #[error("join requires at least one handle")]
    EmptyJoin,

    #[error("operation requires a single head node, handle has {0}")]
    AmbiguousHead(usize),

    // Run-time errors
    #[error("epsilon action on node '{node}' made no progress")]
    Livelock { node: String },

    #[error("step '{node}' failed: {message}")]
    StepFailed { node: String, message: String },
}

pub type Result<T> = std::result::Result<T, WeftError>;
