pub mod error;
pub mod payload;
pub mod step;

pub use error::{Result, WeftError};
pub use payload::{StepPayload, TypeDesc, Value};
pub use step::{Action, Condition, Runnable, Step};
