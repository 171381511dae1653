use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, WeftError};
use crate::payload::{TypeDesc, Value};

/// Erased node action: consumes a value, produces a value.
pub type ActionFn = Arc<dyn Fn(Box<dyn Value>) -> Result<Box<dyn Value>> + Send + Sync>;

/// Erased edge condition: inspects a value, answers yes or no.
pub type ConditionFn = Arc<dyn Fn(&dyn Value) -> Result<bool> + Send + Sync>;

/// A node action with its declared input and output types.
///
/// The declared descriptors are what lowering validates; the erased callable
/// is what the interpreter invokes. Typed constructors keep the two in sync
/// by construction; `from_raw` is the escape hatch for dynamically-described
/// steps, whose declarations lowering must then check.
#[derive(Clone)]
pub struct Action {
    input: TypeDesc,
    output: TypeDesc,
    func: ActionFn,
}

impl Action {
    /// Register a typed step.
    pub fn new<I, O>(f: impl Fn(I) -> O + Send + Sync + 'static) -> Self
    where
        I: Value,
        O: Value,
    {
        let func: ActionFn = Arc::new(move |value| {
            let actual = value.type_name();
            let input = value.into_any().downcast::<I>().map_err(|_| {
                WeftError::PayloadType {
                    declared: std::any::type_name::<I>().to_string(),
                    actual: actual.to_string(),
                }
            })?;
            Ok(Box::new(f(*input)) as Box<dyn Value>)
        });
        Self {
            input: TypeDesc::of::<I>(),
            output: TypeDesc::of::<O>(),
            func,
        }
    }

    /// Register a typed step that can fail.
    ///
    /// A step error aborts the run; there is no retry policy.
    pub fn fallible<I, O, E>(
        f: impl Fn(I) -> std::result::Result<O, E> + Send + Sync + 'static,
    ) -> Self
    where
        I: Value,
        O: Value,
        E: std::fmt::Display,
    {
        let func: ActionFn = Arc::new(move |value| {
            let actual = value.type_name();
            let input = value.into_any().downcast::<I>().map_err(|_| {
                WeftError::PayloadType {
                    declared: std::any::type_name::<I>().to_string(),
                    actual: actual.to_string(),
                }
            })?;
            let output = f(*input).map_err(|e| WeftError::StepFailed {
                node: String::new(),
                message: e.to_string(),
            })?;
            Ok(Box::new(output) as Box<dyn Value>)
        });
        Self {
            input: TypeDesc::of::<I>(),
            output: TypeDesc::of::<O>(),
            func,
        }
    }

    /// Register an action from explicit descriptors and an erased callable.
    ///
    /// The declarations are taken at face value here and validated during
    /// lowering and (in strict mode) at run time.
    pub fn from_raw(input: TypeDesc, output: TypeDesc, func: ActionFn) -> Self {
        Self { input, output, func }
    }

    pub fn input(&self) -> TypeDesc {
        self.input
    }

    pub fn output(&self) -> TypeDesc {
        self.output
    }

    pub fn invoke_raw(&self, value: Box<dyn Value>) -> Result<Box<dyn Value>> {
        (self.func)(value)
    }

    /// Identity of the underlying callable, used for idempotent reuse.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.func) as *const () as usize
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .finish()
    }
}

/// An edge condition with its declared input and output types.
///
/// The typed constructor fixes the output descriptor to `bool`; a raw
/// condition may declare anything, and lowering rejects non-bool returns.
#[derive(Clone)]
pub struct Condition {
    input: TypeDesc,
    output: TypeDesc,
    func: ConditionFn,
}

impl Condition {
    pub fn new<T: Value>(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let func: ConditionFn = Arc::new(move |value| {
            let input = value.as_any().downcast_ref::<T>().ok_or_else(|| {
                WeftError::PayloadType {
                    declared: std::any::type_name::<T>().to_string(),
                    actual: value.type_name().to_string(),
                }
            })?;
            Ok(f(input))
        });
        Self {
            input: TypeDesc::of::<T>(),
            output: TypeDesc::of::<bool>(),
            func,
        }
    }

    pub fn from_raw(input: TypeDesc, output: TypeDesc, func: ConditionFn) -> Self {
        Self { input, output, func }
    }

    pub fn input(&self) -> TypeDesc {
        self.input
    }

    pub fn output(&self) -> TypeDesc {
        self.output
    }

    pub fn evaluate(&self, value: &dyn Value) -> Result<bool> {
        (self.func)(value)
    }

    /// Conjunction of two conditions over the same input type.
    ///
    /// Guards accumulate this way when flows nest.
    pub fn and(&self, other: &Condition) -> Condition {
        let a = self.func.clone();
        let b = other.func.clone();
        Condition {
            input: self.input,
            output: TypeDesc::of::<bool>(),
            func: Arc::new(move |value| Ok(a(value)? && b(value)?)),
        }
    }

    pub fn negate(&self) -> Condition {
        let inner = self.func.clone();
        Condition {
            input: self.input,
            output: TypeDesc::of::<bool>(),
            func: Arc::new(move |value| Ok(!inner(value)?)),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .finish()
    }
}

static ANON_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A named action, the unit the builder and both DSL layers compose.
///
/// Step identity is its name: ensuring the same name twice reuses one node.
/// Anonymous steps get a synthesized name at construction, so a cloned step
/// still resolves to the same node.
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    action: Action,
}

impl Step {
    pub fn new<I, O>(name: impl Into<String>, f: impl Fn(I) -> O + Send + Sync + 'static) -> Self
    where
        I: Value,
        O: Value,
    {
        Self {
            name: name.into(),
            action: Action::new(f),
        }
    }

    pub fn anonymous(action: Action) -> Self {
        let n = ANON_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            name: format!("step-{n}"),
            action,
        }
    }

    pub fn from_action(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    pub fn from_runnable<R: Runnable>(runnable: R) -> Self {
        let name = runnable.name().to_string();
        Self {
            name,
            action: Action::new(move |input| runnable.run(input)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// The "object with a named run method" shape of the step contract.
///
/// Anything implementing this converts into a [`Step`] and is accepted
/// wherever a bare closure is.
pub trait Runnable: Send + Sync + 'static {
    type Input: Value;
    type Output: Value;

    fn name(&self) -> &str;
    fn run(&self, input: Self::Input) -> Self::Output;
}

impl<R: Runnable> From<R> for Step {
    fn from(runnable: R) -> Self {
        Step::from_runnable(runnable)
    }
}
