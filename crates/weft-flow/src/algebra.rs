use std::cell::RefCell;
use std::rc::Rc;

use weft_core::{Action, Condition, Result, Step, WeftError};
use weft_engine::ExecutableGraph;

use crate::builder::GraphBuilder;

/// A step plus an optional attachment condition.
///
/// This is the if/then value of the algebra: anywhere a plain step is
/// accepted, a guarded one is too.
#[derive(Debug, Clone)]
pub struct Attachment {
    step: Step,
    condition: Option<Condition>,
}

impl Attachment {
    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

impl From<&Step> for Attachment {
    fn from(step: &Step) -> Self {
        Self {
            step: step.clone(),
            condition: None,
        }
    }
}

impl From<Step> for Attachment {
    fn from(step: Step) -> Self {
        Self {
            step,
            condition: None,
        }
    }
}

/// Pair a condition with a step: the edges wired by a following
/// [`Handle::then`] carry the condition.
pub fn when(condition: Condition, step: &Step) -> Attachment {
    Attachment {
        step: step.clone(),
        condition: Some(condition),
    }
}

/// Begin a flow at the given step.
pub fn start(step: &Step) -> Handle {
    let mut builder = GraphBuilder::new();
    let name = builder.start_with(step);
    Handle {
        builder: Rc::new(RefCell::new(builder)),
        heads: vec![name],
    }
}

/// An immutable cursor into a graph under construction.
///
/// Operations never mutate the handle; they extend the shared underlying
/// builder and return a new handle whose heads are the attachment points a
/// following operation wires from.
#[derive(Clone)]
pub struct Handle {
    builder: Rc<RefCell<GraphBuilder>>,
    heads: Vec<String>,
}

impl Handle {
    /// Append a step (or a guarded step) as successor of every current
    /// head.
    pub fn then(&self, next: impl Into<Attachment>) -> Result<Handle> {
        let attachment = next.into();
        let mut builder = self.builder.borrow_mut();
        let (name, _) = builder.ensure_node(&attachment.step);
        for head in &self.heads {
            builder.add_edge(head, &name, attachment.condition.clone())?;
        }
        Ok(Handle {
            builder: self.builder.clone(),
            heads: vec![name],
        })
    }

    /// Combine handles so a following [`then`](Self::then) wires edges from
    /// ALL of them — an explicit multi-input join.
    ///
    /// Every handle must come from the same [`start`] call.
    pub fn join(handles: &[Handle]) -> Result<Handle> {
        let first = handles.first().ok_or(WeftError::EmptyJoin)?;
        let mut heads = Vec::new();
        for handle in handles {
            if !Rc::ptr_eq(&first.builder, &handle.builder) {
                return Err(WeftError::ForeignHandle);
            }
            for head in &handle.heads {
                if !heads.contains(head) {
                    heads.push(head.clone());
                }
            }
        }
        Ok(Handle {
            builder: first.builder.clone(),
            heads,
        })
    }

    /// Override the epsilon action of the single current head.
    pub fn epsilon(&self, action: Action) -> Result<Handle> {
        let head = self.single_head()?;
        self.builder.borrow_mut().set_epsilon(&head, action)?;
        Ok(self.clone())
    }

    pub fn strict_types(&self, strict: bool) -> &Handle {
        self.builder.borrow_mut().strict_types(strict);
        self
    }

    pub fn check_orphans(&self, check: bool) -> &Handle {
        self.builder.borrow_mut().check_orphans(check);
        self
    }

    /// Node names this handle currently points at.
    pub fn heads(&self) -> &[String] {
        &self.heads
    }

    /// Lower the graph as built so far, with no designated output.
    pub fn compile(&self) -> Result<ExecutableGraph> {
        self.builder.borrow().clone().build()
    }

    /// Lower the graph with the single current head designated as the
    /// output node.
    pub fn compile_output(&self) -> Result<ExecutableGraph> {
        let head = self.single_head()?;
        let mut builder = self.builder.borrow().clone();
        builder.designate_output(head);
        builder.build()
    }

    fn single_head(&self) -> Result<String> {
        match self.heads.as_slice() {
            [head] => Ok(head.clone()),
            other => Err(WeftError::AmbiguousHead(other.len())),
        }
    }
}
