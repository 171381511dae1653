use weft_core::{Condition, Result};

use crate::builder::GraphBuilder;

use super::{combine, AttachPoint, Flow};

/// Repeat a body flow while a condition holds on its output.
///
/// The condition is ANDed onto every body input point, so control only
/// enters (and re-enters) the body while it holds; its negation guards the
/// body's output points, so control only leaves once it fails. The
/// back edges from body outputs to body inputs are added the first time the
/// body's nodes materialize.
pub struct While {
    condition: Condition,
    body: Box<dyn Flow>,
}

impl While {
    pub fn new(condition: Condition, body: impl Flow + 'static) -> Self {
        Self {
            condition,
            body: Box::new(body),
        }
    }
}

impl Flow for While {
    fn inputs(&self) -> Vec<AttachPoint> {
        self.body
            .inputs()
            .into_iter()
            .map(|p| p.and_guard(&self.condition))
            .collect()
    }

    fn outputs(&self) -> Vec<AttachPoint> {
        let exit = self.condition.negate();
        self.body
            .outputs()
            .into_iter()
            .map(|p| p.and_guard(&exit))
            .collect()
    }

    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool> {
        let created = self.body.materialize(builder)?;
        if created {
            // Self-loop: raw body outputs back to the condition-guarded
            // inputs.
            for out in self.body.outputs() {
                for inp in self.inputs() {
                    builder.add_edge(&out.node, &inp.node, combine(&out.guard, &inp.guard))?;
                }
            }
        }
        Ok(created)
    }
}
