use weft_core::Result;

use crate::builder::GraphBuilder;

use super::{combine, AttachPoint, Flow};

/// Flows executed one after another.
///
/// Adjacent flows are wired outputs-to-inputs. The wiring happens only when
/// at least one side was newly materialized, so splicing the same structure
/// twice never duplicates edges.
pub struct Sequence {
    flows: Vec<Box<dyn Flow>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self { flows: vec![] }
    }

    /// Promote a single flow into a one-element sequence.
    pub fn of(flow: impl Flow + 'static) -> Self {
        Self {
            flows: vec![Box::new(flow)],
        }
    }

    /// Append a flow to the end of the sequence.
    pub fn then(mut self, flow: impl Flow + 'static) -> Self {
        self.flows.push(Box::new(flow));
        self
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow for Sequence {
    fn inputs(&self) -> Vec<AttachPoint> {
        self.flows.first().map(|f| f.inputs()).unwrap_or_default()
    }

    fn outputs(&self) -> Vec<AttachPoint> {
        self.flows.last().map(|f| f.outputs()).unwrap_or_default()
    }

    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool> {
        let mut created = Vec::with_capacity(self.flows.len());
        for flow in &self.flows {
            created.push(flow.materialize(builder)?);
        }

        for i in 1..self.flows.len() {
            if !created[i - 1] && !created[i] {
                continue;
            }
            for out in self.flows[i - 1].outputs() {
                for inp in self.flows[i].inputs() {
                    builder.add_edge(&out.node, &inp.node, combine(&out.guard, &inp.guard))?;
                }
            }
        }

        Ok(created.iter().any(|c| *c))
    }
}
