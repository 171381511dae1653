use weft_core::{Condition, Result};

use crate::builder::GraphBuilder;

use super::{AttachPoint, Flow};

/// Multi-way branching: a set of condition-guarded flows.
///
/// Branches are independent — every branch whose condition holds is
/// entered, so overlapping true conditions cause genuine fan-out rather
/// than first-match-wins. Callers wanting exclusive branches make the
/// conditions disjoint (e.g. guard later cases with negations).
pub struct Switch {
    branches: Vec<(Condition, Box<dyn Flow>)>,
}

impl Switch {
    pub fn new() -> Self {
        Self { branches: vec![] }
    }

    pub fn case(mut self, condition: Condition, flow: impl Flow + 'static) -> Self {
        self.branches.push((condition, Box::new(flow)));
        self
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl Default for Switch {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow for Switch {
    fn inputs(&self) -> Vec<AttachPoint> {
        self.branches
            .iter()
            .flat_map(|(condition, flow)| {
                flow.inputs()
                    .into_iter()
                    .map(|p| p.and_guard(condition))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn outputs(&self) -> Vec<AttachPoint> {
        self.branches
            .iter()
            .flat_map(|(_, flow)| flow.outputs())
            .collect()
    }

    fn materialize(&self, builder: &mut GraphBuilder) -> Result<bool> {
        let mut created = false;
        for (_, flow) in &self.branches {
            created |= flow.materialize(builder)?;
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use weft_core::Step;

    use super::super::{compile_with, CompileOptions, Sequence};
    use super::*;

    fn even_odd_flow() -> Sequence {
        Sequence::of(Step::new("entry", |x: i64| x))
            .then(
                Switch::new()
                    .case(
                        Condition::new(|x: &i64| *x % 2 == 0),
                        Step::new("double", |x: i64| x * 2),
                    )
                    .case(
                        Condition::new(|x: &i64| *x % 2 != 0),
                        Step::new("negate", |x: i64| -x),
                    ),
            )
            .then(Step::new("sink", |x: i64| x))
    }

    #[test]
    fn test_disjoint_branches() {
        let exe = compile_with(&even_odd_flow(), CompileOptions::output("sink")).unwrap();

        assert_eq!(exe.run::<i64, i64>(4).unwrap(), vec![8]);
        assert_eq!(exe.run::<i64, i64>(3).unwrap(), vec![-3]);
    }

    #[test]
    fn test_overlapping_true_conditions_fan_out() {
        let seq = Sequence::of(Step::new("entry", |x: i64| x))
            .then(
                Switch::new()
                    .case(Condition::new(|_: &i64| true), Step::new("double", |x: i64| x * 2))
                    .case(Condition::new(|_: &i64| true), Step::new("negate", |x: i64| -x)),
            )
            .then(Step::new("sink", |x: i64| x));
        let exe = compile_with(&seq, CompileOptions::output("sink")).unwrap();

        // BOTH branches fire; outputs arrive in branch order.
        assert_eq!(exe.run::<i64, i64>(3).unwrap(), vec![6, -3]);
    }

    #[test]
    fn test_no_branch_matches() {
        let exe = compile_with(&even_odd_flow(), CompileOptions::output("sink")).unwrap();
        // Every i64 is even or odd, so exercise the dead end with a switch
        // whose guards both exclude the input.
        let narrow = Sequence::of(Step::new("entry", |x: i64| x)).then(
            Switch::new().case(Condition::new(|x: &i64| *x > 100), Step::new("big", |x: i64| x)),
        );
        let narrow_exe = compile_with(&narrow, CompileOptions::output("big")).unwrap();

        assert!(narrow_exe.run::<i64, i64>(5).unwrap().is_empty());
        assert_eq!(exe.run::<i64, i64>(2).unwrap(), vec![4]);
    }
}
