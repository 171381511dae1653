use weft::{
    start, when, CollectingTracer, Condition, GraphBuilder, Handle, Runnable, Step, WeftError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn identity(name: &str) -> Step {
    Step::new(name, |x: i64| x)
}

#[test]
fn sequential_identity_composition_passes_input_through() -> anyhow::Result<()> {
    init_tracing();
    let exe = start(&identity("a"))
        .then(&identity("b"))?
        .then(&identity("c"))?
        .compile_output()?;

    assert_eq!(exe.run::<i64, i64>(42)?, vec![42]);
    Ok(())
}

#[test]
fn output_reached_along_two_paths_returns_both_in_frontier_order() -> anyhow::Result<()> {
    init_tracing();
    let src = start(&identity("src"));
    let left = src.then(&Step::new("left", |x: i64| x + 1))?;
    let right = src.then(&Step::new("right", |x: i64| x * 10))?;
    let exe = Handle::join(&[left, right])?
        .then(&identity("sink"))?
        .compile_output()?;

    // Left edge was wired first: its path reaches the sink first.
    assert_eq!(exe.run::<i64, i64>(5)?, vec![6, 50]);
    Ok(())
}

#[test]
fn epsilon_convergence_matches_an_explicit_chain() -> anyhow::Result<()> {
    init_tracing();
    let ready = || Condition::new(|x: &i64| *x >= 3);

    // One node whose epsilon steps 0 -> 1 -> 2 -> 3 before the edge matches.
    let eps_exe = start(&identity("seed"))
        .epsilon(weft::Action::new(|x: i64| x + 1))?
        .then(when(ready(), &identity("sink")))?
        .compile_output()?;

    // The same three intermediate states as explicit chained nodes.
    let chain_exe = start(&identity("seed"))
        .then(&Step::new("s1", |x: i64| x + 1))?
        .then(&Step::new("s2", |x: i64| x + 1))?
        .then(&Step::new("s3", |x: i64| x + 1))?
        .then(when(ready(), &identity("sink")))?
        .compile_output()?;

    let mut eps_trace = CollectingTracer::new();
    let mut chain_trace = CollectingTracer::new();
    let eps_out = eps_exe.run_traced::<i64, i64>(0, &mut eps_trace)?;
    let chain_out = chain_exe.run_traced::<i64, i64>(0, &mut chain_trace)?;

    // Same final output, same path-id shape at the sink.
    assert_eq!(eps_out, chain_out);
    let eps_sink = eps_trace.steps.last().expect("sink step traced");
    let chain_sink = chain_trace.steps.last().expect("sink step traced");
    assert_eq!(eps_sink.path, chain_sink.path);
    assert_eq!(eps_sink.path.to_string(), "0x4");
    Ok(())
}

#[test]
fn tracer_observes_every_step_and_transition() -> anyhow::Result<()> {
    init_tracing();
    let exe = start(&identity("a"))
        .then(&identity("b"))?
        .compile_output()?;

    let mut tracer = CollectingTracer::new();
    exe.run_traced::<i64, i64>(1, &mut tracer)?;

    let nodes: Vec<&str> = tracer.steps.iter().map(|s| s.node.as_str()).collect();
    assert_eq!(nodes, vec!["a", "b"]);
    assert_eq!(tracer.transitions.len(), 1);
    assert_eq!(tracer.transitions[0].from, "a");
    assert_eq!(tracer.transitions[0].to, "b");
    assert!(!tracer.transitions[0].conditional);

    // Trace records are plain data and export as JSON.
    let json = serde_json::to_value(&tracer.steps[0])?;
    assert_eq!(json["node"], "a");
    assert_eq!(json["epsilon_retries"], 0);
    Ok(())
}

#[test]
fn builder_and_algebra_produce_the_same_graph() -> anyhow::Result<()> {
    init_tracing();
    let inc = Step::new("inc", |x: i64| x + 1);
    let double = Step::new("double", |x: i64| x * 2);

    let algebra = start(&inc).then(&double)?.compile_output()?;

    let mut builder = GraphBuilder::new();
    builder.start_with(&inc);
    builder.connect(&inc, &double, None)?;
    builder.designate_output("double");
    let imperative = builder.build()?;

    assert_eq!(algebra.run::<i64, i64>(5)?, imperative.run::<i64, i64>(5)?);
    Ok(())
}

struct WordCount;

impl Runnable for WordCount {
    type Input = String;
    type Output = i64;

    fn name(&self) -> &str {
        "word-count"
    }

    fn run(&self, input: String) -> i64 {
        input.split_whitespace().count() as i64
    }
}

#[test]
fn runnable_objects_are_steps() -> anyhow::Result<()> {
    init_tracing();
    let count: Step = WordCount.into();
    let exe = start(&count)
        .then(&Step::new("double", |x: i64| x * 2))?
        .compile_output()?;

    assert_eq!(exe.run::<String, i64>("one two three".to_string())?, vec![6]);
    Ok(())
}

#[test]
fn run_with_wrong_input_type_fails_at_the_boundary() {
    init_tracing();
    let exe = start(&identity("a")).compile().unwrap();
    let err = exe.run::<String, i64>("nope".into()).unwrap_err();
    assert!(matches!(err, WeftError::InputType { .. }));
}

#[test]
fn side_effect_only_graphs_return_nothing() -> anyhow::Result<()> {
    init_tracing();
    // No designated output: executed for effects, outputs dropped.
    let exe = start(&identity("a")).then(&identity("b"))?.compile()?;
    assert!(exe.run::<i64, i64>(7)?.is_empty());
    Ok(())
}
