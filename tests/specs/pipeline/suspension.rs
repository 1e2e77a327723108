//! An execution with a missing input suspends, then completes once the
//! caller supplies it, driven from source text rather than a hand-built
//! `Dag`.

use crate::prelude::*;
use dflow_core::{ExecutionId, Type, Value};
use dflow_runtime::{ExecutionOutcome, InMemorySuspensionStore, SuspendedExecution, SuspensionError, SuspensionStore};
use indexmap::IndexMap;

const SOURCE: &str = "in x: Int\nin y: Int\nsum = stdlib.math.add(x, y)\nout sum\n";

#[tokio::test]
async fn suspends_then_resumes_to_completion() {
    let image = compile_ok(SOURCE, &stdlib_registry());
    let runtime = unbounded_runtime(stdlib_registry());

    let partial: IndexMap<String, Value> = [("x".to_string(), Value::Int(10))].into_iter().collect();
    let first = runtime.execute(&image.dag, partial).await;

    let (execution_id, missing) = match first.outcome {
        ExecutionOutcome::Suspended { missing_inputs, .. } => (first.execution_id, missing_inputs),
        other => panic!("expected Suspended, got {other:?}"),
    };
    assert_eq!(missing.get("y"), Some(&Type::Int));
    assert_eq!(first.resumption_count, 0);

    let additional: IndexMap<String, Value> = [("y".to_string(), Value::Int(32))].into_iter().collect();
    let second = runtime.resume(&image.dag, &execution_id, additional, IndexMap::new()).await;

    match second.outcome {
        ExecutionOutcome::Completed { outputs } => match outputs.get("sum") {
            Some(Value::Record { fields, .. }) => assert_eq!(fields.get("sum"), Some(&Value::Int(42))),
            other => panic!("expected a record output, got {other:?}"),
        },
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(second.resumption_count, 1);
    assert_eq!(second.execution_id, execution_id);
}

#[tokio::test]
async fn resuming_an_execution_already_marked_resuming_is_rejected() {
    let store = InMemorySuspensionStore::arc();
    let execution_id = ExecutionId::new("exec-racing");

    let snapshot = SuspendedExecution {
        execution_id: execution_id.clone(),
        dag_structural_hash: "deadbeef".to_string(),
        values: Default::default(),
        statuses: Default::default(),
        resumption_count: 0,
        missing_inputs: Default::default(),
        pending_outputs: Vec::new(),
        created_at_millis: 0,
    };
    store.save(snapshot).await.expect("save");

    // Simulate a second resume racing the first: claim the "resuming"
    // mark twice and confirm the second claim is rejected rather than
    // silently racing the first.
    store.mark_resuming(&execution_id).await.expect("first claim succeeds");
    let err = store.mark_resuming(&execution_id).await.expect_err("second claim is rejected");
    assert!(matches!(err, SuspensionError::ResumeInProgress(_)));
}
