//! A two-stage string pipeline completes end to end.

use crate::prelude::*;
use dflow_core::Value;
use dflow_runtime::ExecutionOutcome;

#[tokio::test]
async fn trims_then_uppercases() {
    let source = "in text: String\ntrimmed = stdlib.string.trim(text)\nresult = stdlib.string.uppercase(trimmed.result)\nout result\n";
    let inputs = [("text".to_string(), Value::String("  hello  ".to_string()))].into_iter().collect();

    let result = run(source, stdlib_registry(), inputs).await;

    match result.outcome {
        ExecutionOutcome::Completed { outputs } => {
            let result = outputs.get("result").expect("result output present");
            match result {
                Value::Record { fields, .. } => {
                    assert_eq!(fields.get("result"), Some(&Value::String("HELLO".to_string())));
                }
                other => panic!("expected a record, got {other:?}"),
            }
        }
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(result.resumption_count, 0);
}
