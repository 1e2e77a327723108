//! A module that fails its first three attempts and succeeds on the
//! fourth completes under `retry:3, backoff:exponential`, compiled from
//! source rather than a hand-built call node.

use crate::prelude::*;
use dflow_registry::ModuleRegistry;
use dflow_runtime::ExecutionOutcome;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn retries_with_exponential_backoff_until_success() {
    let flaky = Arc::new(Flaky::new(4));
    let registry = ModuleRegistry::new();
    registry.register(flaky_module("test.flaky", flaky.clone())).expect("register test.flaky");

    let source = "result = test.flaky() with retry: 3, delay: 100ms, backoff: exponential\nout result\n";
    let result = run(source, registry, IndexMap::new()).await;

    match result.outcome {
        ExecutionOutcome::Completed { .. } => {}
        other => panic!("expected Completed after exhausting retries, got {other:?}"),
    }
    assert_eq!(flaky.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn exhausting_retries_with_on_error_propagate_fails_the_execution() {
    let flaky = Arc::new(Flaky::new(100));
    let registry = ModuleRegistry::new();
    registry.register(flaky_module("test.flaky", flaky.clone())).expect("register test.flaky");

    let source = "result = test.flaky() with retry: 2, delay: 10ms\nout result\n";
    let result = run(source, registry, IndexMap::new()).await;

    match result.outcome {
        ExecutionOutcome::Failed { .. } => {}
        other => panic!("expected Failed once retries and fallback are both exhausted, got {other:?}"),
    }
    assert_eq!(flaky.calls(), 3, "one initial attempt plus two retries");
}

/// A module that blocks forever under `retry:1, timeout:50ms` still
/// completes its last attempt no later than `(retry+1) * timeout` plus
/// backoff — it does not hang the execution.
#[tokio::test(start_paused = true)]
async fn timeout_bounds_a_module_that_never_returns() {
    let registry = ModuleRegistry::new();
    registry.register(forever_module()).expect("register test.forever");

    let source = "result = test.forever() with retry: 1, timeout: 50ms, on_error: skip\nout result\n";
    let result = tokio::time::timeout(Duration::from_secs(5), run(source, registry, IndexMap::new()))
    .await
    .expect("execution completes well within the wall-clock bound");

    match result.outcome {
        ExecutionOutcome::Completed { .. } => {}
        other => panic!("expected Completed (on_error: skip degrades rather than hangs), got {other:?}"),
    }
}

fn forever_module() -> dflow_registry::Module {
    use async_trait::async_trait;
    use dflow_core::{Type, Value};
    use dflow_registry::{ModuleImpl, ModuleInvokeError, ModuleMetadata, ModuleVersion};

    struct Forever;
    #[async_trait]
    impl ModuleImpl for Forever {
        async fn invoke(&self, _consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    dflow_registry::Module {
        qualified_name: "test.forever".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: IndexMap::new(),
        produces: [("ok".to_string(), Type::Bool)].into_iter().collect(),
        implementation: Box::new(Forever),
        tags: vec![],
        metadata: ModuleMetadata::default(),
    }
}
