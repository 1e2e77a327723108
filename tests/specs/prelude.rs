//! Test helpers for end-to-end pipeline specifications.
//!
//! Unlike the per-crate unit tests (which construct ASTs, typed IR, or
//! DAGs by hand), these specs drive the whole front-to-back pipeline —
//! source text in, `ExecutionResult` out — the way an embedding host
//! would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dflow_check::check_pipeline;
use dflow_compile::{compile, PipelineImage};
use dflow_core::{SequentialIdGen, SystemClock, Type, Value};
use dflow_registry::{Module, ModuleImpl, ModuleInvokeError, ModuleMetadata, ModuleRegistry, ModuleVersion};
use dflow_runtime::{ExecutionResult, InMemorySuspensionStore, Runtime, Scheduler};
use dflow_syntax::{Diagnostic, Parser};
use indexmap::IndexMap;

/// Builds a registry carrying the small set of modules this test
/// tree's specs call: string helpers, arithmetic, and two
/// deliberately-misbehaving modules used to exercise retry and
/// caching.
pub fn stdlib_registry() -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    registry.register(trim_module()).expect("register stdlib.string.trim");
    registry.register(uppercase_module()).expect("register stdlib.string.uppercase");
    registry.register(add_module()).expect("register stdlib.math.add");
    registry
}

struct Trim;

#[async_trait]
impl ModuleImpl for Trim {
    async fn invoke(&self, consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        let Some(Value::String(s)) = consumed.get("text") else {
            return Err(ModuleInvokeError::new("expected a string"));
        };
        Ok([("result".to_string(), Value::String(s.trim().to_string()))].into_iter().collect())
    }
}

fn trim_module() -> Module {
    Module {
        qualified_name: "stdlib.string.trim".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: [("text".to_string(), Type::String)].into_iter().collect(),
        produces: [("result".to_string(), Type::String)].into_iter().collect(),
        implementation: Box::new(Trim),
        tags: vec!["string".to_string()],
        metadata: ModuleMetadata::default(),
    }
}

struct Uppercase;

#[async_trait]
impl ModuleImpl for Uppercase {
    async fn invoke(&self, consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        let Some(Value::String(s)) = consumed.get("text") else {
            return Err(ModuleInvokeError::new("expected a string"));
        };
        Ok([("result".to_string(), Value::String(s.to_uppercase()))].into_iter().collect())
    }
}

fn uppercase_module() -> Module {
    Module {
        qualified_name: "stdlib.string.uppercase".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: [("text".to_string(), Type::String)].into_iter().collect(),
        produces: [("result".to_string(), Type::String)].into_iter().collect(),
        implementation: Box::new(Uppercase),
        tags: vec!["string".to_string()],
        metadata: ModuleMetadata::default(),
    }
}

struct Add;

#[async_trait]
impl ModuleImpl for Add {
    async fn invoke(&self, consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        let (Some(Value::Int(a)), Some(Value::Int(b))) = (consumed.get("a"), consumed.get("b")) else {
            return Err(ModuleInvokeError::new("expected two ints"));
        };
        Ok([("sum".to_string(), Value::Int(a + b))].into_iter().collect())
    }
}

fn add_module() -> Module {
    Module {
        qualified_name: "stdlib.math.add".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: [("a".to_string(), Type::Int), ("b".to_string(), Type::Int)].into_iter().collect(),
        produces: [("sum".to_string(), Type::Int)].into_iter().collect(),
        implementation: Box::new(Add),
        tags: vec!["math".to_string()],
        metadata: ModuleMetadata::default(),
    }
}

/// Fails on its first `fail_until - 1` invocations with a transient
/// error, then succeeds returning `{ok: true}`.
pub struct Flaky {
    calls: AtomicU32,
    fail_until: u32,
}

impl Flaky {
    pub fn new(fail_until: u32) -> Self {
        Self { calls: AtomicU32::new(0), fail_until }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleImpl for Flaky {
    async fn invoke(&self, _consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n < self.fail_until {
            Err(ModuleInvokeError::transient(format!("attempt {n} failed")))
        } else {
            Ok([("ok".to_string(), Value::Bool(true))].into_iter().collect())
        }
    }
}

pub fn flaky_module(name: &str, flaky: Arc<Flaky>) -> Module {
    Module {
        qualified_name: name.to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: IndexMap::new(),
        produces: [("ok".to_string(), Type::Bool)].into_iter().collect(),
        implementation: Box::new(FlakyHandle(flaky)),
        tags: vec![],
        metadata: ModuleMetadata::default(),
    }
}

struct FlakyHandle(Arc<Flaky>);

#[async_trait]
impl ModuleImpl for FlakyHandle {
    async fn invoke(&self, consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        self.0.invoke(consumed).await
    }
}

/// Counts invocations; always succeeds with `{v: 7}`. Used to prove
/// cache single-flight / TTL behavior: the module body should run at
/// most once across repeated identical-input calls within the TTL.
pub struct Expensive(pub AtomicU32);

impl Expensive {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }
}

#[async_trait]
impl ModuleImpl for Expensive {
    async fn invoke(&self, _consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok([("v".to_string(), Value::Int(7))].into_iter().collect())
    }
}

fn expensive_module(calls: Arc<Expensive>) -> Module {
    Module {
        qualified_name: "test.expensive".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: IndexMap::new(),
        produces: [("v".to_string(), Type::Int)].into_iter().collect(),
        implementation: Box::new(ExpensiveHandle(calls)),
        tags: vec![],
        metadata: ModuleMetadata::default(),
    }
}

struct ExpensiveHandle(Arc<Expensive>);

#[async_trait]
impl ModuleImpl for ExpensiveHandle {
    async fn invoke(&self, consumed: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        self.0.invoke(consumed).await
    }
}

pub fn register_expensive(registry: &ModuleRegistry) -> Arc<Expensive> {
    let calls = Arc::new(Expensive::new());
    registry.register(expensive_module(calls.clone())).expect("register test.expensive");
    calls
}

/// Compiles `source` against `registry`, returning every diagnostic
/// collected across resolve and type-check (an empty vec does not by
/// itself mean lowering succeeds — lowering can still fail on its own
/// terms, e.g. lambda escape).
pub fn try_compile(source: &str, registry: &ModuleRegistry) -> Result<PipelineImage, Vec<Diagnostic>> {
    let pipeline = Parser::parse(source)?;
    let (resolved, mut diagnostics) = dflow_resolve::resolve(pipeline);
    if diagnostics.iter().any(Diagnostic::is_fatal) {
        return Err(diagnostics);
    }
    let (typed, check_diags) = check_pipeline(&resolved, registry);
    diagnostics.extend(check_diags);
    let Some(typed) = typed else {
        return Err(diagnostics);
    };
    if diagnostics.iter().any(Diagnostic::is_fatal) {
        return Err(diagnostics);
    }
    compile(&typed, registry).map_err(|err| {
            diagnostics.push(Diagnostic::new(
                    "E900",
                    dflow_syntax::Category::Internal,
                    dflow_syntax::Severity::Critical,
                    err.to_string(),
                    dflow_syntax::Span::default(),
            ));
            diagnostics
    })
}

/// Like `try_compile`, but panics with the diagnostics on failure —
/// for specs whose point is the execution behavior, not the compile.
pub fn compile_ok(source: &str, registry: &ModuleRegistry) -> PipelineImage {
    match try_compile(source, registry) {
        Ok(image) => image,
        Err(diags) => panic!("expected {source:?} to compile, got diagnostics: {diags:?}"),
    }
}

/// A fresh, unbounded-scheduler runtime over `registry`, with an
/// in-memory suspension store and deterministic sequential execution
/// ids (so specs can assert on `execution_id` without depending on
/// UUID randomness).
pub fn unbounded_runtime(registry: ModuleRegistry) -> Runtime {
    Runtime::new(
        Arc::new(registry),
        Scheduler::unbounded(),
        Arc::new(SystemClock),
        Arc::new(SequentialIdGen::new("exec")),
        InMemorySuspensionStore::arc(),
    )
}

/// Compiles `source` against `registry` and executes it against
/// `inputs` on a fresh unbounded runtime — the common case for specs
/// that don't need to inspect the compiled image or reuse a runtime
/// across calls.
pub async fn run(source: &str, registry: ModuleRegistry, inputs: IndexMap<String, Value>) -> ExecutionResult {
    let image = compile_ok(source, &registry);
    let runtime = unbounded_runtime(registry);
    runtime.execute(&image.dag, inputs).await
}

pub fn diag_codes(diags: &[Diagnostic]) -> Vec<&str> {
    diags.iter().map(|d| d.code.as_str()).collect()
}
