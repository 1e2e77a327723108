// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! the execution engine. Runs a compiled `Dag` layer by layer,
//! wrapping every module-call node in the exact policy nesting
//! specifies (`throttle -> concurrency-semaphore -> cache-lookup ->
//! timeout -> retry(delay+backoff) -> module-body -> on-success cache-put
//! -> on-failure fallback or on_error`), and suspends when the
//! ready set empties out with `Pending` nodes still blocked on missing
//! inputs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dflow_check::CallOptions;
use dflow_compile::{eval, eval_lambda, CompiledLambda, Dag, Env, Node, NodeKind, VALUE_SLOT};
use dflow_core::{is_subtype, Clock, ExecutionId, IdGen, NodeId, Type, Value};
use dflow_registry::{LambdaFn, Module, ModuleInvokeError, ModuleRegistry};
use dflow_syntax::{BackoffKind, OnErrorKind};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::cache::{cache_key, CacheBackend, CacheRegistry, FlightRole, SingleFlightGroup};
use crate::error::{Attempt, RuntimeError};
use crate::scheduler::Scheduler;
use crate::semaphore::NamedSemaphores;
use crate::suspension::{NodeStatus, StoredValue, SuspendedExecution, SuspensionStore};
use crate::throttle::Throttle;

/// `concurrency` pools default to effectively unbounded when the option is
/// absent — a real limit, just a generous one, since a
/// semaphore needs some finite size.
const UNBOUNDED_CONCURRENCY: u32 = 1_000_000;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Outcome of a single `execute`/`resume` call.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed { outputs: IndexMap<String, Value> },
    Suspended {
        outputs: IndexMap<String, Value>,
        missing_inputs: IndexMap<String, Type>,
        pending_outputs: Vec<String>,
    },
    Failed { error: RuntimeError },
}

#[derive(Debug)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    pub resumption_count: u32,
    pub outcome: ExecutionOutcome,
}

/// The shared, cheaply-`Clone`-able resources every node invocation needs.
/// Split out of `Runtime` so a per-node future can own a copy and satisfy
/// `'static` when handed to the scheduler / `JoinSet`, without `Runtime`
/// itself needing to be wrapped in an `Arc`.
#[derive(Clone)]
struct Ctx {
    registry: Arc<ModuleRegistry>,
    scheduler: Scheduler,
    caches: Arc<CacheRegistry>,
    semaphores: Arc<NamedSemaphores>,
    throttle: Arc<Throttle>,
    single_flight: Arc<SingleFlightGroup>,
}

impl Ctx {
    async fn run_node(
        &self,
        dag: &Dag,
        node: &Node,
        values: &HashMap<NodeId, Value>,
        token: &CancellationToken,
    ) -> Result<Value, RuntimeError> {
        match &node.kind {
            NodeKind::Input => unreachable!("input nodes never enter the ready set"),
            NodeKind::Output => {
                let slots = gather_slots(dag, node, values)?;
                slots.get(VALUE_SLOT).cloned().ok_or_else(|| RuntimeError::DataNotFound(node.name.clone()))
            }
            NodeKind::Data { expr } => {
                let env: Env = gather_slots(dag, node, values)?.into_iter().collect();
                eval(expr, &env).map_err(|e| RuntimeError::ModuleExecution { module: node.name.clone(), message: e.to_string() })
            }
            NodeKind::ModuleCall { module_fqn, options, lambda_args } => {
                let consumed = gather_slots(dag, node, values)?;
                self.run_module_call(&node.name, module_fqn, options, lambda_args, consumed, token).await
            }
        }
    }

    async fn run_module_call(
        &self,
        node_name: &str,
        fqn: &str,
        options: &CallOptions,
        lambda_args: &IndexMap<String, CompiledLambda>,
        consumed: IndexMap<String, Value>,
        token: &CancellationToken,
    ) -> Result<Value, RuntimeError> {
        let module = self.registry.lookup_fqn(fqn)?;
        let _call_guard = self.registry.begin_call(fqn);

        for (slot, ty) in &module.consumes {
            let value = consumed
            .get(slot)
            .ok_or_else(|| RuntimeError::InputValidation { path: slot.clone(), expected: ty.to_string(), actual: "<missing>".to_string() })?;
            if !is_subtype(&value.type_of(), ty) {
                return Err(RuntimeError::InputValidation {
                        path: slot.clone(),
                        expected: ty.to_string(),
                        actual: value.type_of().to_string(),
                });
            }
        }

        let lambdas: HashMap<String, LambdaFn> = lambda_args
        .iter()
        .map(|(slot, lambda)| {
                let param = lambda.param.clone();
                let body = lambda.body.clone();
                let f: LambdaFn = Arc::new(move |arg: Value| {
                        eval_lambda(&param, &body, arg).map_err(|e| ModuleInvokeError::new(e.to_string()))
                });
                (slot.clone(), f)
        })
        .collect();

        let span = tracing::info_span!("module_call", module = fqn, node = node_name);
        self.invoke_with_policies(module, options.clone(), consumed, lambdas, node_name.to_string(), token)
        .instrument(span)
        .await
    }

    /// The exact nesting specifies: `throttle -> semaphore ->
    /// cache-lookup -> timeout -> retry(delay+backoff) -> module-body ->
    /// cache-put -> fallback/on_error`. Lock-free cache backends check
    /// before throttle/semaphore (no resource to hold for a read that may
    /// short-circuit everything); others check only once the semaphore
    /// permit is held. `token` is observed at every wait point (throttle,
    /// semaphore, single-flight follower) so a cancelled execution never
    /// blocks behind one that is still running; once cancelled, no new
    /// task is handed to the scheduler.
    async fn invoke_with_policies(
        &self,
        module: Arc<Module>,
        options: CallOptions,
        consumed: IndexMap<String, Value>,
        lambdas: HashMap<String, LambdaFn>,
        node_name: String,
        token: &CancellationToken,
    ) -> Result<Value, RuntimeError> {
        let cache = options.cache.map(|ttl| (self.caches.resolve(&options.cache_backend), ttl));
        let key = cache.as_ref().map(|_| cache_key(&module.qualified_name, &module.version.to_string(), &consumed));

        if let (Some((backend, _)), Some(key)) = (&cache, &key) {
            if backend.supports_lock_free_reads() {
                if let Some(v) = backend.lookup(key).await {
                    return Ok(v);
                }
            }
        }

        if token.is_cancelled() {
            return Err(RuntimeError::Cancelled(node_name));
        }
        if let Some(rate) = options.throttle {
            tokio::select! {
                biased;
                () = token.cancelled() => return Err(RuntimeError::Cancelled(node_name)),
                () = self.throttle.acquire(&module.qualified_name, rate.0, rate.1) => {}
            }
        }
        let capacity = options.concurrency.unwrap_or(UNBOUNDED_CONCURRENCY);
        let _permit = tokio::select! {
            biased;
            () = token.cancelled() => return Err(RuntimeError::Cancelled(node_name)),
            permit = self.semaphores.acquire(&module.qualified_name, capacity) => permit,
        };

        if let (Some((backend, _)), Some(key)) = (&cache, &key) {
            if !backend.supports_lock_free_reads() {
                if let Some(v) = backend.lookup(key).await {
                    return Ok(v);
                }
            }
        }

        let role = key.as_ref().map(|k| self.single_flight.join(k));
        if let Some(FlightRole::Follower(notify)) = &role {
            tokio::select! {
                biased;
                () = token.cancelled() => return Err(RuntimeError::Cancelled(node_name)),
                () = notify.notified() => {}
            }
            if let (Some((backend, _)), Some(key)) = (&cache, &key) {
                if let Some(v) = backend.lookup(key).await {
                    return Ok(v);
                }
            }
        }

        if token.is_cancelled() {
            if let Some(key) = &key {
                self.single_flight.finish(key);
            }
            return Err(RuntimeError::Cancelled(node_name));
        }
        let priority = options.priority;
        let result = self
        .scheduler
        .submit(priority, run_with_retry(module, options, consumed, lambdas, node_name, token.clone()))
        .await?;

        if let (Some((backend, ttl)), Some(key)) = (&cache, &key) {
            if let Ok(v) = &result {
                backend.put(key.clone(), v.clone(), *ttl).await;
            }
        }
        if let Some(key) = &key {
            self.single_flight.finish(key);
        }
        result
    }
}

/// Runs the module body under `options.timeout`, retrying up to
/// `options.retry` times with `options.backoff`-shaped delay, then falls
/// through to `handle_exhausted` once attempts are used up. `token` is
/// observed at every suspension point (the timeout-wrapped body and the
/// backoff sleep) so a cancellation request lands before the next attempt
/// starts rather than waiting out the remaining retries.
async fn run_with_retry(
    module: Arc<Module>,
    options: CallOptions,
    consumed: IndexMap<String, Value>,
    lambdas: HashMap<String, LambdaFn>,
    node_name: String,
    token: CancellationToken,
) -> Result<Value, RuntimeError> {
    let mut attempt: u32 = 0;
    let mut history: Vec<Attempt> = Vec::new();

    loop {
        if token.is_cancelled() {
            return Err(RuntimeError::Cancelled(node_name));
        }
        attempt += 1;
        let body = module.implementation.invoke_with_lambdas(consumed.clone(), &lambdas);
        let timed = async {
            match options.timeout {
                Some(d) => match tokio::time::timeout(d, body).await {
                    Ok(r) => r,
                    Err(_) => Err(ModuleInvokeError::transient(format!("timed out after {d:?}"))),
                },
                None => body.await,
            }
        };
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => return Err(RuntimeError::Cancelled(node_name)),
            r = timed => r,
        };

        match outcome {
            Ok(produces) => return Ok(Value::Record { fields: produces, shape: module.produces.clone() }),
            Err(err) => {
                history.push(Attempt { number: attempt, error: err.message.clone() });
                if attempt <= options.retry {
                    let wait = backoff_wait(&options.backoff, options.delay, attempt);
                    if !wait.is_zero() {
                        tokio::select! {
                            biased;
                            () = token.cancelled() => return Err(RuntimeError::Cancelled(node_name)),
                            () = tokio::time::sleep(wait) => {}
                        }
                    }
                    continue;
                }
                return handle_exhausted(&module, &options, history, &node_name);
            }
        }
    }
}

fn handle_exhausted(module: &Module, options: &CallOptions, history: Vec<Attempt>, node_name: &str) -> Result<Value, RuntimeError> {
    if let Some(expr) = &options.fallback_expr {
        let env = Env::new();
        return eval(expr, &env)
        .map_err(|e| RuntimeError::ModuleExecution { module: module.qualified_name.clone(), message: format!("fallback evaluation failed: {e}") });
    }

    match options.on_error {
        OnErrorKind::Propagate => Err(RuntimeError::RetryExhausted {
                module: module.qualified_name.clone(),
                attempts: history.len() as u32,
                history,
        }),
        OnErrorKind::Skip => Ok(Value::zero_value(&module.return_type())),
        OnErrorKind::Log => {
            tracing::warn!(
                module = module.qualified_name.as_str(),
                node = node_name,
                attempts = history.len(),
                "module call exhausted retries, returning zero value"
            );
            Ok(Value::zero_value(&module.return_type()))
        }
        OnErrorKind::Wrap => Ok(wrap_error(module, &history)),
    }
}

/// `{ ok: None, err: Some(error_message) }`, `on_error: wrap`.
/// Degrades to the module's zero value (with a warning) if its `produces`
/// shape does not have the `ok`/`err` wrap shape a checked call site using
/// `wrap` should have validated against.
fn wrap_error(module: &Module, history: &[Attempt]) -> Value {
    let message = history.last().map(|a| a.error.clone()).unwrap_or_default();
    match (module.produces.get("ok"), module.produces.get("err")) {
        (Some(ok_ty), Some(err_ty)) => {
            let ok_inner = match ok_ty {
                Type::Optional(inner) => (**inner).clone(),
                other => other.clone(),
            };
            let err_inner = match err_ty {
                Type::Optional(inner) => (**inner).clone(),
                other => other.clone(),
            };
            Value::Record {
                fields: [
                    ("ok".to_string(), Value::None { inner_type: ok_inner }),
                    ("err".to_string(), Value::Some { inner: Box::new(Value::String(message)), inner_type: err_inner }),
                ]
                .into_iter()
                .collect(),
                shape: module.produces.clone(),
            }
        }
        _ => {
            tracing::warn!(module = module.qualified_name.as_str(), "on_error: wrap used on a module without an ok/err produces shape");
            Value::zero_value(&module.return_type())
        }
    }
}

fn backoff_wait(kind: &BackoffKind, delay: Duration, k: u32) -> Duration {
    let wait = match kind {
        BackoffKind::Fixed => delay,
        BackoffKind::Linear => delay.saturating_mul(k),
        BackoffKind::Exponential => delay.checked_mul(1u32.checked_shl(k.saturating_sub(1)).unwrap_or(u32::MAX)).unwrap_or(MAX_BACKOFF),
    };
    wait.min(MAX_BACKOFF)
}

/// Nodes with every predecessor `Completed` and their own status still
/// `Pending`. `Input` nodes never appear: they are populated once, up
/// front, never (re-)computed by the loop.
fn compute_ready(dag: &Dag, statuses: &HashMap<NodeId, NodeStatus>) -> Vec<NodeId> {
    dag.nodes
    .iter()
    .filter(|n| !matches!(n.kind, NodeKind::Input))
    .filter(|n| statuses.get(&n.id) == Some(&NodeStatus::Pending))
    .filter(|n| {
            dag.predecessors(&n.id)
            .iter()
            .all(|e| statuses.get(&e.producer) == Some(&NodeStatus::Completed))
    })
    .map(|n| n.id.clone())
    .collect()
}

/// Resolves a node's input slots (keyed by `consumer_slot`) from its
/// incoming edges and the already-published `values` snapshot.
fn gather_slots(dag: &Dag, node: &Node, values: &HashMap<NodeId, Value>) -> Result<IndexMap<String, Value>, RuntimeError> {
    let mut out = IndexMap::new();
    for edge in dag.predecessors(&node.id) {
        let value = values.get(&edge.producer).ok_or_else(|| RuntimeError::DataNotFound(node.name.clone()))?;
        out.insert(edge.consumer_slot.clone(), value.clone());
    }
    Ok(out)
}

/// execution engine, holding the shared (registry, cache, throttle,
/// semaphore, scheduler) resources every execution draws on. One
/// `Runtime` instance is shared across concurrent executions; none of its
/// fields are execution-specific.
pub struct Runtime {
    ctx: Ctx,
    suspension_store: Arc<dyn SuspensionStore>,
    id_gen: Arc<dyn IdGen>,
    /// One token per execution currently in `run_loop`, so `cancel` can
    /// signal it without the caller having to thread a token through
    /// `execute`/`resume` itself. Removed once the execution terminates
    /// (completed, suspended, or failed).
    cancellations: Arc<Mutex<HashMap<ExecutionId, CancellationToken>>>,
}

impl Runtime {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        scheduler: Scheduler,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
        suspension_store: Arc<dyn SuspensionStore>,
    ) -> Self {
        Self::with_cache_backends(registry, scheduler, clock, id_gen, suspension_store, Vec::new())
    }

    /// Like `new`, but additionally registers named cache backends up front — `"memory"` is always available and
    /// cannot be overridden.
    pub fn with_cache_backends(
        registry: Arc<ModuleRegistry>,
        scheduler: Scheduler,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
        suspension_store: Arc<dyn SuspensionStore>,
        cache_backends: Vec<(String, Arc<dyn CacheBackend>)>,
    ) -> Self {
        let mut caches = CacheRegistry::new(clock);
        for (name, backend) in cache_backends {
            caches.register(name, backend);
        }
        Self {
            ctx: Ctx {
                registry,
                scheduler,
                caches: Arc::new(caches),
                semaphores: Arc::new(NamedSemaphores::new()),
                throttle: Arc::new(Throttle::new()),
                single_flight: Arc::new(SingleFlightGroup::new()),
            },
            suspension_store,
            id_gen,
            cancellations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Requests cancellation of `execution_id`. Cooperative: in-flight
    /// module calls observe the token at their next suspension point
    /// (throttle/semaphore wait, retry backoff, timeout) and the loop stops
    /// scheduling new work once it notices the request, after which the
    /// execution suspends like any other incomplete run. Returns `false`
    /// if no execution with that id is currently running.
    pub fn cancel(&self, execution_id: &ExecutionId) -> bool {
        match self.cancellations.lock().get(execution_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Execute: runs `dag` fresh against `inputs`.
    pub async fn execute(&self, dag: &Dag, inputs: IndexMap<String, Value>) -> ExecutionResult {
        let execution_id = ExecutionId::new(self.id_gen.next());
        let mut values: HashMap<NodeId, Value> = HashMap::new();
        let mut statuses: HashMap<NodeId, NodeStatus> = HashMap::new();

        for node in &dag.nodes {
            if matches!(node.kind, NodeKind::Input) {
                match inputs.get(&node.name) {
                    Some(v) => {
                        values.insert(node.id.clone(), v.clone());
                        statuses.insert(node.id.clone(), NodeStatus::Completed);
                    }
                    None => {
                        statuses.insert(node.id.clone(), NodeStatus::Pending);
                    }
                }
            } else {
                statuses.insert(node.id.clone(), NodeStatus::Pending);
            }
        }

        self.run_loop(dag, execution_id, values, statuses, 0).await
    }

    /// Resume: restores a suspended execution, merges `additional_inputs`
    /// and `resolved_nodes`, and re-enters the loop.
    pub async fn resume(
        &self,
        dag: &Dag,
        execution_id: &ExecutionId,
        additional_inputs: IndexMap<String, Value>,
        resolved_nodes: IndexMap<String, Value>,
    ) -> ExecutionResult {
        if let Err(err) = self.suspension_store.mark_resuming(execution_id).await {
            return ExecutionResult {
                execution_id: execution_id.clone(),
                resumption_count: 0,
                outcome: ExecutionOutcome::Failed { error: RuntimeError::ResumeInProgress(err.to_string()) },
            };
        }

        let suspended = match self.suspension_store.load(execution_id).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                let _ = self.suspension_store.clear_resuming(execution_id).await;
                return ExecutionResult {
                    execution_id: execution_id.clone(),
                    resumption_count: 0,
                    outcome: ExecutionOutcome::Failed { error: RuntimeError::ExecutionNotFound(execution_id.to_string()) },
                };
            }
            Err(err) => {
                let _ = self.suspension_store.clear_resuming(execution_id).await;
                return ExecutionResult {
                    execution_id: execution_id.clone(),
                    resumption_count: 0,
                    outcome: ExecutionOutcome::Failed {
                        error: RuntimeError::ModuleExecution { module: "<suspension-store>".to_string(), message: err.to_string() },
                    },
                };
            }
        };

        let mut values: HashMap<NodeId, Value> = HashMap::new();
        for (id, stored) in suspended.values {
            match stored.decode() {
                Ok(v) => {
                    values.insert(id, v);
                }
                Err(err) => {
                    let _ = self.suspension_store.clear_resuming(execution_id).await;
                    return ExecutionResult {
                        execution_id: execution_id.clone(),
                        resumption_count: suspended.resumption_count,
                        outcome: ExecutionOutcome::Failed {
                            error: RuntimeError::InputValidation { path: id.to_string(), expected: "decodable value".into(), actual: err.to_string() },
                        },
                    };
                }
            }
        }
        let mut statuses = suspended.statuses;

        for (name, value) in additional_inputs {
            let Some(node) = dag.node_by_name(&name) else { continue };
            if !is_subtype(&value.type_of(), &node.output_type) {
                let _ = self.suspension_store.clear_resuming(execution_id).await;
                return ExecutionResult {
                    execution_id: execution_id.clone(),
                    resumption_count: suspended.resumption_count,
                    outcome: ExecutionOutcome::Failed {
                        error: RuntimeError::InputValidation {
                            path: name,
                            expected: node.output_type.to_string(),
                            actual: value.type_of().to_string(),
                        },
                    },
                };
            }
            values.insert(node.id.clone(), value);
            statuses.insert(node.id.clone(), NodeStatus::Completed);
        }

        for (name, value) in resolved_nodes {
            let Some(node) = dag.node_by_name(&name) else { continue };
            values.insert(node.id.clone(), value);
            statuses.insert(node.id.clone(), NodeStatus::Completed);
        }

        let resumption_count = suspended.resumption_count + 1;
        let result = self.run_loop(dag, execution_id.clone(), values, statuses, resumption_count).await;
        let _ = self.suspension_store.clear_resuming(execution_id).await;
        result
    }

    /// steps 2-4: compute the ready set, submit it, merge results,
    /// repeat; suspend or complete once it empties out. Also the sole
    /// point that registers this execution's `CancellationToken` so
    /// `cancel` can reach it, and the sole point that removes it again.
    async fn run_loop(
        &self,
        dag: &Dag,
        execution_id: ExecutionId,
        values: HashMap<NodeId, Value>,
        statuses: HashMap<NodeId, NodeStatus>,
        resumption_count: u32,
    ) -> ExecutionResult {
        let token = CancellationToken::new();
        self.cancellations.lock().insert(execution_id.clone(), token.clone());
        let result = self.run_loop_inner(dag, execution_id.clone(), values, statuses, resumption_count, &token).await;
        self.cancellations.lock().remove(&execution_id);
        result
    }

    #[allow(clippy::expect_used)]
    async fn run_loop_inner(
        &self,
        dag: &Dag,
        execution_id: ExecutionId,
        mut values: HashMap<NodeId, Value>,
        mut statuses: HashMap<NodeId, NodeStatus>,
        resumption_count: u32,
        token: &CancellationToken,
    ) -> ExecutionResult {
        let dag_owned = Arc::new(dag.clone());
        loop {
            if token.is_cancelled() {
                break;
            }
            let ready = compute_ready(dag, &statuses);
            if ready.is_empty() {
                break;
            }
            for id in &ready {
                statuses.insert(id.clone(), NodeStatus::Running);
            }

            let snapshot = Arc::new(values.clone());
            let mut tasks = tokio::task::JoinSet::new();
            for id in &ready {
                let node = dag.node(id).expect("ready node exists in dag").clone();
                let ctx = self.ctx.clone();
                let dag_for_task = dag_owned.clone();
                let values_for_task = snapshot.clone();
                let id_for_task = id.clone();
                let token_for_task = token.clone();
                tasks.spawn(async move {
                        let result = ctx.run_node(&dag_for_task, &node, &values_for_task, &token_for_task).await;
                        (id_for_task, result)
                });
            }

            let mut fatal: Option<RuntimeError> = None;
            let mut any_cancelled = false;
            while let Some(joined) = tasks.join_next().await {
                let (id, result) = match joined {
                    Ok(pair) => pair,
                    Err(join_err) => (
                        NodeId::new(String::new()),
                        Err(RuntimeError::ModuleExecution { module: "<task>".to_string(), message: join_err.to_string() }),
                    ),
                };
                match result {
                    Ok(v) => {
                        values.insert(id.clone(), v);
                        statuses.insert(id, NodeStatus::Completed);
                    }
                    Err(RuntimeError::Cancelled(_)) => {
                        // Reverts to `Pending` rather than `Failed`: a
                        // cancelled execution suspends like any other
                        // incomplete run and can be resumed later.
                        statuses.insert(id, NodeStatus::Pending);
                        any_cancelled = true;
                    }
                    Err(err) => {
                        statuses.insert(id, NodeStatus::Failed);
                        if fatal.is_none() {
                            fatal = Some(err);
                        }
                    }
                }
            }
            if let Some(error) = fatal {
                return ExecutionResult { execution_id, resumption_count, outcome: ExecutionOutcome::Failed { error } };
            }
            if any_cancelled || token.is_cancelled() {
                break;
            }
        }

        let all_terminal = dag.nodes.iter().all(|n| {
                matches!(
                    statuses.get(&n.id),
                    Some(NodeStatus::Completed) | Some(NodeStatus::Skipped) | Some(NodeStatus::Failed)
                )
        });

        if all_terminal {
            let mut outputs = IndexMap::new();
            for node in &dag.nodes {
                if matches!(node.kind, NodeKind::Output) {
                    if let Some(v) = values.get(&node.id) {
                        outputs.insert(node.name.clone(), v.clone());
                    }
                }
            }
            ExecutionResult { execution_id, resumption_count, outcome: ExecutionOutcome::Completed { outputs } }
        } else {
            let mut missing_inputs = IndexMap::new();
            for node in &dag.nodes {
                if matches!(node.kind, NodeKind::Input) && statuses.get(&node.id) == Some(&NodeStatus::Pending) {
                    missing_inputs.insert(node.name.clone(), node.output_type.clone());
                }
            }
            let mut pending_outputs = Vec::new();
            for node in &dag.nodes {
                if matches!(node.kind, NodeKind::Output) && statuses.get(&node.id) != Some(&NodeStatus::Completed) {
                    pending_outputs.push(node.name.clone());
                }
            }
            let mut outputs = IndexMap::new();
            for node in &dag.nodes {
                if matches!(node.kind, NodeKind::Output) {
                    if let Some(v) = values.get(&node.id) {
                        outputs.insert(node.name.clone(), v.clone());
                    }
                }
            }

            let stored_values = values.iter().map(|(id, v)| (id.clone(), StoredValue::encode(v))).collect();
            let suspended = SuspendedExecution {
                execution_id: execution_id.clone(),
                dag_structural_hash: dflow_compile::structural_hash(dag),
                values: stored_values,
                statuses: statuses.clone(),
                resumption_count,
                missing_inputs: missing_inputs.clone(),
                pending_outputs: pending_outputs.clone(),
                created_at_millis: SuspendedExecution::now_millis(),
            };
            if let Err(err) = self.suspension_store.save(suspended).await {
                return ExecutionResult {
                    execution_id,
                    resumption_count,
                    outcome: ExecutionOutcome::Failed {
                        error: RuntimeError::ModuleExecution { module: "<suspension-store>".to_string(), message: err.to_string() },
                    },
                };
            }

            ExecutionResult {
                execution_id,
                resumption_count,
                outcome: ExecutionOutcome::Suspended { outputs, missing_inputs, pending_outputs },
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
