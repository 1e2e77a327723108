// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! module record: an immutable, typed host function.

use async_trait::async_trait;
use dflow_core::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

use dflow_core::Type;

/// Major/minor version of a registered module. Registration never mutates
/// a signature in place; a new version is a new catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Descriptive metadata that does not affect type checking.
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    pub description: String,
    pub documentation: String,
    /// Example argument values, keyed by input slot name.
    pub examples: HashMap<String, Vec<Value>>,
}

/// A lambda argument, already reduced to a plain
/// callable by the runtime. A compiled lambda only ever closes over its
/// own parameter and literals, so the runtime can always reduce it to
/// this shape before a higher-order module ever sees it — the module
/// never touches the pipeline language's AST.
pub type LambdaFn = std::sync::Arc<dyn Fn(Value) -> Result<Value, ModuleInvokeError> + Send + Sync>;

/// The opaque host-language implementation behind a module. Invoked inside
/// the runtime's scheduling context (a task on the host concurrency
/// runtime), so it is async and must not block the executor thread.
#[async_trait]
pub trait ModuleImpl: Send + Sync {
    async fn invoke(
        &self,
        consumed: IndexMap<String, Value>,
    ) -> Result<IndexMap<String, Value>, ModuleInvokeError>;

    /// Invoked instead of `invoke` when the call site supplied one or more
    /// lambda arguments, keyed by the consumed slot name they were passed
    /// for. Defaults to plain `invoke` (ignoring `lambdas`), so every
    /// module that isn't higher-order needs no changes; `filter`/`map`-like
    /// modules override this to call back into `lambdas`.
    async fn invoke_with_lambdas(
        &self,
        consumed: IndexMap<String, Value>,
        lambdas: &HashMap<String, LambdaFn>,
    ) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        let _ = lambdas;
        self.invoke(consumed).await
    }
}

/// An error surfaced from inside a module body. Distinct from the
/// engine-level `RuntimeError` — this is what retry/fallback/on_error
/// policies observe per attempt.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ModuleInvokeError {
    pub message: String,
    pub transient: bool,
}

impl ModuleInvokeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }
}

/// A registered, typed, immutable function.
pub struct Module {
    pub qualified_name: String,
    pub version: ModuleVersion,
    pub consumes: IndexMap<String, Type>,
    pub produces: IndexMap<String, Type>,
    pub implementation: Box<dyn ModuleImpl>,
    pub tags: Vec<String>,
    pub metadata: ModuleMetadata,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
        .field("qualified_name", &self.qualified_name)
        .field("version", &self.version)
        .field("consumes", &self.consumes)
        .field("produces", &self.produces)
        .field("tags", &self.tags)
        .finish_non_exhaustive()
    }
}

impl Module {
    /// The return type a call site sees. For now a module always produces
    /// exactly the `produces` shape as a single record; multi-output
    /// modules are consumed by projecting individual output slots.
    pub fn return_type(&self) -> Type {
        Type::Product(self.produces.clone())
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
