// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compiler errors. A compile either produces a `Dag` or a single
//! `CompileError` — unlike the front end, the compiler does not
//! accumulate multiple diagnostics because it only ever runs once the
//! checker has already produced a fatal-diagnostic-free `TypedPipeline`.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("cycle detected: {}",.cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    #[error("undefined variable `{0}` referenced during lowering")]
    UndefinedVariable(String),

    #[error("module `{0}` referenced by the typed IR is no longer in the registry")]
    ModuleNotFound(String),

    #[error("ambiguous module reference `{name}`: candidates {candidates:?}")]
    AmbiguousReference { name: String, candidates: Vec<String> },

    #[error(
            "type of `{name}` is not closed (contains Nothing, a function type, or an open row) \
 and cannot be lowered into the DAG's runtime type"
    )]
    OpenTypeEscaped { name: String },

    #[error("lambda argument to `{module}` closes over `{var}`, which is neither its own parameter nor a literal")]
    LambdaClosureNotSupported { module: String, var: String },
}

impl From<dflow_registry::RegistryError> for CompileError {
    fn from(err: dflow_registry::RegistryError) -> Self {
        match err {
            dflow_registry::RegistryError::ModuleNotFound(name) => CompileError::ModuleNotFound(name),
            dflow_registry::RegistryError::AmbiguousReference { name, candidates } => {
                CompileError::AmbiguousReference { name, candidates }
            }
            other => CompileError::ModuleNotFound(other.to_string()),
        }
    }
}
