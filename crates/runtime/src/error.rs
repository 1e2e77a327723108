// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! runtime error taxonomy: everything an execution or resumption can
//! fail with, on top of the compile-time codes `dflow-check`/`dflow-compile`
//! already own.

use thiserror::Error;

/// A single retry attempt's outcome, kept for `RetryExhausted`'s history.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub number: u32,
    pub error: String,
}

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("module `{0}` is not registered")]
    ModuleNotFound(String),

    #[error("module `{module}` failed: {message}")]
    ModuleExecution { module: String, message: String },

    #[error("input validation error at {path}: expected {expected}, found {actual}")]
    InputValidation {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("cycle detected: {}",.cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    #[error("no data for node `{0}`")]
    DataNotFound(String),

    #[error("runtime has not been initialized with a pipeline image")]
    RuntimeNotInitialized,

    #[error("scheduler queue is full")]
    QueueFull,

    #[error("runtime is shutting down")]
    ShuttingDown,

    #[error("execution `{0}` is already being resumed")]
    ResumeInProgress(String),

    #[error("circuit open for module `{0}`")]
    CircuitOpen(String),

    #[error("module `{module}` timed out after {attempts} attempt(s): {}",.history.iter().map(|a| a.error.clone()).collect::<Vec<_>>().join("; "))]
    RetryExhausted {
        module: String,
        attempts: u32,
        history: Vec<Attempt>,
    },

    #[error("execution `{0}` not found")]
    ExecutionNotFound(String),

    #[error("module `{module}` timed out")]
    ModuleTimeout { module: String },

    #[error("execution `{0}` was cancelled")]
    Cancelled(String),
}

impl From<dflow_compile::CompileError> for RuntimeError {
    fn from(err: dflow_compile::CompileError) -> Self {
        match err {
            dflow_compile::CompileError::CycleDetected { cycle } => RuntimeError::CycleDetected { cycle },
            dflow_compile::CompileError::ModuleNotFound(name) => RuntimeError::ModuleNotFound(name),
            other => RuntimeError::ModuleExecution {
                module: "<compile>".to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<dflow_registry::RegistryError> for RuntimeError {
    fn from(err: dflow_registry::RegistryError) -> Self {
        RuntimeError::ModuleNotFound(err.to_string())
    }
}
