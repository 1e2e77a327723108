// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! the DAG compiler. Takes a checked `dflow_check::TypedPipeline` and
//! the `dflow_registry::ModuleRegistry` it was checked against, and lowers
//! it into a `Dag` the runtime schedules layer by layer, plus the two
//! content hashes the pipeline store keys cached compiles and
//! deduplicated definitions by.

mod dag;
mod error;
mod eval;
mod hash;
mod lambda;
mod lower;

pub use dag::{Dag, Edge, Node, NodeKind, VALUE_SLOT};
pub use error::CompileError;
pub use eval::{eval, eval_lambda, merge_values, Env, EvalError};
pub use hash::{structural_hash, syntactic_hash};
pub use lambda::{free_var_outside, CompiledLambda};
pub use lower::lower;

use dflow_check::TypedPipeline;
use dflow_registry::ModuleRegistry;

/// A fully compiled pipeline: the executable `Dag` plus the two hashes
/// `dflow-store` keys its content-addressed catalog by. `structural`
/// identifies the DAG shape modulo cosmetic source differences (renamed
/// bindings, reformatted literals); `syntactic` identifies the exact
/// checked source the DAG was lowered from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineImage {
    pub dag: Dag,
    pub structural_hash: String,
    pub syntactic_hash: String,
}

/// Compiles a checked pipeline into its executable image.
pub fn compile(typed: &TypedPipeline, registry: &ModuleRegistry) -> Result<PipelineImage, CompileError> {
    let dag = lower::lower(typed, registry)?;
    let structural_hash = hash::structural_hash(&dag);
    let syntactic_hash = hash::syntactic_hash(typed);
    Ok(PipelineImage { dag, structural_hash, syntactic_hash })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
