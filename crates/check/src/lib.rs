// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! the bidirectional type checker. Consumes a `ResolvedPipeline` from
//! `dflow-resolve` and a `ModuleRegistry` from `dflow-registry`; produces a
//! `TypedPipeline` (`dflow-compile`'s input) plus the diagnostic catalog.
//!
//! `SemType` is this crate's compile-time-only type representation — it
//! extends `dflow_core::Type` with `Nothing`, `Function`, and the row-
//! polymorphic `OpenProduct` needed to check higher-order module calls, none
//! of which may leak into the runtime's closed `Type`.

mod checker;
mod error;
mod ir;
mod options;
mod row;
mod semtype;
mod subtype;

pub use checker::check_pipeline;
pub use error::CheckError;
pub use ir::{
    TypedAssignment, TypedExpr, TypedExprKind, TypedInput, TypedInterpPart, TypedOutput, TypedPipeline,
};
pub use options::{check_options, CallOptions};
pub use row::{RowEnv, RowVar};
pub use semtype::SemType;
pub use subtype::{is_subtype, join};
