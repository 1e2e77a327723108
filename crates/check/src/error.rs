// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal unification/row errors. The checker translates every
//! `CheckError` into a `dflow_syntax::Diagnostic` with the code catalog
//! before it leaves this crate — nothing here is surfaced directly.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("no field `{field}` in {shape}")]
    UndefinedField { field: String, shape: String },
    #[error("row {row} occurs within the type bound to field `{field}`")]
    OccursCheck { row: String, field: String },
}
