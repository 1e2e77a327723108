// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the value/type model itself: injection/extraction at
//! the host boundary and the JSON codec.

use crate::types::Type;
use thiserror::Error;

/// Errors raised converting between host values and `Value`, or decoding
/// the boundary JSON model.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("type mismatch: expected {expected}, found value that does not match it")]
    TypeMismatch { expected: Type },
    #[error("input validation error at {path}: expected {expected}, found {actual}")]
    InputValidation {
        path: String,
        expected: Type,
        actual: String,
    },
}
