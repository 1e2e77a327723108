// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row polymorphism: a fresh row variable is allocated per lambda
//! parameter; each field access against the lambda's parameter grows the
//! row's known fields. At the call site the accumulated row is unified
//! against the concrete record flowing in from a sibling argument — first-
//! order, with an occur-check against re-entering the same row.

use crate::error::CheckError;
use crate::semtype::SemType;
use crate::subtype::is_subtype;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RowVar(u32);

impl RowVar {
    #[cfg(test)]
    pub(crate) fn from_raw(id: u32) -> Self {
        RowVar(id)
    }
}

impl fmt::Display for RowVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{03c1}{}", self.0)
    }
}

/// Allocator and field-binding table for row variables live during one
/// checker pass; a row variable never escapes the pass that created it.
#[derive(Debug, Default)]
pub struct RowEnv {
    next: u32,
    known: HashMap<RowVar, IndexMap<String, SemType>>,
}

impl RowEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> RowVar {
        let var = RowVar(self.next);
        self.next += 1;
        self.known.insert(var, IndexMap::new());
        var
    }

    /// Records that the lambda parameter carrying row `row` is field-
    /// accessed at `field` with inferred type `ty`. A second access to a
    /// field already bound must agree, or unification fails.
    pub fn record_field_access(
        &mut self,
        row: RowVar,
        field: &str,
        ty: SemType,
    ) -> Result<(), CheckError> {
        if Self::occurs(row, &ty) {
            return Err(CheckError::OccursCheck {
                    row: row.to_string(),
                    field: field.to_string(),
            });
        }
        let fields = self.known.entry(row).or_default();
        match fields.get(field) {
            Some(existing) if *existing != ty => Err(CheckError::TypeMismatch {
                    expected: existing.to_string(),
                    found: ty.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                fields.insert(field.to_string(), ty);
                Ok(())
            }
        }
    }

    pub fn resolved_fields(&self, row: RowVar) -> IndexMap<String, SemType> {
        self.known.get(&row).cloned().unwrap_or_default()
    }

    /// Unifies an open row against a concrete (closed) record: every field
    /// the row is known to need must be present in `closed` with an
    /// identical or more general type.
    pub fn unify_open_with_closed(
        &self,
        row: RowVar,
        closed: &IndexMap<String, SemType>,
    ) -> Result<(), CheckError> {
        for (field, expected) in self.resolved_fields(row) {
            match closed.get(&field) {
                Some(actual) if is_subtype(actual, &expected) => {}
                Some(actual) => {
                    return Err(CheckError::TypeMismatch {
                            expected: expected.to_string(),
                            found: actual.to_string(),
                    })
                }
                None => {
                    return Err(CheckError::UndefinedField {
                            field,
                            shape: SemType::Product(closed.clone()).to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// True if `row` occurs free within `ty` — prevents binding a row to a
    /// type that mentions itself, which would otherwise unify forever.
    fn occurs(row: RowVar, ty: &SemType) -> bool {
        match ty {
            SemType::OpenProduct(fields, r) => {
                *r == row || fields.values().any(|t| Self::occurs(row, t))
            }
            SemType::List(t) | SemType::Optional(t) => Self::occurs(row, t),
            SemType::Map(k, v) => Self::occurs(row, k) || Self::occurs(row, v),
            SemType::Product(fields) | SemType::Union(fields) => {
                fields.values().any(|t| Self::occurs(row, t))
            }
            SemType::Function(params, ret) => {
                params.iter().any(|t| Self::occurs(row, t)) || Self::occurs(row, ret)
            }
            SemType::String | SemType::Int | SemType::Float | SemType::Bool | SemType::Nothing => {
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
