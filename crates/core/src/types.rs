// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! runtime `Type` — the compile-time-erased shape every `Value` is
//! checked against at module boundaries. Compile-time-only constructs
//! (`Nothing`, function types, row variables, open records) live in
//! `dflow-check::SemType` and must never reach this type; `dflow-compile`'s
//! lowering pass asserts that invariant before a DAG is considered valid.

use indexmap::IndexMap;
use std::fmt;

/// A compile-time-erased runtime type, as carried by `Value` and checked at
/// module call boundaries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum Type {
    String,
    Int,
    Float,
    Bool,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    /// A record, keyed by field name. Field order is insignificant to
    /// equality (`IndexMap`'s `PartialEq` ignores order) but is preserved
    /// for deterministic pretty-printing and hashing elsewhere.
    Product(IndexMap<String, Type>),
    /// A tagged union, keyed by tag name.
    Union(IndexMap<String, Type>),
    Optional(Box<Type>),
}

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn record<I: IntoIterator<Item = (String, Type)>>(fields: I) -> Type {
        Type::Product(fields.into_iter().collect())
    }

    pub fn union<I: IntoIterator<Item = (String, Type)>>(members: I) -> Type {
        Type::Union(members.into_iter().collect())
    }

    /// True for the four unparameterized primitive types.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::String | Type::Int | Type::Float | Type::Bool)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => write!(f, "String"),
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Boolean"),
            Type::List(t) => write!(f, "List<{t}>"),
            Type::Map(k, v) => write!(f, "Map<{k},{v}>"),
            Type::Optional(t) => write!(f, "Optional<{t}>"),
            Type::Product(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
            Type::Union(members) => {
                for (i, (_, ty)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
