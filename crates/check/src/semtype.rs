// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compile-time-only semantic type: the runtime `Type` plus a bottom
//! type, function types, and row-polymorphic open records. None of the
//! three extra constructors may survive lowering back to `dflow_core::Type`
//!.

use crate::row::RowVar;
use dflow_core::Type;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SemType {
    String,
    Int,
    Float,
    Bool,
    List(Box<SemType>),
    Map(Box<SemType>, Box<SemType>),
    Optional(Box<SemType>),
    Product(IndexMap<String, SemType>),
    Union(IndexMap<String, SemType>),
    /// Subtype of every type; the type of `[]` and of expressions
    /// that never return (not otherwise reachable from this language).
    Nothing,
    /// Compile-time only: the type of a lambda immediately argued to a
    /// host-provided higher-order module.
    Function(Vec<SemType>, Box<SemType>),
    /// A record known to have at least `fields`, with the rest described by
    /// the row variable `ρ`. Only ever appears as a lambda parameter's
    /// inferred type while its body is being checked.
    OpenProduct(IndexMap<String, SemType>, RowVar),
}

impl SemType {
    pub fn list(elem: SemType) -> SemType {
        SemType::List(Box::new(elem))
    }

    pub fn optional(inner: SemType) -> SemType {
        SemType::Optional(Box::new(inner))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, SemType::String | SemType::Int | SemType::Float | SemType::Bool)
    }

    /// Lifts a closed runtime type into a `SemType` with no extra structure.
    pub fn from_runtime(ty: &Type) -> SemType {
        match ty {
            Type::String => SemType::String,
            Type::Int => SemType::Int,
            Type::Float => SemType::Float,
            Type::Bool => SemType::Bool,
            Type::List(t) => SemType::list(SemType::from_runtime(t)),
            Type::Map(k, v) => SemType::Map(
                Box::new(SemType::from_runtime(k)),
                Box::new(SemType::from_runtime(v)),
            ),
            Type::Optional(t) => SemType::optional(SemType::from_runtime(t)),
            Type::Product(fields) => SemType::Product(
                fields.iter().map(|(k, v)| (k.clone(), SemType::from_runtime(v))).collect(),
            ),
            Type::Union(members) => SemType::Union(
                members.iter().map(|(k, v)| (k.clone(), SemType::from_runtime(v))).collect(),
            ),
        }
    }

    /// Lowers a closed, row-free `SemType` back to the runtime `Type`.
    /// `None` for `Nothing`, `Function`, and `OpenProduct` — none of these
    /// may reach the DAG compiler.
    pub fn to_runtime(&self) -> Option<Type> {
        match self {
            SemType::String => Some(Type::String),
            SemType::Int => Some(Type::Int),
            SemType::Float => Some(Type::Float),
            SemType::Bool => Some(Type::Bool),
            SemType::List(t) => t.to_runtime().map(Type::list),
            SemType::Map(k, v) => Some(Type::map(k.to_runtime()?, v.to_runtime()?)),
            SemType::Optional(t) => t.to_runtime().map(Type::optional),
            SemType::Product(fields) => {
                let mut out = IndexMap::new();
                for (name, ty) in fields {
                    out.insert(name.clone(), ty.to_runtime()?);
                }
                Some(Type::Product(out))
            }
            SemType::Union(members) => {
                let mut out = IndexMap::new();
                for (tag, ty) in members {
                    out.insert(tag.clone(), ty.to_runtime()?);
                }
                Some(Type::Union(out))
            }
            SemType::Nothing | SemType::Function(..) | SemType::OpenProduct(..) => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.to_runtime().is_some()
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::String => write!(f, "String"),
            SemType::Int => write!(f, "Int"),
            SemType::Float => write!(f, "Float"),
            SemType::Bool => write!(f, "Boolean"),
            SemType::Nothing => write!(f, "Nothing"),
            SemType::List(t) => write!(f, "List<{t}>"),
            SemType::Map(k, v) => write!(f, "Map<{k},{v}>"),
            SemType::Optional(t) => write!(f, "Optional<{t}>"),
            SemType::Function(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            SemType::Product(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
            SemType::OpenProduct(fields, row) => {
                write!(f, "{{")?;
                for (name, ty) in fields {
                    write!(f, "{name}: {ty}, ")?;
                }
                write!(f, "| {row}}}")
            }
            SemType::Union(members) => {
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
#[path = "semtype_tests.rs"]
mod tests;
