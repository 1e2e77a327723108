// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! runtime `Value` — the tagged sum every module invocation consumes
//! and produces.

use crate::types::Type;
use indexmap::IndexMap;

/// A runtime value. Carries enough type information (`element_type`,
/// `shape`,...) to reconstruct its `Type` even when empty,
/// invariant that `List`/`Map`/`Optional` retain their element/key/value
/// types.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List {
        elements: Vec<Value>,
        element_type: Type,
    },
    Map {
        entries: Vec<(Value, Value)>,
        key_type: Type,
        value_type: Type,
    },
    Record {
        fields: IndexMap<String, Value>,
        shape: IndexMap<String, Type>,
    },
    Union {
        payload: Box<Value>,
        shape: IndexMap<String, Type>,
        tag: String,
    },
    Some {
        inner: Box<Value>,
        inner_type: Type,
    },
    None {
        inner_type: Type,
    },
}

impl Value {
    pub fn record<F, S>(fields: F, shape: S) -> Value
    where
    F: IntoIterator<Item = (String, Value)>,
    S: IntoIterator<Item = (String, Type)>,
    {
        Value::Record {
            fields: fields.into_iter().collect(),
            shape: shape.into_iter().collect(),
        }
    }

    /// Reconstructs this value's `Type`. Never fails: every `Value`
    /// variant carries enough type metadata to answer unambiguously.
    pub fn type_of(&self) -> Type {
        match self {
            Value::String(_) => Type::String,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::List { element_type,.. } => Type::list(element_type.clone()),
            Value::Map {
                key_type,
                value_type,
                ..
            } => Type::map(key_type.clone(), value_type.clone()),
            Value::Record { shape,.. } => Type::Product(shape.clone()),
            Value::Union { shape,.. } => Type::Union(shape.clone()),
            Value::Some { inner_type,.. } => Type::optional(inner_type.clone()),
            Value::None { inner_type } => Type::optional(inner_type.clone()),
        }
    }

    #[allow(clippy::expect_used)]
    pub fn zero_value(ty: &Type) -> Value {
        match ty {
            Type::String => Value::String(String::new()),
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::List(elem) => Value::List {
                elements: Vec::new(),
                element_type: (**elem).clone(),
            },
            Type::Map(k, v) => Value::Map {
                entries: Vec::new(),
                key_type: (**k).clone(),
                value_type: (**v).clone(),
            },
            Type::Optional(inner) => Value::None {
                inner_type: (**inner).clone(),
            },
            Type::Product(shape) => {
                let fields = shape
                .iter()
                .map(|(name, field_ty)| (name.clone(), Value::zero_value(field_ty)))
                .collect();
                Value::Record {
                    fields,
                    shape: shape.clone(),
                }
            }
            Type::Union(members) => {
                // Zero value of a union is the zero value of its first member,
                // `on_error: skip` semantics.
                let (tag, member_ty) = members
                .iter()
                .next()
                .expect("union types always have at least one member");
                Value::Union {
                    payload: Box::new(Value::zero_value(member_ty)),
                    shape: members.clone(),
                    tag: tag.clone(),
                }
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (
                Value::List { elements: a,.. },
                Value::List { elements: b,.. },
            ) => a == b,
            (
                Value::Map { entries: a,.. },
                Value::Map { entries: b,.. },
            ) => {
                // Maps compare as sets of pairs, not by insertion order.
                a.len() == b.len() && a.iter().all(|pair| b.contains(pair))
            }
            (
                Value::Record { fields: a,.. },
                Value::Record { fields: b,.. },
            ) => a == b,
            (
                Value::Union {
                    payload: pa, tag: ta,..
                },
                Value::Union {
                    payload: pb, tag: tb,..
                },
            ) => ta == tb && pa == pb,
            (Value::Some { inner: a,.. }, Value::Some { inner: b,.. }) => a == b,
            (Value::None {.. }, Value::None {.. }) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
