// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! boundary JSON encoding/decoding. Decoding is strict: a JSON number
//! with a fractional part is never accepted for an `Int` slot, and an
//! object missing a required field is reported with the offending path
//! rather than silently defaulted.

use crate::error::CoreError;
use crate::types::Type;
use crate::value::Value;
use serde_json::{Number, Value as Json};

/// Encodes a `Value` to the boundary JSON model. Infallible: every
/// `Value` has exactly one JSON representation.
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Bool(b) => Json::Bool(*b),
        Value::List { elements,.. } => Json::Array(elements.iter().map(encode_value).collect()),
        Value::Map { entries,.. } => Json::Array(
            entries
            .iter()
            .map(|(k, v)| Json::Array(vec![encode_value(k), encode_value(v)]))
            .collect(),
        ),
        Value::Record { fields,.. } => {
            let mut obj = serde_json::Map::new();
            for (name, v) in fields {
                obj.insert(name.clone(), encode_value(v));
            }
            Json::Object(obj)
        }
        Value::Union { payload, tag,.. } => {
            let mut obj = serde_json::Map::new();
            obj.insert("tag".to_string(), Json::String(tag.clone()));
            obj.insert("value".to_string(), encode_value(payload));
            Json::Object(obj)
        }
        Value::Some { inner,.. } => encode_value(inner),
        Value::None {.. } => Json::Null,
    }
}

/// Decodes JSON into a `Value` checked against the expected `Type`,
/// strictly: no implicit coercion between JSON number subkinds, and a
/// missing record field surfaces `InputValidation` with the offending
/// dotted path.
pub fn decode_value(json: &Json, ty: &Type) -> Result<Value, CoreError> {
    decode_at(json, ty, "$")
}

fn decode_at(json: &Json, ty: &Type, path: &str) -> Result<Value, CoreError> {
    match ty {
        Type::String => match json {
            Json::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(path, ty, other)),
        },
        Type::Int => match json {
            Json::Number(n) if n.is_i64() || n.is_u64() => {
                Ok(Value::Int(n.as_i64().unwrap_or_default()))
            }
            other => Err(mismatch(path, ty, other)),
        },
        Type::Float => match json {
            Json::Number(n) => Ok(Value::Float(n.as_f64().unwrap_or_default())),
            other => Err(mismatch(path, ty, other)),
        },
        Type::Bool => match json {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(mismatch(path, ty, other)),
        },
        Type::List(elem) => match json {
            Json::Array(items) => {
                let elements = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_at(item, elem, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List {
                        elements,
                        element_type: (**elem).clone(),
                })
            }
            other => Err(mismatch(path, ty, other)),
        },
        Type::Map(key_ty, value_ty) => match json {
            Json::Array(pairs) => {
                let entries = pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| match pair {
                        Json::Array(kv) if kv.len() == 2 => {
                            let k = decode_at(&kv[0], key_ty, &format!("{path}[{i}][0]"))?;
                            let v = decode_at(&kv[1], value_ty, &format!("{path}[{i}][1]"))?;
                            Ok((k, v))
                        }
                        other => Err(mismatch(&format!("{path}[{i}]"), ty, other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Map {
                        entries,
                        key_type: (**key_ty).clone(),
                        value_type: (**value_ty).clone(),
                })
            }
            other => Err(mismatch(path, ty, other)),
        },
        Type::Optional(inner) => match json {
            Json::Null => Ok(Value::None {
                    inner_type: (**inner).clone(),
            }),
            other => Ok(Value::Some {
                    inner: Box::new(decode_at(other, inner, path)?),
                    inner_type: (**inner).clone(),
            }),
        },
        Type::Product(shape) => match json {
            Json::Object(obj) => {
                let mut fields = indexmap::IndexMap::new();
                for (name, field_ty) in shape {
                    let field_path = format!("{path}.{name}");
                    let field_json = obj.get(name).ok_or_else(|| CoreError::InputValidation {
                            path: field_path.clone(),
                            expected: field_ty.clone(),
                            actual: "<missing>".to_string(),
                    })?;
                    fields.insert(name.clone(), decode_at(field_json, field_ty, &field_path)?);
                }
                Ok(Value::Record {
                        fields,
                        shape: shape.clone(),
                })
            }
            other => Err(mismatch(path, ty, other)),
        },
        Type::Union(members) => match json {
            Json::Object(obj) => {
                let tag = obj
                .get("tag")
                .and_then(Json::as_str)
                .ok_or_else(|| CoreError::InputValidation {
                        path: format!("{path}.tag"),
                        expected: Type::String,
                        actual: "<missing>".to_string(),
                })?;
                let member_ty = members.get(tag).ok_or_else(|| CoreError::InputValidation {
                        path: format!("{path}.tag"),
                        expected: ty.clone(),
                        actual: format!("unknown tag `{tag}`"),
                })?;
                let value_json = obj.get("value").unwrap_or(&Json::Null);
                let payload = decode_at(value_json, member_ty, &format!("{path}.value"))?;
                Ok(Value::Union {
                        payload: Box::new(payload),
                        shape: members.clone(),
                        tag: tag.to_string(),
                })
            }
            other => Err(mismatch(path, ty, other)),
        },
    }
}

fn mismatch(path: &str, expected: &Type, actual: &Json) -> CoreError {
    CoreError::InputValidation {
        path: path.to_string(),
        expected: expected.clone(),
        actual: describe(actual),
    }
}

fn describe(json: &Json) -> String {
    match json {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "boolean".to_string(),
        Json::Number(n) if n.is_f64() => "float".to_string(),
        Json::Number(_) => "integer".to_string(),
        Json::String(_) => "string".to_string(),
        Json::Array(_) => "array".to_string(),
        Json::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
