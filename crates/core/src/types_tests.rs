// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn record_equality_ignores_field_order() {
    let a = Type::record([("x".to_string(), Type::Int), ("y".to_string(), Type::Bool)]);
    let b = Type::record([("y".to_string(), Type::Bool), ("x".to_string(), Type::Int)]);
    assert_eq!(a, b);
}

#[test]
fn display_renders_nested_generics() {
    let ty = Type::list(Type::optional(Type::Int));
    assert_eq!(ty.to_string(), "List<Optional<Int>>");
}

#[test]
fn display_renders_record_fields() {
    let ty = Type::record([("name".to_string(), Type::String)]);
    assert_eq!(ty.to_string(), "{name: String}");
}
