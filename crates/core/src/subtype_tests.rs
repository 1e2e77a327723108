// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn reflexivity_holds_for_every_shape() {
    let types = [
        Type::Int,
        Type::list(Type::String),
        Type::record([("a".to_string(), Type::Bool)]),
        Type::optional(Type::Float),
    ];
    for t in &types {
        assert!(is_subtype(t, t));
    }
}

#[test]
fn transitivity_holds_for_record_width_subtyping() {
    let wide = Type::record([
            ("a".to_string(), Type::Int),
            ("b".to_string(), Type::Bool),
            ("c".to_string(), Type::String),
    ]);
    let mid = Type::record([("a".to_string(), Type::Int), ("b".to_string(), Type::Bool)]);
    let narrow = Type::record([("a".to_string(), Type::Int)]);
    assert!(is_subtype(&wide, &mid));
    assert!(is_subtype(&mid, &narrow));
    assert!(is_subtype(&wide, &narrow));
}

#[test]
fn wider_record_is_subtype_of_narrower() {
    let wide = Type::record([
            ("a".to_string(), Type::Int),
            ("b".to_string(), Type::Bool),
    ]);
    let narrow = Type::record([("a".to_string(), Type::Int)]);
    assert!(is_subtype(&wide, &narrow));
    assert!(!is_subtype(&narrow, &wide));
}

#[test]
fn primitive_subtyping_has_no_numeric_promotion() {
    assert!(!is_subtype(&Type::Int, &Type::Float));
}

#[test]
fn list_subtyping_is_covariant() {
    let narrow = Type::record([("a".to_string(), Type::Int)]);
    let wide = Type::record([
            ("a".to_string(), Type::Int),
            ("b".to_string(), Type::Bool),
    ]);
    assert!(is_subtype(&Type::list(wide), &Type::list(narrow)));
}

#[test]
fn map_subtyping_is_invariant_in_key_covariant_in_value() {
    let narrow = Type::record([("a".to_string(), Type::Int)]);
    let wide = Type::record([
            ("a".to_string(), Type::Int),
            ("b".to_string(), Type::Bool),
    ]);
    assert!(is_subtype(
            &Type::map(Type::String, wide),
            &Type::map(Type::String, narrow)
    ));
    assert!(!is_subtype(
            &Type::map(Type::Int, Type::String),
            &Type::map(Type::String, Type::String)
    ));
}

#[test]
fn union_member_is_subtype_of_whole_union() {
    let u = Type::union([("ok".to_string(), Type::Int), ("err".to_string(), Type::String)]);
    assert!(is_subtype(&Type::Int, &u));
    assert!(!is_subtype(&Type::Bool, &u));
}

#[test]
fn union_is_subtype_of_t_only_if_every_member_is() {
    let u = Type::union([("a".to_string(), Type::Int), ("b".to_string(), Type::Int)]);
    assert!(is_subtype(&u, &Type::Int));
    let mixed = Type::union([("a".to_string(), Type::Int), ("b".to_string(), Type::Bool)]);
    assert!(!is_subtype(&mixed, &Type::Int));
}

#[test]
fn join_of_records_is_the_common_field_intersection() {
    let a = Type::record([
            ("x".to_string(), Type::Int),
            ("y".to_string(), Type::Bool),
    ]);
    let b = Type::record([
            ("x".to_string(), Type::Int),
            ("z".to_string(), Type::String),
    ]);
    let joined = join(&a, &b);
    assert_eq!(joined, Type::record([("x".to_string(), Type::Int)]));
}

#[test]
fn join_of_disjoint_primitives_is_a_union() {
    let joined = join(&Type::Int, &Type::String);
    assert!(matches!(joined, Type::Union(_)));
}

#[test]
fn join_of_identical_types_is_reflexive() {
    assert_eq!(join(&Type::Int, &Type::Int), Type::Int);
}
