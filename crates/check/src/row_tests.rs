// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn records_and_reads_back_field_accesses() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    env.record_field_access(row, "active", SemType::Bool).unwrap();
    let fields = env.resolved_fields(row);
    assert_eq!(fields.get("active"), Some(&SemType::Bool));
}

#[test]
fn repeated_consistent_access_is_accepted() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    env.record_field_access(row, "n", SemType::Int).unwrap();
    assert!(env.record_field_access(row, "n", SemType::Int).is_ok());
}

#[test]
fn inconsistent_repeated_access_fails() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    env.record_field_access(row, "n", SemType::Int).unwrap();
    assert!(env.record_field_access(row, "n", SemType::Bool).is_err());
}

#[test]
fn unifies_against_a_closed_record_with_extra_fields() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    env.record_field_access(row, "active", SemType::Bool).unwrap();
    let mut closed = IndexMap::new();
    closed.insert("active".to_string(), SemType::Bool);
    closed.insert("name".to_string(), SemType::String);
    assert!(env.unify_open_with_closed(row, &closed).is_ok());
}

#[test]
fn unify_fails_when_closed_record_lacks_accessed_field() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    env.record_field_access(row, "missing", SemType::Int).unwrap();
    let closed = IndexMap::new();
    assert!(env.unify_open_with_closed(row, &closed).is_err());
}

#[test]
fn occurs_check_rejects_self_referential_binding() {
    let mut env = RowEnv::new();
    let row = env.fresh();
    let self_referential = SemType::OpenProduct(IndexMap::new(), row);
    assert!(env.record_field_access(row, "self", self_referential).is_err());
}
