// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates_long_ids() {
    let id = TestId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
}

#[test]
fn short_is_noop_for_short_ids() {
    let id = TestId::new("abc");
    assert_eq!(id.short(8), "abc");
}

#[test]
fn sequential_id_gen_increments() {
    let gen = SequentialIdGen::new("exec");
    assert_eq!(gen.next(), "exec-1");
    assert_eq!(gen.next(), "exec-2");
}

#[test]
fn sequential_id_gen_clones_share_counter() {
    let gen = SequentialIdGen::new("exec");
    let clone = gen.clone();
    assert_eq!(gen.next(), "exec-1");
    assert_eq!(clone.next(), "exec-2");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
