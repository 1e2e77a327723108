// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bare_hex64_is_a_hash_reference() {
    assert!(is_hash_reference(&"a".repeat(64)));
}

#[test]
fn sha256_prefixed_hex64_is_a_hash_reference() {
    assert!(is_hash_reference(&format!("sha256:{}", "b".repeat(64))));
}

#[test]
fn short_or_non_hex_strings_are_not_hash_references() {
    assert!(!is_hash_reference("latest"));
    assert!(!is_hash_reference(&"a".repeat(63)));
    assert!(!is_hash_reference(&"g".repeat(64)));
}

#[test]
fn strip_hash_prefix_removes_sha256_only() {
    let hash = "c".repeat(64);
    assert_eq!(strip_hash_prefix(&format!("sha256:{hash}")), hash);
    assert_eq!(strip_hash_prefix(&hash), hash);
    assert_eq!(strip_hash_prefix("my-alias"), "my-alias");
}
