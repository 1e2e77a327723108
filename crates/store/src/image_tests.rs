// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{hash, sample_image};
use dflow_core::Type;

#[test]
fn new_derives_schema_and_module_refs_from_the_dag() {
    let stored = StoredImage::new(sample_image(&hash('a')), 1_000);

    assert_eq!(stored.input_schema.get("text"), Some(&Type::String));
    assert_eq!(stored.output_schema.get("trimmed"), Some(&Type::String));
    assert_eq!(stored.module_refs, vec!["stdlib.string.trim".to_string()]);
    assert_eq!(stored.structural_hash(), hash('a'));
    assert_eq!(stored.syntactic_hash(), "syn0");
}

#[test]
fn new_deduplicates_repeated_module_calls() {
    let mut image = sample_image(&hash('b'));
    let extra = image.dag.nodes[1].clone();
    image.dag.nodes.push(extra);
    let stored = StoredImage::new(image, 0);
    assert_eq!(stored.module_refs, vec!["stdlib.string.trim".to_string()]);
}
