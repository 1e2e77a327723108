// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only helpers shared across this crate's `_tests.rs` modules:
//! a hand-built DAG (bypassing the full parse/check/lower pipeline,
//! which other crates already exercise) so these tests stay focused on
//! cataloging and persistence behavior rather than compilation.

use dflow_check::CallOptions;
use dflow_compile::{Dag, Edge, Node, NodeKind, PipelineImage, VALUE_SLOT};
use dflow_core::{NodeId, Type};
use indexmap::IndexMap;

use crate::image::StoredImage;

pub(crate) fn sample_image(structural_hash: &str) -> PipelineImage {
    let input_id = NodeId::new("n0");
    let call_id = NodeId::new("n1");
    let output_id = NodeId::new("n2");

    let dag = Dag {
        nodes: vec![
            Node {
                id: input_id.clone(),
                name: "text".to_string(),
                kind: NodeKind::Input,
                input_shape: IndexMap::new(),
                output_type: Type::String,
            },
            Node {
                id: call_id.clone(),
                name: "trimmed".to_string(),
                kind: NodeKind::ModuleCall {
                    module_fqn: "stdlib.string.trim".to_string(),
                    options: CallOptions::default(),
                    lambda_args: IndexMap::new(),
                },
                input_shape: IndexMap::from([("text".to_string(), Type::String)]),
                output_type: Type::Product(IndexMap::from([("value".to_string(), Type::String)])),
            },
            Node {
                id: output_id.clone(),
                name: "trimmed".to_string(),
                kind: NodeKind::Output,
                input_shape: IndexMap::from([("value".to_string(), Type::String)]),
                output_type: Type::String,
            },
        ],
        edges: vec![
            Edge {
                producer: input_id,
                producer_slot: VALUE_SLOT.to_string(),
                consumer: call_id.clone(),
                consumer_slot: "text".to_string(),
                ty: Type::String,
            },
            Edge {
                producer: call_id,
                producer_slot: VALUE_SLOT.to_string(),
                consumer: output_id,
                consumer_slot: VALUE_SLOT.to_string(),
                ty: Type::String,
            },
        ],
    };

    PipelineImage { dag, structural_hash: structural_hash.to_string(), syntactic_hash: "syn0".to_string() }
}

pub(crate) fn sample_stored_image(structural_hash: &str) -> StoredImage {
    StoredImage::new(sample_image(structural_hash), 0)
}

/// A 64-hex-char stand-in hash, distinguished only by `seed`.
pub(crate) fn hash(seed: char) -> String {
    seed.to_string().repeat(64)
}
