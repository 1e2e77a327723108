// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StoredImage`: `dflow_compile::PipelineImage` plus the metadata the
//! pipeline store catalogs it by — input/output schema, the modules it
//! references, and when it was compiled. The image itself stays
//! nameless; `aliases` live in the alias table (`crate::alias`), not here,
//! so `put` stays idempotent on structural hash alone.

use dflow_compile::{NodeKind, PipelineImage};
use dflow_core::Type;
use indexmap::IndexMap;

/// A compiled pipeline as cataloged by the content-addressed store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredImage {
    pub image: PipelineImage,
    pub compiled_at_millis: u64,
    pub input_schema: IndexMap<String, Type>,
    pub output_schema: IndexMap<String, Type>,
    /// Fully-qualified names of every module this DAG calls, deduplicated
    /// but otherwise unordered — used by an embedding host to check a
    /// stored image still resolves against its current registry before
    /// trying to execute it.
    pub module_refs: Vec<String>,
}

impl StoredImage {
    /// Builds the catalog record for a freshly compiled image, deriving
    /// the schema and module-reference metadata from the DAG itself so
    /// callers never have to keep it in sync by hand.
    pub fn new(image: PipelineImage, compiled_at_millis: u64) -> Self {
        let mut input_schema = IndexMap::new();
        let mut output_schema = IndexMap::new();
        let mut module_refs: Vec<String> = Vec::new();

        for node in &image.dag.nodes {
            match &node.kind {
                NodeKind::Input => {
                    input_schema.insert(node.name.clone(), node.output_type.clone());
                }
                NodeKind::Output => {
                    output_schema.insert(node.name.clone(), node.output_type.clone());
                }
                NodeKind::ModuleCall { module_fqn, .. } => {
                    if !module_refs.iter().any(|m| m == module_fqn) {
                        module_refs.push(module_fqn.clone());
                    }
                }
                NodeKind::Data { .. } => {}
            }
        }

        Self {
            image,
            compiled_at_millis,
            input_schema,
            output_schema,
            module_refs,
        }
    }

    pub fn structural_hash(&self) -> &str {
        &self.image.structural_hash
    }

    pub fn syntactic_hash(&self) -> &str {
        &self.image.syntactic_hash
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
