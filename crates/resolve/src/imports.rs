// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace import extraction: `use` declarations, in file order,
//! become the candidate prefixes the checker/registry try for unqualified
//! module references.

use dflow_syntax::{Item, Pipeline};

/// A `use` import, ready to hand to `dflow_registry::NamespaceImport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub namespace: String,
    pub alias: Option<String>,
}

/// Collects `use` declarations in declaration order.
pub fn collect(pipeline: &Pipeline) -> Vec<Import> {
    pipeline
    .items
    .iter()
    .filter_map(|item| match item {
            Item::Use(u) => Some(Import {
                    namespace: u.namespace.clone(),
                    alias: u.alias.clone(),
            }),
            _ => None,
    })
    .collect()
}
