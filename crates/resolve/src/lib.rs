// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! name resolution: type alias expansion (with cycle detection),
//! identifier binding, fuzzy "did you mean?" suggestions, and namespace
//! import ordering. Consumes the AST from `dflow-syntax`; produces a
//! `ResolvedPipeline` ready for `dflow-check`'s bidirectional checker.

mod aliases;
mod binder;
mod imports;
pub mod suggest;

pub use aliases::AliasTable;
pub use imports::Import;

use dflow_syntax::{Diagnostic, Item, Pipeline, TypeDefDecl, TypeExpr};

/// The pipeline after alias expansion and identifier binding. Carries the
/// original AST (bindings/inputs/outputs are unchanged structurally — only
/// `TypeExpr` trees have aliases inlined) plus the declaration-ordered
/// namespace imports the checker resolves module calls against.
pub struct ResolvedPipeline {
    pub pipeline: Pipeline,
    pub aliases: AliasTable,
    pub imports: Vec<Import>,
}

/// Resolves `pipeline`: expands type aliases, binds identifiers, and
/// extracts namespace imports. Returns every diagnostic found; an empty
/// diagnostic list does not by itself mean type-checking will succeed —
/// resolution only covers concerns.
pub fn resolve(pipeline: Pipeline) -> (ResolvedPipeline, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let defs: Vec<TypeDefDecl> = pipeline
    .items
    .iter()
    .filter_map(|item| match item {
            Item::TypeDef(d) => Some(d.clone()),
            _ => None,
    })
    .collect();
    let aliases = AliasTable::new(&defs);

    let items = pipeline
    .items
    .iter()
    .map(|item| expand_item(item, &aliases, &mut diagnostics))
    .collect();
    let expanded = Pipeline { items, span: pipeline.span };

    diagnostics.extend(binder::bind(&expanded));
    let imports = imports::collect(&expanded);

    (
        ResolvedPipeline {
            pipeline: expanded,
            aliases,
            imports,
        },
        diagnostics,
    )
}

fn expand_item(item: &Item, aliases: &AliasTable, diagnostics: &mut Vec<Diagnostic>) -> Item {
    match item {
        Item::TypeDef(d) => Item::TypeDef(TypeDefDecl {
                name: d.name.clone(),
                ty: expand_ty(&d.ty, aliases, diagnostics),
                span: d.span,
        }),
        Item::Input(d) => Item::Input(dflow_syntax::InputDecl {
                name: d.name.clone(),
                ty: expand_ty(&d.ty, aliases, diagnostics),
                examples: d.examples.clone(),
                span: d.span,
        }),
        other => other.clone(),
    }
}

fn expand_ty(ty: &TypeExpr, aliases: &AliasTable, diagnostics: &mut Vec<Diagnostic>) -> TypeExpr {
    aliases.expand(ty, diagnostics)
}
