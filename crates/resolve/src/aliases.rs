// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Type alias expansion. `type X =...` declarations form a table
//! that `TypeExprKind::Ref` names are looked up against; a reference cycle
//! among aliases is reported as `CyclicTypeAlias` rather than recursing
//! forever.

use dflow_syntax::{Category, Diagnostic, Severity, Span, TypeDefDecl, TypeExpr, TypeExprKind};
use indexmap::IndexMap;

/// Table of declared type aliases, keyed by name.
pub struct AliasTable {
    decls: IndexMap<String, TypeExpr>,
}

impl AliasTable {
    pub fn new(defs: &[TypeDefDecl]) -> Self {
        let decls = defs.iter().map(|d| (d.name.clone(), d.ty.clone())).collect();
        Self { decls }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }

    /// Fully expands `ty`, inlining every `Ref` to a declared alias.
    /// `Ref`s to names the table does not know about are left as-is (an
    /// `UndefinedType` concern for the type checker, not the resolver).
    /// Cyclic aliases are reported once and the cycle's own reference is
    /// left unexpanded so the checker sees a single `UndefinedType`-shaped
    /// error instead of looping.
    pub fn expand(&self, ty: &TypeExpr, diagnostics: &mut Vec<Diagnostic>) -> TypeExpr {
        let mut visiting = Vec::new();
        self.expand_inner(ty, &mut visiting, diagnostics)
    }

    fn expand_inner(
        &self,
        ty: &TypeExpr,
        visiting: &mut Vec<String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TypeExpr {
        match &ty.kind {
            TypeExprKind::Ref(name) => {
                let Some(aliased) = self.decls.get(name) else {
                    return ty.clone();
                };
                if let Some(pos) = visiting.iter().position(|n| n == name) {
                    let cycle = visiting[pos..]
                    .iter()
                    .chain(std::iter::once(name))
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" -> ");
                    diagnostics.push(cyclic_alias(name, &cycle, ty.span));
                    return ty.clone();
                }
                visiting.push(name.clone());
                let expanded = self.expand_inner(aliased, visiting, diagnostics);
                visiting.pop();
                expanded
            }
            TypeExprKind::List(inner) => TypeExpr {
                kind: TypeExprKind::List(Box::new(self.expand_inner(inner, visiting, diagnostics))),
                span: ty.span,
            },
            TypeExprKind::Optional(inner) => TypeExpr {
                kind: TypeExprKind::Optional(Box::new(
                        self.expand_inner(inner, visiting, diagnostics),
                )),
                span: ty.span,
            },
            TypeExprKind::Map(k, v) => TypeExpr {
                kind: TypeExprKind::Map(
                    Box::new(self.expand_inner(k, visiting, diagnostics)),
                    Box::new(self.expand_inner(v, visiting, diagnostics)),
                ),
                span: ty.span,
            },
            TypeExprKind::Record(fields) => TypeExpr {
                kind: TypeExprKind::Record(
                    fields
                    .iter()
                    .map(|(name, field_ty)| {
                            (name.clone(), self.expand_inner(field_ty, visiting, diagnostics))
                    })
                    .collect(),
                ),
                span: ty.span,
            },
            TypeExprKind::Union(members) => TypeExpr {
                kind: TypeExprKind::Union(
                    members
                    .iter()
                    .map(|m| self.expand_inner(m, visiting, diagnostics))
                    .collect(),
                ),
                span: ty.span,
            },
            TypeExprKind::String
            | TypeExprKind::Int
            | TypeExprKind::Float
            | TypeExprKind::Boolean => ty.clone(),
        }
    }
}

fn cyclic_alias(name: &str, cycle: &str, span: Span) -> Diagnostic {
    Diagnostic::new(
        "E032",
        Category::Semantic,
        Severity::Error,
        format!("cyclic type alias `{name}`: {cycle}"),
        span,
    )
}
