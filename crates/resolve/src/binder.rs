// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier binding: every `Var` reference must name an input or
//! an earlier binding; unresolved
//! references are reported with a fuzzy "did you mean?" suggestion when a
//! close candidate exists.

use crate::suggest::{format_hint, suggest};
use dflow_syntax::{Category, Diagnostic, Expr, ExprKind, Item, Pipeline, Severity, Span};
use indexmap::IndexSet;

/// Binds every variable reference in `pipeline` against the set of names
/// visible at that point (inputs and earlier bindings, in declaration
/// order). Lambda bodies see only their own parameters, per the Open
/// Question decision recorded in `DESIGN.md` restricting lambda closures
/// to parameters and literals.
pub fn bind(pipeline: &Pipeline) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut scope: IndexSet<String> = IndexSet::new();
    let all_names: IndexSet<String> = pipeline
    .items
    .iter()
    .filter_map(|item| match item {
            Item::Input(d) => Some(d.name.clone()),
            Item::Assignment(a) => Some(a.name.clone()),
            _ => None,
    })
    .collect();

    for item in &pipeline.items {
        match item {
            Item::Input(decl) => {
                scope.insert(decl.name.clone());
            }
            Item::Assignment(assignment) => {
                check_expr(&assignment.expr, &scope, &all_names, &mut diagnostics);
                scope.insert(assignment.name.clone());
            }
            Item::Output(decl) => {
                if !scope.contains(&decl.name) {
                    diagnostics.push(undefined_variable(&decl.name, decl.span, &all_names));
                }
            }
            Item::Use(_) | Item::TypeDef(_) => {}
        }
    }
    diagnostics
}

fn check_expr(
    expr: &Expr,
    scope: &IndexSet<String>,
    all_names: &IndexSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match &expr.kind {
        ExprKind::Var(name) => {
            if !scope.contains(name) {
                diagnostics.push(undefined_variable(name, expr.span, all_names));
            }
        }
        ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::StringLit(_) => {}
        ExprKind::Interpolate(parts) => {
            for part in parts {
                if let dflow_syntax::InterpPart::Expr(e) = part {
                    check_expr(e, scope, all_names, diagnostics);
                }
            }
        }
        ExprKind::ListLit(items) => {
            for item in items {
                check_expr(item, scope, all_names, diagnostics);
            }
        }
        ExprKind::RecordLit(fields) => {
            for (_, value) in fields {
                check_expr(value, scope, all_names, diagnostics);
            }
        }
        ExprKind::Field(base, _) | ExprKind::Project(base, _) | ExprKind::Not(base) => {
            check_expr(base, scope, all_names, diagnostics);
        }
        ExprKind::Merge(a, b)
        | ExprKind::Coalesce(a, b) => {
            check_expr(a, scope, all_names, diagnostics);
            check_expr(b, scope, all_names, diagnostics);
        }
        ExprKind::Compare { lhs, rhs,.. }
        | ExprKind::Arith { lhs, rhs,.. }
        | ExprKind::BoolBinary { lhs, rhs,.. } => {
            check_expr(lhs, scope, all_names, diagnostics);
            check_expr(rhs, scope, all_names, diagnostics);
        }
        ExprKind::If { cond, then_branch, else_branch } => {
            check_expr(cond, scope, all_names, diagnostics);
            check_expr(then_branch, scope, all_names, diagnostics);
            check_expr(else_branch, scope, all_names, diagnostics);
        }
        ExprKind::Branch { arms, otherwise } => {
            for (cond, value) in arms {
                check_expr(cond, scope, all_names, diagnostics);
                check_expr(value, scope, all_names, diagnostics);
            }
            check_expr(otherwise, scope, all_names, diagnostics);
        }
        ExprKind::Guard { expr, cond } => {
            check_expr(expr, scope, all_names, diagnostics);
            check_expr(cond, scope, all_names, diagnostics);
        }
        ExprKind::Lambda { params, body } => {
            let lambda_scope: IndexSet<String> = params.iter().cloned().collect();
            check_expr(body, &lambda_scope, all_names, diagnostics);
        }
        ExprKind::Call { args, options,.. } => {
            for arg in args {
                check_expr(arg, scope, all_names, diagnostics);
            }
            for option in options {
                if let dflow_syntax::OptionValue::Expr(e) = &option.value {
                    check_expr(e, scope, all_names, diagnostics);
                }
            }
        }
    }
}

fn undefined_variable(name: &str, span: Span, all_names: &IndexSet<String>) -> Diagnostic {
    let message = format!("undefined variable `{name}`");
    let diag = Diagnostic::new("E001", Category::Reference, Severity::Error, message, span);
    match suggest(name, all_names.iter()) {
        Some(candidate) => diag.with_suggestion(format_hint(&candidate)),
        None => diag,
    }
}
