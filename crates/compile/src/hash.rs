// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! two content hashes. Both are SHA-256 over a canonical text encoding
//! (never the in-memory layout, which would vary with allocation order or a
//! future field reordering) so the same pipeline compiled twice, possibly on
//! different builds of this crate, always lands on the same digest.

use crate::dag::{Dag, NodeKind};
use dflow_check::{TypedExpr, TypedExprKind, TypedInterpPart, TypedPipeline};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Identifies the compiled DAG's shape: node kinds, module calls, and the
/// edge topology between them, independent of the source-level names a
/// binding happened to use. Two pipelines that differ only by renaming a
/// variable compile to the same structural hash; `dflow-store` uses it to
/// dedupe cached compiles.
pub fn structural_hash(dag: &Dag) -> String {
    let index: HashMap<_, _> = dag.nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
    // A `Data` node's expression can reference an earlier node by the
    // source-level name it was bound under (`TypedExprKind::Var`); resolve
    // those references to the producer's topological index rather than
    // rendering the name verbatim, so renaming a binding everywhere it is
    // used leaves the digest unchanged.
    let var_index: HashMap<&str, usize> =
    dag.nodes.iter().enumerate().map(|(i, n)| (n.name.as_str(), i)).collect();

    let mut text = String::new();
    for (i, node) in dag.nodes.iter().enumerate() {
        let _ = write!(text, "N{i}:");
        match &node.kind {
            NodeKind::Input => {
                let _ = writeln!(text, "input:{}", node.output_type);
            }
            NodeKind::Output => {
                let _ = writeln!(text, "output:{}", node.output_type);
            }
            NodeKind::Data { expr } => {
                let _ = writeln!(text, "data:{}", canonical_expr(expr, true, Some(&var_index)));
            }
            NodeKind::ModuleCall { module_fqn, options, lambda_args } => {
                let _ = write!(text, "call:{module_fqn}:{}", canonical_options(options, true, Some(&var_index)));
                for (slot, lambda) in lambda_args {
                    let _ = write!(text, ":lambda[{slot}]={}", canonical_expr(&lambda.body, true, Some(&var_index)));
                }
                let _ = writeln!(text);
            }
        }
    }

    let mut edges: Vec<(usize, &str, usize, &str, String)> = dag
    .edges
    .iter()
    .map(|e| {
            (
                index[&e.producer],
                e.producer_slot.as_str(),
                index[&e.consumer],
                e.consumer_slot.as_str(),
                e.ty.to_string(),
            )
    })
    .collect();
    edges.sort();
    for (producer, producer_slot, consumer, consumer_slot, ty) in edges {
        let _ = writeln!(text, "E:{producer}.{producer_slot}->{consumer}.{consumer_slot}:{ty}");
    }

    digest(&text)
}

/// Identifies the exact checked source a DAG was lowered from — including
/// binding names, literal values, and declaration order. Two pipelines that
/// are structurally identical but spell a literal differently (`1 + 1` vs
/// `2`, before constant folding) or name a binding differently land on
/// different syntactic hashes; `dflow-store` uses it as the primary key for
/// a pipeline definition's identity.
pub fn syntactic_hash(typed: &TypedPipeline) -> String {
    let mut text = String::new();
    for input in &typed.inputs {
        let _ = writeln!(text, "in {}:{}", input.name, input.ty);
    }
    for binding in &typed.bindings {
        let _ = writeln!(text, "let {} = {}", binding.name, canonical_expr(&binding.expr, false, None));
    }
    for output in &typed.outputs {
        let _ = writeln!(text, "out {}:{}", output.name, output.ty);
    }
    digest(&text)
}

/// `sort_fields` canonicalizes record field order — required for the
/// structural hash (field order is not part of a record's identity) but
/// left source-faithful for the syntactic hash, which is keyed on the
/// exact checked source rather than its semantic shape. `var_index`, when
/// present, resolves a `Var` reference to its producer's topological index
/// instead of rendering the source-level name — also structural-hash-only,
/// since the syntactic hash wants the exact name that was written.
fn canonical_options(
    options: &dflow_check::CallOptions,
    sort_fields: bool,
    var_index: Option<&HashMap<&str, usize>>,
) -> String {
    format!(
        "retry={} timeout={:?} delay={:?} backoff={:?} cache={:?} cache_backend={} throttle={:?} \
 concurrency={:?} on_error={:?} lazy={} priority={:?} fallback={}",
        options.retry,
        options.timeout,
        options.delay,
        options.backoff,
        options.cache,
        options.cache_backend,
        options.throttle,
        options.concurrency,
        options.on_error,
        options.lazy,
        options.priority,
        options.fallback_expr.as_deref().map(|e| canonical_expr(e, sort_fields, var_index)).unwrap_or_default(),
    )
}

fn canonical_expr(expr: &TypedExpr, sort_fields: bool, var_index: Option<&HashMap<&str, usize>>) -> String {
    match &expr.kind {
        TypedExprKind::Var(name) => match var_index.and_then(|idx| idx.get(name.as_str())) {
            Some(producer) => format!("var#{producer}"),
            None => format!("var({name})"),
        },
        TypedExprKind::IntLit(n) => format!("int({n})"),
        TypedExprKind::FloatLit(f) => format!("float({f})"),
        TypedExprKind::BoolLit(b) => format!("bool({b})"),
        TypedExprKind::StringLit(s) => format!("str({s:?})"),
        TypedExprKind::Interpolate(parts) => {
            let parts: Vec<String> = parts
            .iter()
            .map(|p| match p {
                    TypedInterpPart::Literal(s) => format!("lit({s:?})"),
                    TypedInterpPart::Expr(e) => canonical_expr(e, sort_fields, var_index),
            })
            .collect();
            format!("interp[{}]", parts.join(","))
        }
        TypedExprKind::ListLit(items) => {
            format!(
                "list[{}]",
                items.iter().map(|e| canonical_expr(e, sort_fields, var_index)).collect::<Vec<_>>().join(",")
            )
        }
        TypedExprKind::RecordLit(fields) => {
            let mut rendered: Vec<(String, String)> =
            fields.iter().map(|(n, e)| (n.clone(), canonical_expr(e, sort_fields, var_index))).collect();
            if sort_fields {
                rendered.sort_by(|a, b| a.0.cmp(&b.0));
            }
            let rendered: Vec<String> = rendered.into_iter().map(|(n, e)| format!("{n}:{e}")).collect();
            format!("record{{{}}}", rendered.join(","))
        }
        TypedExprKind::Field(inner, field) => {
            format!("field({}, {field})", canonical_expr(inner, sort_fields, var_index))
        }
        TypedExprKind::Project(inner, fields) => {
            let mut fields = fields.clone();
            if sort_fields {
                fields.sort();
            }
            format!("project({}, [{}])", canonical_expr(inner, sort_fields, var_index), fields.join(","))
        }
        TypedExprKind::Merge(a, b) => {
            format!("merge({}, {})", canonical_expr(a, sort_fields, var_index), canonical_expr(b, sort_fields, var_index))
        }
        TypedExprKind::If { cond, then_branch, else_branch } => format!(
            "if({}, {}, {})",
            canonical_expr(cond, sort_fields, var_index),
            canonical_expr(then_branch, sort_fields, var_index),
            canonical_expr(else_branch, sort_fields, var_index)
        ),
        TypedExprKind::Branch { arms, otherwise } => {
            let rendered: Vec<String> = arms
            .iter()
            .map(|(c, e)| {
                    format!(
                        "({} => {})",
                        canonical_expr(c, sort_fields, var_index),
                        canonical_expr(e, sort_fields, var_index)
                    )
            })
            .collect();
            format!("branch[{}; else {}]", rendered.join(","), canonical_expr(otherwise, sort_fields, var_index))
        }
        TypedExprKind::Compare { op, lhs, rhs } => {
            format!(
                "cmp({op:?}, {}, {})",
                canonical_expr(lhs, sort_fields, var_index),
                canonical_expr(rhs, sort_fields, var_index)
            )
        }
        TypedExprKind::Arith { op, lhs, rhs } => {
            format!(
                "arith({op:?}, {}, {})",
                canonical_expr(lhs, sort_fields, var_index),
                canonical_expr(rhs, sort_fields, var_index)
            )
        }
        TypedExprKind::BoolBinary { op, lhs, rhs } => {
            format!(
                "bool({op:?}, {}, {})",
                canonical_expr(lhs, sort_fields, var_index),
                canonical_expr(rhs, sort_fields, var_index)
            )
        }
        TypedExprKind::Not(inner) => format!("not({})", canonical_expr(inner, sort_fields, var_index)),
        TypedExprKind::Coalesce(a, b) => {
            format!(
                "coalesce({}, {})",
                canonical_expr(a, sort_fields, var_index),
                canonical_expr(b, sort_fields, var_index)
            )
        }
        TypedExprKind::Guard { expr: inner, cond } => {
            format!(
                "guard({}, {})",
                canonical_expr(inner, sort_fields, var_index),
                canonical_expr(cond, sort_fields, var_index)
            )
        }
        TypedExprKind::Lambda { params, body } => {
            format!("lambda({} => {})", params.join(","), canonical_expr(body, sort_fields, var_index))
        }
        TypedExprKind::Call { module, args, options } => {
            let rendered: Vec<String> = args.iter().map(|e| canonical_expr(e, sort_fields, var_index)).collect();
            format!("call({module}, [{}], {})", rendered.join(","), canonical_options(options, sort_fields, var_index))
        }
    }
}

fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let bytes = hasher.finalize();
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
