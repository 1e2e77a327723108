// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deliberately conservative: a lambda argument to a higher-order
//! module may only reference its own parameter and literals, never an
//! outer binding. `lower::lower` enforces this at compile time;
//! `dflow-runtime` reduces the surviving, closed `CompiledLambda` to a
//! plain `Value -> Value` function before handing it to the module
//! implementation (`dflow_registry::ModuleImpl::invoke_with_lambdas`).

use dflow_check::TypedExpr;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompiledLambda {
    pub param: String,
    pub body: TypedExpr,
}

/// Checks that `expr` only references `param` (and no other identifier),
/// per the restriction above. Returns the first offending free variable.
pub fn free_var_outside(expr: &TypedExpr, param: &str) -> Option<String> {
    use dflow_check::TypedExprKind::*;
    match &expr.kind {
        Var(name) => {
            if name != param {
                Some(name.clone())
            } else {
                None
            }
        }
        IntLit(_) | FloatLit(_) | BoolLit(_) | StringLit(_) => None,
        Interpolate(parts) => parts.iter().find_map(|p| match p {
                dflow_check::TypedInterpPart::Literal(_) => None,
                dflow_check::TypedInterpPart::Expr(e) => free_var_outside(e, param),
        }),
        ListLit(items) => items.iter().find_map(|e| free_var_outside(e, param)),
        RecordLit(fields) => fields.iter().find_map(|(_, e)| free_var_outside(e, param)),
        Field(e, _) | Project(e, _) | Not(e) => free_var_outside(e, param),
        Merge(a, b) | Coalesce(a, b) => free_var_outside(a, param).or_else(|| free_var_outside(b, param)),
        If { cond, then_branch, else_branch } => free_var_outside(cond, param)
        .or_else(|| free_var_outside(then_branch, param))
        .or_else(|| free_var_outside(else_branch, param)),
        Branch { arms, otherwise } => arms
        .iter()
        .find_map(|(c, e)| free_var_outside(c, param).or_else(|| free_var_outside(e, param)))
        .or_else(|| free_var_outside(otherwise, param)),
        Compare { lhs, rhs,.. } | Arith { lhs, rhs,.. } | BoolBinary { lhs, rhs,.. } => {
            free_var_outside(lhs, param).or_else(|| free_var_outside(rhs, param))
        }
        Guard { expr, cond } => free_var_outside(expr, param).or_else(|| free_var_outside(cond, param)),
        Lambda { params, body } => {
            if params.iter().any(|p| p == param) {
                None
            } else {
                free_var_outside(body, param)
            }
        }
        Call { args,.. } => args.iter().find_map(|e| free_var_outside(e, param)),
    }
}

#[cfg(test)]
#[path = "lambda_tests.rs"]
mod tests;
