// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure expression evaluator over `dflow_check::TypedExpr`, shared by
//! `dflow-runtime` for `Data`/`Output` nodes, `with fallback:...`
//! expressions, and reduced `CompiledLambda` bodies. Every expression this
//! module is asked to evaluate has already passed the bidirectional
//! checker, so arity/shape mismatches are treated as internal errors
//! rather than recoverable ones — the one genuinely runtime-only failure
//! mode is arithmetic/merge edge cases (division by zero, list-length
//! mismatch on broadcast merge).

use dflow_check::{TypedExpr, TypedExprKind, TypedInterpPart};
use dflow_core::Value;
use dflow_syntax::{ArithOp, BoolOp, CompareOp};
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("arithmetic error: division by zero")]
    ArithmeticError,
    #[error("no field `{field}` on record")]
    UndefinedField { field: String },
    #[error("record merge lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("cannot evaluate a module call inside a pure expression")]
    UnsupportedCall,
    #[error("lambda expects exactly one argument")]
    LambdaArity,
}

/// Read-only binding environment: variable name to already-computed value.
pub type Env = HashMap<String, Value>;

pub fn eval(expr: &TypedExpr, env: &Env) -> Result<Value, EvalError> {
    match &expr.kind {
        TypedExprKind::Var(name) => env
        .get(name)
        .cloned()
        .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        TypedExprKind::IntLit(n) => Ok(Value::Int(*n)),
        TypedExprKind::FloatLit(f) => Ok(Value::Float(*f)),
        TypedExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
        TypedExprKind::StringLit(s) => Ok(Value::String(s.clone())),
        TypedExprKind::Interpolate(parts) => {
            let mut out = String::new();
            for part in parts {
                match part {
                    TypedInterpPart::Literal(s) => out.push_str(s),
                    TypedInterpPart::Expr(e) => out.push_str(&display_value(&eval(e, env)?)),
                }
            }
            Ok(Value::String(out))
        }
        TypedExprKind::ListLit(items) => {
            let element_type = expr
            .ty
            .to_runtime()
            .and_then(|t| match t {
                    dflow_core::Type::List(inner) => Some(*inner),
                    _ => None,
            })
            .unwrap_or(dflow_core::Type::Int);
            let elements = items.iter().map(|e| eval(e, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List { elements, element_type })
        }
        TypedExprKind::RecordLit(fields) => {
            let shape = match expr.ty.to_runtime() {
                Some(dflow_core::Type::Product(s)) => s,
                _ => IndexMap::new(),
            };
            let mut values = IndexMap::new();
            for (name, e) in fields {
                values.insert(name.clone(), eval(e, env)?);
            }
            Ok(Value::Record { fields: values, shape })
        }
        TypedExprKind::Field(inner, field) => {
            let value = eval(inner, env)?;
            match value {
                Value::Record { fields,.. } => fields
                .get(field)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedField { field: field.clone() }),
                Value::Union { payload, tag,.. } if &tag == field => Ok(*payload),
                _ => Err(EvalError::UndefinedField { field: field.clone() }),
            }
        }
        TypedExprKind::Project(inner, fields) => {
            let value = eval(inner, env)?;
            match value {
                Value::Record { fields: all, shape } => {
                    let mut out_fields = IndexMap::new();
                    let mut out_shape = IndexMap::new();
                    for f in fields {
                        if let Some(v) = all.get(f) {
                            out_fields.insert(f.clone(), v.clone());
                        }
                        if let Some(t) = shape.get(f) {
                            out_shape.insert(f.clone(), t.clone());
                        }
                    }
                    Ok(Value::Record { fields: out_fields, shape: out_shape })
                }
                other => Ok(other),
            }
        }
        TypedExprKind::Merge(a, b) => eval_merge(a, b, env),
        TypedExprKind::If { cond, then_branch, else_branch } => {
            if as_bool(&eval(cond, env)?) {
                eval(then_branch, env)
            } else {
                eval(else_branch, env)
            }
        }
        TypedExprKind::Branch { arms, otherwise } => {
            for (cond, body) in arms {
                if as_bool(&eval(cond, env)?) {
                    return eval(body, env);
                }
            }
            eval(otherwise, env)
        }
        TypedExprKind::Compare { op, lhs, rhs } => {
            let l = eval(lhs, env)?;
            let r = eval(rhs, env)?;
            Ok(Value::Bool(eval_compare(*op, &l, &r)))
        }
        TypedExprKind::Arith { op, lhs, rhs } => eval_arith(*op, &eval(lhs, env)?, &eval(rhs, env)?),
        TypedExprKind::BoolBinary { op, lhs, rhs } => {
            let l = as_bool(&eval(lhs, env)?);
            let r = as_bool(&eval(rhs, env)?);
            Ok(Value::Bool(match op {
                        BoolOp::And => l && r,
                        BoolOp::Or => l || r,
            }))
        }
        TypedExprKind::Not(inner) => Ok(Value::Bool(!as_bool(&eval(inner, env)?))),
        TypedExprKind::Coalesce(a, b) => match eval(a, env)? {
            Value::Some { inner,.. } => Ok(*inner),
            Value::None {.. } => eval(b, env),
            other => Ok(other),
        },
        TypedExprKind::Guard { expr: inner, cond } => {
            let inner_ty = inner.ty.to_runtime().unwrap_or(dflow_core::Type::Int);
            if as_bool(&eval(cond, env)?) {
                Ok(Value::Some { inner: Box::new(eval(inner, env)?), inner_type: inner_ty })
            } else {
                Ok(Value::None { inner_type: inner_ty })
            }
        }
        TypedExprKind::Lambda {.. } => Err(EvalError::UnsupportedCall),
        TypedExprKind::Call {.. } => Err(EvalError::UnsupportedCall),
    }
}

/// Reduces a restricted lambda (`CompiledLambda`, see `lambda.rs`) to a
/// one-argument function by binding its single parameter.
pub fn eval_lambda(param: &str, body: &TypedExpr, arg: Value) -> Result<Value, EvalError> {
    let mut env = Env::new();
    env.insert(param.to_string(), arg);
    eval(body, &env)
}

fn as_bool(v: &Value) -> bool {
    matches!(v, Value::Bool(true))
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn eval_compare(op: CompareOp, l: &Value, r: &Value) -> bool {
    use std::cmp::Ordering;
    let ord = match (l, r) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        _ => None,
    };
    match op {
        CompareOp::Eq => l == r,
        CompareOp::NotEq => l != r,
        CompareOp::Lt => ord == Some(Ordering::Less),
        CompareOp::LtEq => matches!(ord, Some(Ordering::Less) | Some(Ordering::Equal)),
        CompareOp::Gt => ord == Some(Ordering::Greater),
        CompareOp::GtEq => matches!(ord, Some(Ordering::Greater) | Some(Ordering::Equal)),
    }
}

fn eval_arith(op: ArithOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => {
            if matches!(op, ArithOp::Div) && *b == 0 {
                return Err(EvalError::ArithmeticError);
            }
            Ok(Value::Int(match op {
                        ArithOp::Sub => a - b,
                        ArithOp::Mul => a * b,
                        ArithOp::Div => a / b,
            }))
        }
        (Value::Float(a), Value::Float(b)) => {
            if matches!(op, ArithOp::Div) && *b == 0.0 {
                return Err(EvalError::ArithmeticError);
            }
            Ok(Value::Float(match op {
                        ArithOp::Sub => a - b,
                        ArithOp::Mul => a * b,
                        ArithOp::Div => a / b,
            }))
        }
        _ => Err(EvalError::ArithmeticError),
    }
}

fn eval_merge(a: &TypedExpr, b: &TypedExpr, env: &Env) -> Result<Value, EvalError> {
    let left = eval(a, env)?;
    let right = eval(b, env)?;
    merge_values(left, right)
}

/// `+` is record/candidate merge, never arithmetic. Broadcasts a
/// `List<Record> + List<Record>` element-wise (lengths must match) and a
/// `List<Record> + Record` by repeating the scalar side over every
/// element.
pub fn merge_values(left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Record { fields: mut lf, shape: mut ls }, Value::Record { fields: rf, shape: rs }) => {
            for (k, v) in rf {
                lf.insert(k, v);
            }
            for (k, t) in rs {
                ls.insert(k, t);
            }
            Ok(Value::Record { fields: lf, shape: ls })
        }
        (
            Value::List { elements: le, element_type: let_ },
            Value::List { elements: re,.. },
        ) => {
            if le.len() != re.len() {
                return Err(EvalError::LengthMismatch { left: le.len(), right: re.len() });
            }
            let merged = le
            .into_iter()
            .zip(re)
            .map(|(l, r)| merge_values(l, r))
            .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List { elements: merged, element_type: let_ })
        }
        (Value::List { elements: le, element_type }, right @ Value::Record {.. }) => {
            let merged = le
            .into_iter()
            .map(|l| merge_values(l, right.clone()))
            .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List { elements: merged, element_type })
        }
        (left, _right) => Ok(left),
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
