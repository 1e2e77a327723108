// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dflow_check::SemType;
use dflow_syntax::Span;

fn lit_int(n: i64) -> TypedExpr {
    TypedExpr { kind: TypedExprKind::IntLit(n), ty: SemType::Int, span: Span::default() }
}

fn var(name: &str, ty: SemType) -> TypedExpr {
    TypedExpr { kind: TypedExprKind::Var(name.to_string()), ty, span: Span::default() }
}

#[test]
fn literals_evaluate_to_themselves() {
    let env = Env::new();
    assert_eq!(eval(&lit_int(7), &env).unwrap(), Value::Int(7));
}

#[test]
fn variable_lookup_succeeds() {
    let mut env = Env::new();
    env.insert("x".to_string(), Value::Int(3));
    assert_eq!(eval(&var("x", SemType::Int), &env).unwrap(), Value::Int(3));
}

#[test]
fn undefined_variable_is_an_error() {
    let env = Env::new();
    let err = eval(&var("missing", SemType::Int), &env).unwrap_err();
    assert!(matches!(err, EvalError::UndefinedVariable(name) if name == "missing"));
}

#[test]
fn integer_division_by_zero_is_an_error() {
    let expr = TypedExpr {
        kind: TypedExprKind::Arith { op: ArithOp::Div, lhs: Box::new(lit_int(1)), rhs: Box::new(lit_int(0)) },
        ty: SemType::Int,
        span: Span::default(),
    };
    let err = eval(&expr, &Env::new()).unwrap_err();
    assert!(matches!(err, EvalError::ArithmeticError));
}

#[test]
fn comparison_operators_evaluate_correctly() {
    let expr = TypedExpr {
        kind: TypedExprKind::Compare { op: CompareOp::Lt, lhs: Box::new(lit_int(1)), rhs: Box::new(lit_int(2)) },
        ty: SemType::Bool,
        span: Span::default(),
    };
    assert_eq!(eval(&expr, &Env::new()).unwrap(), Value::Bool(true));
}

#[test]
fn if_branches_on_condition() {
    let cond = TypedExpr { kind: TypedExprKind::BoolLit(false), ty: SemType::Bool, span: Span::default() };
    let expr = TypedExpr {
        kind: TypedExprKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(lit_int(1)),
            else_branch: Box::new(lit_int(2)),
        },
        ty: SemType::Int,
        span: Span::default(),
    };
    assert_eq!(eval(&expr, &Env::new()).unwrap(), Value::Int(2));
}

#[test]
fn record_merge_lets_right_side_win_on_conflict() {
    let left = Value::record([("a".to_string(), Value::Int(1))], [("a".to_string(), dflow_core::Type::Int)]);
    let right = Value::record([("a".to_string(), Value::Int(2))], [("a".to_string(), dflow_core::Type::Int)]);
    let merged = merge_values(left, right).unwrap();
    match merged {
        Value::Record { fields, .. } => assert_eq!(fields.get("a"), Some(&Value::Int(2))),
        other => panic!("expected record, got {other:?}"),
    }
}

#[test]
fn list_merge_requires_equal_length() {
    let left = Value::List { elements: vec![Value::Int(1)], element_type: dflow_core::Type::Int };
    let right = Value::List { elements: vec![Value::Int(1), Value::Int(2)], element_type: dflow_core::Type::Int };
    let err = merge_values(left, right).unwrap_err();
    assert!(matches!(err, EvalError::LengthMismatch { left: 1, right: 2 }));
}

#[test]
fn list_of_records_merge_broadcasts_a_scalar_record_over_every_element() {
    let empty_shape: Vec<(String, dflow_core::Type)> = Vec::new();
    let list = Value::List {
        elements: vec![
            Value::record([("a".to_string(), Value::Int(1))], empty_shape.clone()),
            Value::record([("a".to_string(), Value::Int(2))], empty_shape.clone()),
        ],
        element_type: dflow_core::Type::record(empty_shape.clone()),
    };
    let scalar = Value::record([("b".to_string(), Value::Bool(true))], empty_shape);
    let merged = merge_values(list, scalar).unwrap();
    match merged {
        Value::List { elements, .. } => {
            assert_eq!(elements.len(), 2);
            for e in elements {
                match e {
                    Value::Record { fields, .. } => assert_eq!(fields.get("b"), Some(&Value::Bool(true))),
                    other => panic!("expected record, got {other:?}"),
                }
            }
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn lambda_reduction_binds_its_single_parameter() {
    let body = TypedExpr {
        kind: TypedExprKind::Arith { op: ArithOp::Mul, lhs: Box::new(var("x", SemType::Int)), rhs: Box::new(lit_int(2)) },
        ty: SemType::Int,
        span: Span::default(),
    };
    let result = eval_lambda("x", &body, Value::Int(5)).unwrap();
    assert_eq!(result, Value::Int(10));
}

#[test]
fn field_projection_drops_absent_fields() {
    let value = Value::record(
        [("a".to_string(), Value::Int(1)), ("b".to_string(), Value::Int(2))],
        [("a".to_string(), dflow_core::Type::Int), ("b".to_string(), dflow_core::Type::Int)],
    );
    let mut env = Env::new();
    env.insert("rec".to_string(), value);
    let expr = TypedExpr {
        kind: TypedExprKind::Project(
            Box::new(var("rec", SemType::Product(indexmap::IndexMap::new()))),
            vec!["a".to_string()],
        ),
        ty: SemType::Product(indexmap::IndexMap::new()),
        span: Span::default(),
    };
    let projected = eval(&expr, &env).unwrap();
    match projected {
        Value::Record { fields, .. } => {
            assert_eq!(fields.get("a"), Some(&Value::Int(1)));
            assert!(fields.get("b").is_none());
        }
        other => panic!("expected record, got {other:?}"),
    }
}
