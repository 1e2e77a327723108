// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_scenario_1_simple_pipeline() {
    let source = "in text: String\ntrimmed = Trim(text)\nresult = Uppercase(trimmed)\nout result";
    let pipeline = Parser::parse(source).expect("should parse");
    assert_eq!(pipeline.items.len(), 4);
    assert!(matches!(pipeline.items[0], Item::Input(_)));
    assert!(matches!(pipeline.items[1], Item::Assignment(_)));
    assert!(matches!(pipeline.items[3], Item::Output(_)));
}

#[test]
fn parses_use_with_alias() {
    let pipeline = Parser::parse("use stdlib.math as m\nout m").unwrap();
    match &pipeline.items[0] {
        Item::Use(u) => {
            assert_eq!(u.namespace, "stdlib.math");
            assert_eq!(u.alias.as_deref(), Some("m"));
        }
        other => panic!("expected Use, got {other:?}"),
    }
}

#[test]
fn parses_record_and_field_access() {
    let pipeline = Parser::parse("x = {a: 1, b: 2}\ny = x.a\nout y").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::RecordLit(_))),
        other => panic!("expected Assignment, got {other:?}"),
    }
    match &pipeline.items[1] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::Field(_, _))),
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_projection() {
    let pipeline = Parser::parse("y = x[a, b]\nout y").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Project(_, fields) => assert_eq!(fields, &vec!["a".to_string(), "b".to_string()]),
            other => panic!("expected Project, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_merge_as_record_candidates_not_arithmetic() {
    let pipeline = Parser::parse("z = a + b\nout z").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::Merge(_, _))),
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_if_then_else() {
    let pipeline = Parser::parse("z = if a then 1 else 2\nout z").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::If {.. })),
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_branch_with_otherwise() {
    let pipeline =
    Parser::parse("z = branch when a => 1 when b => 2 otherwise => 3\nout z").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Branch { arms,.. } => assert_eq!(arms.len(), 2),
            other => panic!("expected Branch, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_coalesce_and_guard() {
    let pipeline = Parser::parse("y = a ?? b\nz = a when c\nout y").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::Coalesce(_, _))),
        other => panic!("expected Assignment, got {other:?}"),
    }
    match &pipeline.items[1] {
        Item::Assignment(a) => assert!(matches!(a.expr.kind, ExprKind::Guard {.. })),
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_module_call_with_with_clause_options() {
    let pipeline =
    Parser::parse("y = Flaky(x) with retry: 3, delay: 100ms, backoff: exponential\nout y")
    .unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Call { module, options,.. } => {
                assert_eq!(module, "Flaky");
                assert_eq!(options.len(), 3);
                assert_eq!(options[0].name, "retry");
                assert!(matches!(options[0].value, OptionValue::Int(3)));
            }
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_throttle_rate_option() {
    let pipeline = Parser::parse("y = Api(x) with throttle: 100/1min\nout y").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Call { options,.. } => match &options[0].value {
                OptionValue::Rate { count, per } => {
                    assert_eq!(*count, 100);
                    assert_eq!(*per, std::time::Duration::from_secs(60));
                }
                other => panic!("expected Rate, got {other:?}"),
            },
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_string_interpolation() {
    let pipeline = Parser::parse(r#"y = "hello ${name}!"
out y"#)
    .unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Interpolate(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected Interpolate, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn parses_list_and_type_decl() {
    let pipeline = Parser::parse("in xs: List<Int>\nout xs").unwrap();
    match &pipeline.items[0] {
        Item::Input(decl) => assert!(matches!(decl.ty.kind, TypeExprKind::List(_))),
        other => panic!("expected Input, got {other:?}"),
    }
}

#[test]
fn parses_union_type() {
    let pipeline = Parser::parse("in x: Int | String\nout x").unwrap();
    match &pipeline.items[0] {
        Item::Input(decl) => assert!(matches!(decl.ty.kind, TypeExprKind::Union(_))),
        other => panic!("expected Input, got {other:?}"),
    }
}

#[test]
fn parses_lambda_as_higher_order_argument() {
    let pipeline = Parser::parse("y = filter(xs, |x| x > 0)\nout y").unwrap();
    match &pipeline.items[0] {
        Item::Assignment(a) => match &a.expr.kind {
            ExprKind::Call { args,.. } => {
                assert!(matches!(args[1].kind, ExprKind::Lambda {.. }));
            }
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn example_annotation_is_attached_to_input() {
    let pipeline = Parser::parse("in n: Int @example(42)\nout n").unwrap();
    match &pipeline.items[0] {
        Item::Input(decl) => assert_eq!(decl.examples, vec![Literal::Int(42)]),
        other => panic!("expected Input, got {other:?}"),
    }
}

#[test]
fn strict_parse_fails_on_unexpected_token() {
    let err = Parser::parse("in x: Int ===").unwrap_err();
    assert!(!err.is_empty());
    assert!(err.iter().any(|d| d.category == Category::Syntax));
}

#[test]
fn recovering_parse_collects_multiple_diagnostics() {
    let (pipeline, diagnostics) =
    Parser::parse_with_recovery("in @ x: Int\nin @ y: Int\nout x");
    assert!(pipeline.is_some());
    assert!(diagnostics.len() >= 2);
}

#[test]
fn parses_scenario_6_cycle_source_without_complaint_at_parse_time() {
    // Cycle detection is a compile-level (DAG) concern, not a parse error.
    let pipeline = Parser::parse("a = b + {x: 1}\nb = a + {y: 2}\nout a").unwrap();
    assert_eq!(pipeline.items.len(), 3);
}
