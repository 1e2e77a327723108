// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use dflow_check::{CallOptions, SemType, TypedExprKind, TypedInput, TypedInterpPart, TypedOutput};
use dflow_core::{Type, Value};
use dflow_registry::{Module, ModuleImpl, ModuleInvokeError, ModuleMetadata, ModuleVersion};
use dflow_syntax::Span;

struct Noop;

#[async_trait]
impl ModuleImpl for Noop {
    async fn invoke(
        &self,
        _consumed: IndexMap<String, Value>,
    ) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        Ok(IndexMap::new())
    }
}

fn add_module() -> Module {
    Module {
        qualified_name: "ns.add".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: [("a".to_string(), Type::Int), ("b".to_string(), Type::Int)].into_iter().collect(),
        produces: [("sum".to_string(), Type::Int)].into_iter().collect(),
        implementation: Box::new(Noop),
        tags: vec![],
        metadata: ModuleMetadata::default(),
    }
}

fn registry_with_add() -> dflow_registry::ModuleRegistry {
    let registry = dflow_registry::ModuleRegistry::new();
    registry.register(add_module()).expect("register add module");
    registry
}

fn typed_var(name: &str, ty: SemType) -> TypedExpr {
    TypedExpr { kind: TypedExprKind::Var(name.to_string()), ty, span: Span::default() }
}

#[test]
fn input_call_output_lowers_to_four_nodes_three_edges() {
    let registry = registry_with_add();
    let typed = TypedPipeline {
        inputs: vec![
            TypedInput { name: "x".to_string(), ty: SemType::Int },
            TypedInput { name: "y".to_string(), ty: SemType::Int },
        ],
        bindings: vec![TypedAssignment {
                name: "total".to_string(),
                expr: TypedExpr {
                    kind: TypedExprKind::Call {
                        module: "ns.add".to_string(),
                        args: vec![typed_var("x", SemType::Int), typed_var("y", SemType::Int)],
                        options: Box::new(CallOptions::default()),
                    },
                    ty: SemType::Product([("sum".to_string(), SemType::Int)].into_iter().collect()),
                    span: Span::default(),
                },
        }],
        outputs: vec![TypedOutput { name: "total".to_string(), ty: SemType::Product([("sum".to_string(), SemType::Int)].into_iter().collect()) }],
    };

    let dag = lower(&typed, &registry).expect("lowers cleanly");
    assert_eq!(dag.nodes.len(), 4);
    assert_eq!(dag.edges.len(), 3);
    let call = dag.node_by_name("total").expect("call node present");
    match &call.kind {
        NodeKind::ModuleCall { module_fqn, .. } => assert_eq!(module_fqn, "ns.add"),
        other => panic!("expected ModuleCall, got {other:?}"),
    }
}

#[test]
fn nested_call_is_hoisted_into_its_own_node() {
    let registry = registry_with_add();
    let inner_call = TypedExpr {
        kind: TypedExprKind::Call {
            module: "ns.add".to_string(),
            args: vec![typed_var("x", SemType::Int), typed_var("x", SemType::Int)],
            options: Box::new(CallOptions::default()),
        },
        ty: SemType::Product([("sum".to_string(), SemType::Int)].into_iter().collect()),
        span: Span::default(),
    };
    let outer_field = TypedExpr {
        kind: TypedExprKind::Field(Box::new(inner_call), "sum".to_string()),
        ty: SemType::Int,
        span: Span::default(),
    };
    let typed = TypedPipeline {
        inputs: vec![TypedInput { name: "x".to_string(), ty: SemType::Int }],
        bindings: vec![TypedAssignment { name: "doubled".to_string(), expr: outer_field }],
        outputs: vec![TypedOutput { name: "doubled".to_string(), ty: SemType::Int }],
    };

    let dag = lower(&typed, &registry).expect("lowers cleanly");
    // input, hoisted call, data (field projection), output
    assert_eq!(dag.nodes.len(), 4);
    assert!(dag.node_by_name("doubled$call1").is_some());
    let data = dag.node_by_name("doubled").expect("data node present");
    assert!(matches!(data.kind, NodeKind::Data { .. }));
}

#[test]
fn reference_to_undefined_binding_is_rejected() {
    let registry = registry_with_add();
    let typed = TypedPipeline {
        inputs: vec![],
        bindings: vec![],
        outputs: vec![TypedOutput { name: "missing".to_string(), ty: SemType::Int }],
    };
    let err = lower(&typed, &registry).unwrap_err();
    assert!(matches!(err, CompileError::UndefinedVariable(name) if name == "missing"));
}

#[test]
fn call_to_unregistered_module_is_rejected() {
    let registry = dflow_registry::ModuleRegistry::new();
    let typed = TypedPipeline {
        inputs: vec![TypedInput { name: "x".to_string(), ty: SemType::Int }],
        bindings: vec![TypedAssignment {
                name: "y".to_string(),
                expr: TypedExpr {
                    kind: TypedExprKind::Call {
                        module: "ns.missing".to_string(),
                        args: vec![typed_var("x", SemType::Int)],
                        options: Box::new(CallOptions::default()),
                    },
                    ty: SemType::Int,
                    span: Span::default(),
                },
        }],
        outputs: vec![],
    };
    let err = lower(&typed, &registry).unwrap_err();
    assert!(matches!(err, CompileError::ModuleNotFound(name) if name == "ns.missing"));
}

#[test]
fn lambda_argument_closing_over_an_outer_binding_is_rejected() {
    let registry = registry_with_add();
    let lambda = TypedExpr {
        kind: TypedExprKind::Lambda {
            params: vec!["item".to_string()],
            body: Box::new(typed_var("outer", SemType::Int)),
        },
        ty: SemType::Function(vec![SemType::Int], Box::new(SemType::Int)),
        span: Span::default(),
    };
    let typed = TypedPipeline {
        inputs: vec![
            TypedInput { name: "x".to_string(), ty: SemType::Int },
            TypedInput { name: "outer".to_string(), ty: SemType::Int },
        ],
        bindings: vec![TypedAssignment {
                name: "y".to_string(),
                expr: TypedExpr {
                    kind: TypedExprKind::Call {
                        module: "ns.add".to_string(),
                        args: vec![typed_var("x", SemType::Int), lambda],
                        options: Box::new(CallOptions::default()),
                    },
                    ty: SemType::Int,
                    span: Span::default(),
                },
        }],
        outputs: vec![],
    };
    let err = lower(&typed, &registry).unwrap_err();
    assert!(matches!(err, CompileError::LambdaClosureNotSupported { var, .. } if var == "outer"));
}

#[test]
fn interpolated_output_expression_wires_free_variable_edges() {
    let registry = registry_with_add();
    let expr = TypedExpr {
        kind: TypedExprKind::Interpolate(vec![
                TypedInterpPart::Literal("value=".to_string()),
                TypedInterpPart::Expr(typed_var("x", SemType::Int)),
        ]),
        ty: SemType::String,
        span: Span::default(),
    };
    let typed = TypedPipeline {
        inputs: vec![TypedInput { name: "x".to_string(), ty: SemType::Int }],
        bindings: vec![TypedAssignment { name: "label".to_string(), expr }],
        outputs: vec![TypedOutput { name: "label".to_string(), ty: SemType::String }],
    };
    let dag = lower(&typed, &registry).expect("lowers cleanly");
    let data = dag.node_by_name("label").expect("data node");
    assert_eq!(dag.predecessors(&data.id).len(), 1);
}
