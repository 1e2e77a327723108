// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lowers a `TypedPipeline` into a `Dag`. Each `Assignment` becomes
//! either a module-call node (RHS is, or contains, a `Call`) or a data
//! node (a pure expression); nested calls (e.g. `Mod1(Mod2(x))`) are
//! hoisted into their own module-call nodes rather than inlined, since a
//! module invocation is always its own schedulable unit.

use crate::dag::{Dag, Node, NodeKind, VALUE_SLOT};
use crate::error::CompileError;
use crate::lambda::{free_var_outside, CompiledLambda};
use dflow_check::{CallOptions, TypedAssignment, TypedExpr, TypedExprKind, TypedInterpPart, TypedPipeline};
use dflow_registry::ModuleRegistry;
use dflow_core::{NodeId, Type};
use indexmap::IndexMap;
use std::collections::HashSet;

struct Builder<'a> {
    registry: &'a ModuleRegistry,
    nodes: Vec<Node>,
    edges: Vec<crate::dag::Edge>,
    scope: IndexMap<String, (NodeId, Type)>,
    counter: u64,
}

impl<'a> Builder<'a> {
    fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry, nodes: Vec::new(), edges: Vec::new(), scope: IndexMap::new(), counter: 0 }
    }

    fn fresh_id(&mut self) -> NodeId {
        self.counter += 1;
        NodeId::new(format!("n{}", self.counter))
    }

    fn add_input(&mut self, name: &str, ty: Type) {
        let id = self.fresh_id();
        self.nodes.push(Node {
                id: id.clone(),
                name: name.to_string(),
                kind: NodeKind::Input,
                input_shape: IndexMap::new(),
                output_type: ty.clone(),
        });
        self.scope.insert(name.to_string(), (id, ty));
    }

    fn add_output(&mut self, name: &str) -> Result<(), CompileError> {
        let (producer, ty) = self
        .scope
        .get(name)
        .cloned()
        .ok_or_else(|| CompileError::UndefinedVariable(name.to_string()))?;
        let id = self.fresh_id();
        self.edges.push(crate::dag::Edge {
                producer,
                producer_slot: VALUE_SLOT.to_string(),
                consumer: id.clone(),
                consumer_slot: VALUE_SLOT.to_string(),
                ty: ty.clone(),
        });
        self.nodes.push(Node {
                id,
                name: name.to_string(),
                kind: NodeKind::Output,
                input_shape: [(VALUE_SLOT.to_string(), ty.clone())].into_iter().collect(),
                output_type: ty,
        });
        Ok(())
    }

    fn add_binding(&mut self, assignment: &TypedAssignment) -> Result<(), CompileError> {
        match &assignment.expr.kind {
            TypedExprKind::Call { module, args, options } => {
                let mut synth = Vec::new();
                let hoisted_args: Vec<TypedExpr> = args
                .iter()
                .map(|a| self.hoist_calls(a, &assignment.name, &mut synth))
                .collect();
                for (name, expr) in synth {
                    self.add_binding(&TypedAssignment { name, expr })?;
                }
                self.build_module_call(&assignment.name, module, &hoisted_args, options)?;
            }
            _ => {
                let mut synth = Vec::new();
                let rewritten = self.hoist_calls(&assignment.expr, &assignment.name, &mut synth);
                for (name, expr) in synth {
                    self.add_binding(&TypedAssignment { name, expr })?;
                }
                self.build_data_node(&assignment.name, &rewritten)?;
            }
        }
        Ok(())
    }

    /// Recursively extracts every `Call` subexpression into a synthetic
    /// named binding (appended to `synth`), replacing it in-place with a
    /// `Var` reference. Does not descend into `Lambda` bodies — those stay
    /// inline as compile-time-only metadata.
    fn hoist_calls(&mut self, expr: &TypedExpr, owner: &str, synth: &mut Vec<(String, TypedExpr)>) -> TypedExpr {
        let kind = match &expr.kind {
            TypedExprKind::Call { module, args, options } => {
                let hoisted_args: Vec<TypedExpr> =
                args.iter().map(|a| self.hoist_calls(a, owner, synth)).collect();
                let synth_name = format!("{owner}$call{}", synth.len() + 1);
                let call_expr = TypedExpr {
                    kind: TypedExprKind::Call {
                        module: module.clone(),
                        args: hoisted_args,
                        options: options.clone(),
                    },
                    ty: expr.ty.clone(),
                    span: expr.span,
                };
                synth.push((synth_name.clone(), call_expr));
                TypedExprKind::Var(synth_name)
            }
            TypedExprKind::Var(v) => TypedExprKind::Var(v.clone()),
            TypedExprKind::IntLit(n) => TypedExprKind::IntLit(*n),
            TypedExprKind::FloatLit(f) => TypedExprKind::FloatLit(*f),
            TypedExprKind::BoolLit(b) => TypedExprKind::BoolLit(*b),
            TypedExprKind::StringLit(s) => TypedExprKind::StringLit(s.clone()),
            TypedExprKind::Interpolate(parts) => TypedExprKind::Interpolate(
                parts
                .iter()
                .map(|p| match p {
                        TypedInterpPart::Literal(s) => TypedInterpPart::Literal(s.clone()),
                        TypedInterpPart::Expr(e) => TypedInterpPart::Expr(self.hoist_calls(e, owner, synth)),
                })
                .collect(),
            ),
            TypedExprKind::ListLit(items) => {
                TypedExprKind::ListLit(items.iter().map(|e| self.hoist_calls(e, owner, synth)).collect())
            }
            TypedExprKind::RecordLit(fields) => TypedExprKind::RecordLit(
                fields.iter().map(|(n, e)| (n.clone(), self.hoist_calls(e, owner, synth))).collect(),
            ),
            TypedExprKind::Field(e, f) => {
                TypedExprKind::Field(Box::new(self.hoist_calls(e, owner, synth)), f.clone())
            }
            TypedExprKind::Project(e, fs) => {
                TypedExprKind::Project(Box::new(self.hoist_calls(e, owner, synth)), fs.clone())
            }
            TypedExprKind::Merge(a, b) => TypedExprKind::Merge(
                Box::new(self.hoist_calls(a, owner, synth)),
                Box::new(self.hoist_calls(b, owner, synth)),
            ),
            TypedExprKind::If { cond, then_branch, else_branch } => TypedExprKind::If {
                cond: Box::new(self.hoist_calls(cond, owner, synth)),
                then_branch: Box::new(self.hoist_calls(then_branch, owner, synth)),
                else_branch: Box::new(self.hoist_calls(else_branch, owner, synth)),
            },
            TypedExprKind::Branch { arms, otherwise } => TypedExprKind::Branch {
                arms: arms
                .iter()
                .map(|(c, e)| (self.hoist_calls(c, owner, synth), self.hoist_calls(e, owner, synth)))
                .collect(),
                otherwise: Box::new(self.hoist_calls(otherwise, owner, synth)),
            },
            TypedExprKind::Compare { op, lhs, rhs } => TypedExprKind::Compare {
                op: *op,
                lhs: Box::new(self.hoist_calls(lhs, owner, synth)),
                rhs: Box::new(self.hoist_calls(rhs, owner, synth)),
            },
            TypedExprKind::Arith { op, lhs, rhs } => TypedExprKind::Arith {
                op: *op,
                lhs: Box::new(self.hoist_calls(lhs, owner, synth)),
                rhs: Box::new(self.hoist_calls(rhs, owner, synth)),
            },
            TypedExprKind::BoolBinary { op, lhs, rhs } => TypedExprKind::BoolBinary {
                op: *op,
                lhs: Box::new(self.hoist_calls(lhs, owner, synth)),
                rhs: Box::new(self.hoist_calls(rhs, owner, synth)),
            },
            TypedExprKind::Not(e) => TypedExprKind::Not(Box::new(self.hoist_calls(e, owner, synth))),
            TypedExprKind::Coalesce(a, b) => TypedExprKind::Coalesce(
                Box::new(self.hoist_calls(a, owner, synth)),
                Box::new(self.hoist_calls(b, owner, synth)),
            ),
            TypedExprKind::Guard { expr: e, cond } => TypedExprKind::Guard {
                expr: Box::new(self.hoist_calls(e, owner, synth)),
                cond: Box::new(self.hoist_calls(cond, owner, synth)),
            },
            TypedExprKind::Lambda { params, body } => {
                TypedExprKind::Lambda { params: params.clone(), body: body.clone() }
            }
        };
        TypedExpr { kind, ty: expr.ty.clone(), span: expr.span }
    }

    fn build_module_call(
        &mut self,
        name: &str,
        module_fqn: &str,
        args: &[TypedExpr],
        options: &CallOptions,
    ) -> Result<(), CompileError> {
        let module = self.registry.lookup_fqn(module_fqn)?;
        let param_names: Vec<String> = module.consumes.keys().cloned().collect();
        let id = self.fresh_id();

        let mut lambda_args = IndexMap::new();
        for (i, arg) in args.iter().enumerate() {
            let slot = param_names.get(i).cloned().unwrap_or_else(|| format!("arg{i}"));
            if let TypedExprKind::Lambda { params, body } = &arg.kind {
                let param = params.first().cloned().unwrap_or_default();
                if let Some(bad) = free_var_outside(body, &param) {
                    return Err(CompileError::LambdaClosureNotSupported {
                            module: module_fqn.to_string(),
                            var: bad,
                    });
                }
                lambda_args.insert(slot, CompiledLambda { param, body: (**body).clone() });
                continue;
            }
            self.wire_arg(id.clone(), &slot, arg)?;
        }

        let output_type = module.return_type();
        self.nodes.push(Node {
                id: id.clone(),
                name: name.to_string(),
                kind: NodeKind::ModuleCall {
                    module_fqn: module.qualified_name.clone(),
                    options: options.clone(),
                    lambda_args,
                },
                input_shape: module.consumes.clone(),
                output_type: output_type.clone(),
        });
        self.scope.insert(name.to_string(), (id, output_type));
        Ok(())
    }

    fn build_data_node(&mut self, name: &str, expr: &TypedExpr) -> Result<(), CompileError> {
        let ty = expr
        .ty
        .to_runtime()
        .ok_or_else(|| CompileError::OpenTypeEscaped { name: name.to_string() })?;
        let id = self.fresh_id();

        let mut free = HashSet::new();
        collect_free_vars(expr, &mut free);
        let mut input_shape = IndexMap::new();
        for var in &free {
            let (producer, var_ty) = self
            .scope
            .get(var)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedVariable(var.clone()))?;
            self.edges.push(crate::dag::Edge {
                    producer,
                    producer_slot: VALUE_SLOT.to_string(),
                    consumer: id.clone(),
                    consumer_slot: var.clone(),
                    ty: var_ty.clone(),
            });
            input_shape.insert(var.clone(), var_ty);
        }

        self.nodes.push(Node {
                id: id.clone(),
                name: name.to_string(),
                kind: NodeKind::Data { expr: expr.clone() },
                input_shape,
                output_type: ty.clone(),
        });
        self.scope.insert(name.to_string(), (id, ty));
        Ok(())
    }

    /// Wires a module-call argument: a bare `Var` wires directly to its
    /// producer; anything else is hoisted into its own data node first
    ///.
    #[allow(clippy::expect_used)]
    fn wire_arg(&mut self, consumer: NodeId, slot: &str, arg: &TypedExpr) -> Result<(), CompileError> {
        if let TypedExprKind::Var(name) = &arg.kind {
            let (producer, ty) = self
            .scope
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
            self.edges.push(crate::dag::Edge {
                    producer,
                    producer_slot: VALUE_SLOT.to_string(),
                    consumer,
                    consumer_slot: slot.to_string(),
                    ty,
            });
            return Ok(());
        }

        let synth_name = format!("$arg{}", self.counter + 1);
        self.build_data_node(&synth_name, arg)?;
        let (producer, ty) = self.scope.get(&synth_name).cloned().expect("just inserted");
        self.edges.push(crate::dag::Edge {
                producer,
                producer_slot: VALUE_SLOT.to_string(),
                consumer,
                consumer_slot: slot.to_string(),
                ty,
        });
        Ok(())
    }

    fn finish(self) -> Dag {
        Dag { nodes: self.nodes, edges: self.edges }
    }
}

fn collect_free_vars(expr: &TypedExpr, out: &mut HashSet<String>) {
    collect_free_vars_bound(expr, &HashSet::new(), out)
}

fn collect_free_vars_bound(expr: &TypedExpr, bound: &HashSet<String>, out: &mut HashSet<String>) {
    match &expr.kind {
        TypedExprKind::Var(name) => {
            if !bound.contains(name) {
                out.insert(name.clone());
            }
        }
        TypedExprKind::IntLit(_)
        | TypedExprKind::FloatLit(_)
        | TypedExprKind::BoolLit(_)
        | TypedExprKind::StringLit(_) => {}
        TypedExprKind::Interpolate(parts) => {
            for p in parts {
                if let TypedInterpPart::Expr(e) = p {
                    collect_free_vars_bound(e, bound, out);
                }
            }
        }
        TypedExprKind::ListLit(items) => items.iter().for_each(|e| collect_free_vars_bound(e, bound, out)),
        TypedExprKind::RecordLit(fields) => {
            fields.iter().for_each(|(_, e)| collect_free_vars_bound(e, bound, out))
        }
        TypedExprKind::Field(e, _) | TypedExprKind::Project(e, _) | TypedExprKind::Not(e) => {
            collect_free_vars_bound(e, bound, out)
        }
        TypedExprKind::Merge(a, b) | TypedExprKind::Coalesce(a, b) => {
            collect_free_vars_bound(a, bound, out);
            collect_free_vars_bound(b, bound, out);
        }
        TypedExprKind::If { cond, then_branch, else_branch } => {
            collect_free_vars_bound(cond, bound, out);
            collect_free_vars_bound(then_branch, bound, out);
            collect_free_vars_bound(else_branch, bound, out);
        }
        TypedExprKind::Branch { arms, otherwise } => {
            for (c, e) in arms {
                collect_free_vars_bound(c, bound, out);
                collect_free_vars_bound(e, bound, out);
            }
            collect_free_vars_bound(otherwise, bound, out);
        }
        TypedExprKind::Compare { lhs, rhs,.. }
        | TypedExprKind::Arith { lhs, rhs,.. }
        | TypedExprKind::BoolBinary { lhs, rhs,.. } => {
            collect_free_vars_bound(lhs, bound, out);
            collect_free_vars_bound(rhs, bound, out);
        }
        TypedExprKind::Guard { expr: e, cond } => {
            collect_free_vars_bound(e, bound, out);
            collect_free_vars_bound(cond, bound, out);
        }
        TypedExprKind::Lambda { params, body } => {
            let mut inner_bound = bound.clone();
            inner_bound.extend(params.iter().cloned());
            collect_free_vars_bound(body, &inner_bound, out);
        }
        TypedExprKind::Call { args,.. } => args.iter().for_each(|e| collect_free_vars_bound(e, bound, out)),
    }
}

/// Lowers a checked `TypedPipeline` into a `Dag`. `registry` must be
/// the same snapshot the checker resolved module calls against — a module
/// going missing between check and compile surfaces as
/// `CompileError::ModuleNotFound` rather than a panic.
pub fn lower(typed: &TypedPipeline, registry: &ModuleRegistry) -> Result<Dag, CompileError> {
    let mut builder = Builder::new(registry);
    for input in &typed.inputs {
        let ty = input
        .ty
        .to_runtime()
        .ok_or_else(|| CompileError::OpenTypeEscaped { name: input.name.clone() })?;
        builder.add_input(&input.name, ty);
    }
    for binding in &typed.bindings {
        builder.add_binding(binding)?;
    }
    for output in &typed.outputs {
        builder.add_output(&output.name)?;
    }
    let dag = builder.finish();
    // Acyclicity is enforced as a side effect of computing layers once here
    // so a bad lowering never escapes as a silently-cyclic Dag.
    dag.layers()?;
    Ok(dag)
}

#[cfg(test)]
#[path = "lower_tests.rs"]
mod tests;
