// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! typed intermediate representation: every binding and expression
//! annotated with its `SemType`, ready for `dflow-compile` to lower into a
//! DAG. Produced only when the checker finds zero fatal diagnostics.

use crate::options::CallOptions;
use crate::semtype::SemType;
use dflow_syntax::{ArithOp, BoolOp, CompareOp, Span};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypedPipeline {
    pub inputs: Vec<TypedInput>,
    pub bindings: Vec<TypedAssignment>,
    pub outputs: Vec<TypedOutput>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypedInput {
    pub name: String,
    pub ty: SemType,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypedAssignment {
    pub name: String,
    pub expr: TypedExpr,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypedOutput {
    pub name: String,
    pub ty: SemType,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: SemType,
    pub span: Span,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TypedExprKind {
    Var(String),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    Interpolate(Vec<TypedInterpPart>),
    ListLit(Vec<TypedExpr>),
    RecordLit(Vec<(String, TypedExpr)>),
    Field(Box<TypedExpr>, String),
    Project(Box<TypedExpr>, Vec<String>),
    Merge(Box<TypedExpr>, Box<TypedExpr>),
    If {
        cond: Box<TypedExpr>,
        then_branch: Box<TypedExpr>,
        else_branch: Box<TypedExpr>,
    },
    Branch {
        arms: Vec<(TypedExpr, TypedExpr)>,
        otherwise: Box<TypedExpr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    BoolBinary {
        op: BoolOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Not(Box<TypedExpr>),
    Coalesce(Box<TypedExpr>, Box<TypedExpr>),
    Guard {
        expr: Box<TypedExpr>,
        cond: Box<TypedExpr>,
    },
    /// Retained only as an immediate argument of a `Call` to a higher-order
    /// module; never appears standalone.
    Lambda {
        params: Vec<String>,
        body: Box<TypedExpr>,
    },
    Call {
        module: String,
        args: Vec<TypedExpr>,
        options: Box<CallOptions>,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TypedInterpPart {
    Literal(String),
    Expr(TypedExpr),
}
