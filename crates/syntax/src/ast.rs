// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The AST produced by the parser. Every node category — decl,
//! type expression, expression — is a tagged variant carrying a shared
//! `span` field rather than participating in an inheritance hierarchy
//! (Design Note "polymorphic AST over mixin-style nodes").

use crate::span::Span;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Use(UseDecl),
    TypeDef(TypeDefDecl),
    Input(InputDecl),
    Assignment(Assignment),
    Output(OutputDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub namespace: String,
    pub alias: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub examples: Vec<Literal>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputDecl {
    pub name: String,
    pub span: Span,
}

/// A type-level literal, used only in `@example(...)` annotations.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    String,
    Int,
    Float,
    Boolean,
    List(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    Record(Vec<(String, TypeExpr)>),
    Union(Vec<TypeExpr>),
    /// An alias or unresolved type reference (`dflow-resolve` expands it).
    Ref(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ArithOp {
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Var(String),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    Interpolate(Vec<InterpPart>),
    ListLit(Vec<Expr>),
    RecordLit(Vec<(String, Expr)>),
    Field(Box<Expr>, String),
    Project(Box<Expr>, Vec<String>),
    Merge(Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Branch {
        arms: Vec<(Expr, Expr)>,
        otherwise: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    BoolBinary {
        op: BoolOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Coalesce(Box<Expr>, Box<Expr>),
    Guard {
        expr: Box<Expr>,
        cond: Box<Expr>,
    },
    /// Compile-time only: may appear only as an immediate argument to a
    /// host-provided higher-order module.
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    Call {
        module: String,
        args: Vec<Expr>,
        options: Vec<OptionArg>,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BackoffKind {
    Fixed,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OnErrorKind {
    Propagate,
    Skip,
    Log,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
    Background,
    Numeric(u8),
}

impl Priority {
    /// Numeric effective-priority base (0..100),.
    pub fn base(self) -> u8 {
        match self {
            Priority::Critical => 90,
            Priority::High => 70,
            Priority::Normal => 50,
            Priority::Low => 30,
            Priority::Background => 10,
            Priority::Numeric(n) => n,
        }
    }
}

/// A parsed `with` clause option, before any static validation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionArg {
    pub name: String,
    pub value: OptionValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    Duration(Duration),
    Ident(String),
    Str(String),
    Rate { count: i64, per: Duration },
    Expr(Box<Expr>),
}

/// Parses a duration literal like `100ms`, `5s`, `30min`, `1h`.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let idx = text.find(|c: char| c.is_alphabetic())?;
    let (number, unit) = text.split_at(idx);
    let value: f64 = number.parse().ok()?;
    let millis = match unit {
        "ms" => value,
        "s" => value * 1000.0,
        "min" => value * 60_000.0,
        "h" => value * 3_600_000.0,
        _ => return None,
    };
    Some(Duration::from_millis(millis as u64))
}

#[cfg(test)]
#[path = "ast_tests.rs"]
mod tests;
