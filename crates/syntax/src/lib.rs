// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lexer/parser: source text to AST with source spans, never
//! panicking on malformed input.

mod ast;
mod diagnostic;
mod lexer;
mod parser;
mod span;
mod token;

pub use ast::{
    parse_duration, ArithOp, Assignment, BackoffKind, BoolOp, CompareOp, Expr, ExprKind,
    InputDecl, InterpPart, Item, Literal, OnErrorKind, OptionArg, OptionValue, OutputDecl,
    Pipeline, Priority, TypeDefDecl, TypeExpr, TypeExprKind, UseDecl,
};
pub use diagnostic::{Category, Diagnostic, Severity};
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::{context_snippet, diagnostic_context, locate_span, LineCol, Span};
pub use token::{Token, TokenKind};
