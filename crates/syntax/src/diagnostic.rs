// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! diagnostic format, shared by every compile-time stage (lexer,
//! parser, resolver, checker). A diagnostic never crashes the compile by
//! itself: every stage that can keeps going and accumulates more.

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Syntax,
    Reference,
    Type,
    Semantic,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            code: code.into(),
            category,
            severity,
            message: message.into(),
            span,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn error(code: impl Into<String>, category: Category, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, category, Severity::Error, message, span)
    }

    pub fn warning(code: impl Into<String>, category: Category, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, category, Severity::Warning, message, span)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Critical)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?}: {}", self.code, self.category, self.message)
    }
}

#[cfg(test)]
#[path = "diagnostic_tests.rs"]
mod tests;
