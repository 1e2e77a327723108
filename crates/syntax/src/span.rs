// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source spans and caret-style rendering: a `Span` (byte offset +
//! length) plus a line/column locator for diagnostic rendering.

use std::fmt;

/// A byte range in the original source: `(start_offset, length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn point(offset: usize) -> Self {
        Self::new(offset, 0)
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(&self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span::new(start, end - start)
    }
}

/// 1-based line and column for a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Locates the 1-based line/column of a byte offset within `source`.
pub fn locate_span(source: &str, offset: usize) -> LineCol {
    let mut line = 1;
    let mut last_newline = 0usize;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            last_newline = i + 1;
        }
    }
    LineCol {
        line,
        column: offset.saturating_sub(last_newline) + 1,
    }
}

/// Renders a rustc-style single-line caret snippet pointing at `span`.
pub fn context_snippet(source: &str, span: Span) -> String {
    let LineCol { line, column } = locate_span(source, span.start);
    let line_text = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let caret_count = span.length.max(1);
    format!(
        "{line:>4} | {line_text}\n | {pad}{carets}",
        pad = " ".repeat(column.saturating_sub(1)),
        carets = "^".repeat(caret_count),
    )
}

/// Full diagnostic context: the caret snippet plus the line/column it
/// points at, for embedding surfaces that want both.
pub fn diagnostic_context(source: &str, span: Span) -> (LineCol, String) {
    (locate_span(source, span.start), context_snippet(source, span))
}

#[cfg(test)]
#[path = "span_tests.rs"]
mod tests;
