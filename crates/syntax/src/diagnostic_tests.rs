// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn warning_is_not_fatal() {
    let d = Diagnostic::warning("OPTS001", Category::Semantic, "delay set but retry unset", Span::point(0));
    assert!(!d.is_fatal());
}

#[test]
fn error_is_fatal() {
    let d = Diagnostic::error("E010", Category::Type, "type mismatch", Span::point(0));
    assert!(d.is_fatal());
}

#[test]
fn suggestion_is_attached() {
    let d = Diagnostic::error("E001", Category::Reference, "undefined variable `nam`", Span::point(0))
    .with_suggestion("did you mean `name`?");
    assert_eq!(d.suggestion.as_deref(), Some("did you mean `name`?"));
}
