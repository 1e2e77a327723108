//! Passing an `Int` where a module declares `String` fails the compile
//! with a single `E010` diagnostic pointing at the offending argument.

use crate::prelude::*;
use dflow_registry::ModuleRegistry;
use dflow_syntax::Category;

#[test]
fn mismatched_argument_type_is_a_single_type_error() {
    let source = "in n: Int\nresult = stdlib.string.uppercase(n)\nout result\n";
    let diags = try_compile(source, &stdlib_registry()).expect_err("should not compile");

    assert_eq!(diags.len(), 1, "a single diagnostic, not a cascade: {diags:?}");
    assert_eq!(diags[0].code, "E010");
    assert_eq!(diags[0].category, Category::Type);
}

#[test]
fn fallback_type_not_a_subtype_of_return_type_is_e017() {
    let source = "result = stdlib.math.add(1, 2) with fallback: \"oops\"\nout result\n";
    let diags = try_compile(source, &stdlib_registry()).expect_err("should not compile");

    assert!(diags.iter().any(|d| d.code == "E017"), "expected E017 among {diags:?}");
}

#[test]
fn arithmetic_on_non_numeric_operands_is_rejected() {
    let source = "in a: String\nin b: String\nresult = a - b\nout result\n";
    let diags = try_compile(source, &ModuleRegistry::new()).expect_err("should not compile");

    assert!(!diags.is_empty());
    assert!(diags.iter().all(|d| d.category == Category::Type));
}
