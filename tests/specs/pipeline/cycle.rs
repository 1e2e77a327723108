//! The grammar only allows a binding to reference names declared
//! earlier, so the dependency among `a = b + {x:1}; b = a + {y:2}` is
//! rejected at name resolution (`E001`, undefined variable `b`) rather
//! than reaching the DAG compiler at all: no source the checker accepts
//! can describe a true cycle, which is exactly what makes the
//! compiler's topological sort an invariant check rather than a
//! reachable error path for this grammar (see DESIGN.md).

use crate::prelude::*;
use dflow_registry::ModuleRegistry;

#[test]
fn mutual_forward_reference_is_rejected_before_it_can_become_a_cycle() {
    let source = "a = b + {x: 1}\nb = a + {y: 2}\nout a\n";
    let diags = try_compile(source, &ModuleRegistry::new()).expect_err("should not compile");

    assert!(diags.iter().any(|d| d.code == "E001"), "expected E001 among {diags:?}");
}

#[test]
fn a_pipeline_with_only_backward_references_compiles_to_an_acyclic_dag() {
    let source = "in x: Int\ny = x\nz = y\nout z\n";
    let image = compile_ok(source, &ModuleRegistry::new());

    // Acyclicity: a topological layering must exist.
    let layers = image.dag.layers().expect("acyclic DAG always has a topological layering");
    assert!(layers.len() >= 2, "an input layer followed by at least one derived layer");
}
