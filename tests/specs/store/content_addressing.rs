//! Structural hash stability under renaming/formatting, sensitivity to
//! real wiring/type changes, and a round-trip through the
//! content-addressed pipeline store.

use crate::prelude::*;
use dflow_registry::ModuleRegistry;
use dflow_store::{InMemoryPipelineStore, PipelineStore, StoredImage};

#[test]
fn renaming_a_binding_does_not_change_the_structural_hash() {
    let registry = ModuleRegistry::new();
    let a = compile_ok("in x: Int\ny = x\nout y\n", &registry);
    let b = compile_ok("in x: Int\nrenamed = x\nout renamed\n", &registry);

    assert_eq!(a.structural_hash, b.structural_hash);
    assert_ne!(a.syntactic_hash, b.syntactic_hash, "source bytes differ even though the DAG shape doesn't");
}

#[test]
fn reformatting_whitespace_does_not_change_the_structural_hash() {
    let registry = ModuleRegistry::new();
    let a = compile_ok("in x: Int\ny = x\nout y\n", &registry);
    let b = compile_ok("in x: Int\n\ny   =   x\n\nout y\n", &registry);

    assert_eq!(a.structural_hash, b.structural_hash);
}

#[test]
fn a_changed_declared_type_changes_the_structural_hash() {
    let registry = ModuleRegistry::new();
    let a = compile_ok("in x: Int\ny = x\nout y\n", &registry);
    let b = compile_ok("in x: Float\ny = x\nout y\n", &registry);

    assert_ne!(a.structural_hash, b.structural_hash);
}

#[test]
fn rewiring_which_input_feeds_a_binding_changes_the_structural_hash() {
    let registry = ModuleRegistry::new();
    let a = compile_ok("in x: Int\nin z: Int\ny = x\nout y\n", &registry);
    let b = compile_ok("in x: Int\nin z: Int\ny = z\nout y\n", &registry);

    assert_ne!(a.structural_hash, b.structural_hash);
}

#[tokio::test]
async fn a_compiled_image_round_trips_through_the_store_by_hash_and_by_alias() {
    let registry = ModuleRegistry::new();
    let image = compile_ok("in x: Int\ny = x\nout y\n", &registry);
    let stored = StoredImage::new(image.clone(), 0);
    let structural_hash = stored.structural_hash().to_string();

    let store = InMemoryPipelineStore::new();
    store.put(stored).await.expect("put");

    let by_hash = store.get(&structural_hash).await.expect("get").expect("present");
    assert_eq!(by_hash.structural_hash(), structural_hash);

    store.alias_put("trim_identity", &structural_hash).await.expect("alias_put");
    let by_alias = store.get("trim_identity").await.expect("get").expect("present");
    assert_eq!(by_alias.structural_hash(), structural_hash);

    let versions = store.versions("trim_identity").await.expect("versions");
    assert_eq!(versions.len(), 1);
    assert!(versions[0].active);
}

#[tokio::test]
async fn putting_the_same_image_twice_is_idempotent() {
    let registry = ModuleRegistry::new();
    let image = compile_ok("in x: Int\ny = x\nout y\n", &registry);
    let store = InMemoryPipelineStore::new();

    store.put(StoredImage::new(image.clone(), 0)).await.expect("first put");
    store.put(StoredImage::new(image.clone(), 1)).await.expect("second put");

    let all = store.list().await.expect("list");
    assert_eq!(all.len(), 1, "the existing entry wins; the second put does not duplicate it");
}
