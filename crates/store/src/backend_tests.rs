// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

trait Label: Send + Sync {
    fn label(&self) -> &str;
}

struct Named(&'static str);

impl Label for Named {
    fn label(&self) -> &str {
        self.0
    }
}

#[test]
fn resolve_returns_the_registered_backend() {
    let mut registry = BackendRegistry::new("memory", Arc::new(Named("memory")) as Arc<dyn Label>);
    registry.register("fs", Arc::new(Named("fs")));

    assert_eq!(registry.resolve("fs").label(), "fs");
    assert_eq!(registry.resolve("memory").label(), "memory");
}

#[test]
fn resolve_falls_back_to_default_for_an_unknown_name() {
    let registry = BackendRegistry::new("memory", Arc::new(Named("memory")) as Arc<dyn Label>);
    assert_eq!(registry.resolve("nonexistent").label(), "memory");
}

#[test]
fn registering_over_the_default_name_replaces_it() {
    let mut registry = BackendRegistry::new("memory", Arc::new(Named("first")) as Arc<dyn Label>);
    registry.register("memory", Arc::new(Named("second")));
    assert_eq!(registry.resolve("memory").label(), "second");
    // An unknown name still falls back to the (now-replaced) default entry.
    assert_eq!(registry.resolve("nope").label(), "second");
}
