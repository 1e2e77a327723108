// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;

struct Noop;

#[async_trait]
impl ModuleImpl for Noop {
    async fn invoke(
        &self,
        _consumed: IndexMap<String, Value>,
    ) -> Result<IndexMap<String, Value>, ModuleInvokeError> {
        Ok(IndexMap::new())
    }
}

#[test]
fn version_displays_as_major_dot_minor() {
    let v = ModuleVersion { major: 2, minor: 1 };
    assert_eq!(v.to_string(), "2.1");
}

#[test]
fn return_type_wraps_produces_in_a_record() {
    let module = Module {
        qualified_name: "stdlib.math.add".to_string(),
        version: ModuleVersion { major: 1, minor: 0 },
        consumes: IndexMap::new(),
        produces: [("sum".to_string(), Type::Int)].into_iter().collect(),
        implementation: Box::new(Noop),
        tags: vec![],
        metadata: ModuleMetadata::default(),
    };
    assert_eq!(
        module.return_type(),
        Type::record([("sum".to_string(), Type::Int)])
    );
}
