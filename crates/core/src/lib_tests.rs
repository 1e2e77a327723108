// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn execution_id_short_is_exposed_at_crate_root() {
    let id = ExecutionId::new("11112222333344445555");
    assert_eq!(id.short(8), "11112222");
}

#[test]
fn node_id_and_module_fqn_round_trip_as_strings() {
    let node = NodeId::new("n0");
    assert_eq!(node.as_str(), "n0");
    let module = ModuleFqn::new("stdlib.math.add");
    assert_eq!(module.to_string(), "stdlib.math.add");
}
