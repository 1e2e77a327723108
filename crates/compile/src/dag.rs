// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compiled DAG: nodes, typed edges, and the topological layering
//! the runtime schedules layer-by-layer. Every node produces exactly one
//! value at output slot `"value"` — a module-call node's value is the
//! `Product` of its `produces` map, matching `dflow_registry::Module::
//! return_type`'s "a module always produces its `produces` shape as a
//! single record" decision, so field access downstream is just `Field`
//! projection rather than a second output-slot concept.

use crate::error::CompileError;
use crate::lambda::CompiledLambda;
use dflow_check::{CallOptions, TypedExpr};
use dflow_core::{NodeId, Type};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// The single output slot every node produces on.
pub const VALUE_SLOT: &str = "value";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
    /// No predecessors; value supplied at execution time.
    Input,
    /// Invokes a registered module.
    ModuleCall {
        module_fqn: String,
        options: CallOptions,
        /// Lambda arguments, keyed by the `consumes` slot they bind to
        ///.
        lambda_args: IndexMap<String, CompiledLambda>,
    },
    /// An intermediate variable derived by a pure expression.
    Data { expr: TypedExpr },
    /// Forwards a value to the result map.
    Output,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Source-level name: the input/binding/output identifier this node
    /// was compiled from (or a synthetic `name$argN` for a hoisted
    /// sub-expression — see `lower::lower`).
    pub name: String,
    pub kind: NodeKind,
    /// Declared input slots, by name, to their required type.
    pub input_shape: IndexMap<String, Type>,
    /// This node's single produced value type.
    pub output_type: Type,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub producer: NodeId,
    pub producer_slot: String,
    pub consumer: NodeId,
    pub consumer_slot: String,
    pub ty: Type,
}

/// A compiled data-flow graph. Acyclic by construction — `Dag::new`
/// is the only entry point and it refuses to return a cyclic graph.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Dag {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Dag {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn predecessors(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.consumer == id).collect()
    }

    pub fn successors(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.producer == id).collect()
    }

    /// Computes `layer(n) = 1 + max layer(p)` over predecessors, input
    /// nodes at layer 0, via Kahn's algorithm so acyclicity is
    /// verified as a side effect. Returns the variable-name cycle on
    /// failure.
    #[allow(clippy::expect_used)]
    pub fn layers(&self) -> Result<Vec<Vec<NodeId>>, CompileError> {
        let mut indegree: std::collections::HashMap<NodeId, usize> =
        self.nodes.iter().map(|n| (n.id.clone(), 0)).collect();
        for edge in &self.edges {
            *indegree.get_mut(&edge.consumer).expect("edge consumer is a known node") += 1;
        }

        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        let mut ready: VecDeque<NodeId> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| id.clone())
        .collect();
        // Deterministic ordering: iterate nodes in declaration order each layer.
        let order_index: std::collections::HashMap<NodeId, usize> =
        self.nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();

        let mut remaining: HashSet<NodeId> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut frontier: Vec<NodeId> = ready.drain(..).collect();
        frontier.sort_by_key(|id| order_index[id]);

        while !frontier.is_empty() {
            for id in &frontier {
                remaining.remove(id);
            }
            layers.push(frontier.clone());

            let mut next: Vec<NodeId> = Vec::new();
            for id in &frontier {
                for edge in self.successors(id) {
                    let deg = indegree.get_mut(&edge.consumer).expect("successor is a known node");
                    *deg -= 1;
                    if *deg == 0 {
                        next.push(edge.consumer.clone());
                    }
                }
            }
            next.sort_by_key(|id| order_index[id]);
            next.dedup();
            frontier = next;
        }

        if !remaining.is_empty() {
            let cycle = self.describe_cycle(&remaining);
            return Err(CompileError::CycleDetected { cycle });
        }

        Ok(layers)
    }

    /// Best-effort human-readable cycle path through the still-blocked
    /// node set, by walking predecessor edges until a name repeats.
    fn describe_cycle(&self, blocked: &HashSet<NodeId>) -> Vec<String> {
        let Some(start) = blocked.iter().next() else {
            return Vec::new();
        };
        let mut path = vec![start.clone()];
        let mut seen: HashSet<NodeId> = HashSet::new();
        seen.insert(start.clone());
        let mut current = start.clone();
        loop {
            let Some(next) = self
            .predecessors(&current)
            .into_iter()
            .map(|e| e.producer.clone())
            .find(|p| blocked.contains(p))
            else {
                break;
            };
            if seen.contains(&next) {
                path.push(next);
                break;
            }
            seen.insert(next.clone());
            path.push(next.clone());
            current = next;
        }
        path.into_iter()
        .map(|id| self.node(&id).map(|n| n.name.clone()).unwrap_or_else(|| id.to_string()))
        .collect()
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
