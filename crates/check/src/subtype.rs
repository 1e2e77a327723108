// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! subtyping and `join`, lifted onto `SemType`: adds `Nothing` as a
//! universal bottom and function-type contra/covariance on top of
//! `dflow_core::is_subtype`'s rules for the shared constructors.

use crate::semtype::SemType;
use indexmap::IndexMap;

/// `S <: T` over semantic types. `Nothing` is a subtype of
/// everything; `OpenProduct` never appears on either side here — the row
/// must be resolved (`RowEnv::unify_open_with_closed`) before the lambda's
/// parameter type is compared against anything else.
pub fn is_subtype(sub: &SemType, sup: &SemType) -> bool {
    match (sub, sup) {
        (SemType::Nothing, _) => true,
        (a, b) if a == b => true,
        (SemType::List(s), SemType::List(t)) => is_subtype(s, t),
        (SemType::Map(k1, v1), SemType::Map(k2, v2)) => k1 == k2 && is_subtype(v1, v2),
        (SemType::Optional(s), SemType::Optional(t)) => is_subtype(s, t),
        (SemType::Product(a), SemType::Product(b)) => {
            b.iter().all(|(name, t)| a.get(name).is_some_and(|s| is_subtype(s, t)))
        }
        (SemType::Union(members), t) if !matches!(t, SemType::Union(_)) => {
            members.values().all(|m| is_subtype(m, t))
        }
        (t, SemType::Union(members)) if !matches!(t, SemType::Union(_)) => {
            members.values().any(|m| is_subtype(t, m))
        }
        (SemType::Union(a), SemType::Union(b)) => {
            a.values().all(|am| b.values().any(|bm| is_subtype(am, bm)))
        }
        (SemType::Function(p1, r1), SemType::Function(p2, r2)) => {
            p1.len() == p2.len()
            && p1.iter().zip(p2).all(|(a, b)| is_subtype(b, a))
            && is_subtype(r1, r2)
        }
        _ => false,
    }
}

/// Least upper bound, extended with `Nothing` as the identity element —
/// `join(Nothing, T) = T` — used for `[]`'s element type and for branches
/// of a conditional where one arm is unreachable.
pub fn join(a: &SemType, b: &SemType) -> SemType {
    match (a, b) {
        (SemType::Nothing, other) | (other, SemType::Nothing) => other.clone(),
        (a, b) if a == b => a.clone(),
        (SemType::List(x), SemType::List(y)) => SemType::list(join(x, y)),
        (SemType::Optional(x), SemType::Optional(y)) => SemType::optional(join(x, y)),
        (SemType::Optional(x), y) | (y, SemType::Optional(x)) => SemType::optional(join(x, y)),
        (SemType::Map(k1, v1), SemType::Map(k2, v2)) if k1 == k2 => {
            SemType::Map(k1.clone(), Box::new(join(v1, v2)))
        }
        (SemType::Product(fa), SemType::Product(fb)) => {
            let mut common = IndexMap::new();
            for (name, ta) in fa {
                if let Some(tb) = fb.get(name) {
                    common.insert(name.clone(), if ta == tb { ta.clone() } else { join(ta, tb) });
                }
            }
            SemType::Product(common)
        }
        (SemType::Union(ma), SemType::Union(mb)) => {
            let mut merged = ma.clone();
            for (tag, ty) in mb {
                merged.entry(tag.clone()).or_insert_with(|| ty.clone());
            }
            SemType::Union(merged)
        }
        (SemType::Union(m), other) | (other, SemType::Union(m)) => {
            let mut merged = m.clone();
            merged.entry(other.to_string()).or_insert_with(|| other.clone());
            SemType::Union(merged)
        }
        _ => {
            let mut members = IndexMap::new();
            members.insert(a.to_string(), a.clone());
            members.insert(b.to_string(), b.clone());
            SemType::Union(members)
        }
    }
}

#[cfg(test)]
#[path = "subtype_tests.rs"]
mod tests;
