// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! subtyping and `join` over the runtime `Type`. This is the
//! module-boundary relation (`is_subtype`); `dflow-check`'s bidirectional
//! checker layers row polymorphism and the bottom type `Nothing` on top of
//! this for compile-time `SemType`s, then asserts the result is `Nothing`-
//! and row-free before calling back into this relation.

use crate::types::Type;
use indexmap::IndexMap;

/// `S <: T`. Primitive subtyping is identity only — there is no
/// `Int <: Float` promotion.
pub fn is_subtype(sub: &Type, sup: &Type) -> bool {
    match (sub, sup) {
        (a, b) if a == b => true,
        (Type::List(s), Type::List(t)) => is_subtype(s, t),
        (Type::Map(k1, v1), Type::Map(k2, v2)) => k1 == k2 && is_subtype(v1, v2),
        (Type::Optional(s), Type::Optional(t)) => is_subtype(s, t),
        (Type::Product(a), Type::Product(b)) => {
            // Width + depth subtyping: a record with more fields is a
            // subtype of one with fewer, provided every field the
            // supertype names is present and covariant.
            b.iter().all(|(name, t)| {
                    a.get(name).is_some_and(|s| is_subtype(s, t))
            })
        }
        (Type::Union(members), t) if !matches!(t, Type::Union(_)) => {
            // union U <: T iff every member of U is <: T.
            members.values().all(|m| is_subtype(m, t))
        }
        (t, Type::Union(members)) if !matches!(t, Type::Union(_)) => {
            members.values().any(|m| is_subtype(t, m))
        }
        (Type::Union(a), Type::Union(b)) => {
            // Flatten + bidirectional rule: U <: T iff every member of U
            // is <: some acceptable target. Here both sides are unions, so
            // every member of `a` must be a subtype of *some* member of `b`.
            a.values()
            .all(|am| b.values().any(|bm| is_subtype(am, bm)))
        }
        _ => false,
    }
}

/// Computes the least upper bound of two types, used for mixed-element
/// list literals and the two arms of a conditional. Joining two
/// records yields the intersection of their fields; joining disjoint
/// primitives (or anything else incompatible) yields a union of both.
pub fn join(a: &Type, b: &Type) -> Type {
    if a == b {
        return a.clone();
    }
    match (a, b) {
        (Type::List(x), Type::List(y)) => Type::list(join(x, y)),
        (Type::Optional(x), Type::Optional(y)) => Type::optional(join(x, y)),
        (Type::Optional(x), y) | (y, Type::Optional(x)) => Type::optional(join(x, y)),
        (Type::Map(k1, v1), Type::Map(k2, v2)) if k1 == k2 => Type::map((**k1).clone(), join(v1, v2)),
        (Type::Product(fa), Type::Product(fb)) => {
            let mut common = IndexMap::new();
            for (name, ta) in fa {
                if let Some(tb) = fb.get(name) {
                    if ta == tb {
                        common.insert(name.clone(), ta.clone());
                    } else {
                        common.insert(name.clone(), join(ta, tb));
                    }
                }
            }
            Type::Product(common)
        }
        (Type::Union(ma), Type::Union(mb)) => {
            let mut merged = ma.clone();
            for (tag, ty) in mb {
                merged.entry(tag.clone()).or_insert_with(|| ty.clone());
            }
            Type::Union(merged)
        }
        (Type::Union(m), other) | (other, Type::Union(m)) => {
            let mut merged = m.clone();
            merged
            .entry(primitive_tag(other))
            .or_insert_with(|| other.clone());
            Type::Union(merged)
        }
        _ => {
            let mut members = IndexMap::new();
            members.insert(primitive_tag(a), a.clone());
            members.insert(primitive_tag(b), b.clone());
            Type::Union(members)
        }
    }
}

fn primitive_tag(ty: &Type) -> String {
    ty.to_string()
}

#[cfg(test)]
#[path = "subtype_tests.rs"]
mod tests;
