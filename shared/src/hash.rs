// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

/// Deterministic hasher builder used across the workspace.
///
/// `DefaultHasher::default()` seeds with fixed keys, so equal values hash
/// equal across independently built collections in the same process, which
/// the memoized collection hashes rely on.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// Hash a single value with the workspace default hasher.
#[inline]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    DefaultHashBuilder::default().hash_one(value)
}

/// Ordered sequence combiner: `h = 31*h + item`.
#[inline]
pub fn combine_ordered(acc: u64, item: u64) -> u64 {
    acc.wrapping_mul(31).wrapping_add(item)
}

/// Bit pattern used when hashing an `f64` element.
///
/// `-0.0` folds onto `0.0` so the two equal zeros hash alike.
#[inline]
pub fn canonical_f64_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}
