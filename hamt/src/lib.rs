// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Persistent hash map and set over a hash-array-mapped trie.
//!
//! Keys are placed by 5-bit slices of their 64-bit hash. Small interior
//! nodes are bitmap-compressed; a node promotes to a flat 32-slot array
//! form when it would exceed 16 occupied slots and demotes back once it
//! drains to 8 children, which gives the two representations hysteresis at
//! the boundary. Keys whose full hashes collide share one collision node.
//!
//! Updates return new values sharing all untouched nodes; [`TransientMap`]
//! and [`TransientSet`] are the mutate-in-place builders, and the
//! [`HashSet`] algebra (union, intersection, difference) is built on them.

mod error;
mod iter;
mod map;
mod node;
mod ser;
mod set;
mod transient;

pub use error::Error;
pub use iter::{Iter, Keys, Values};
pub use map::HashMap;
pub use pcoll_shared::DefaultHashBuilder;
pub use set::HashSet;
pub use transient::{TransientMap, TransientSet};

/// Bits of the hash consumed per trie level.
pub(crate) const BITS: u32 = 5;
/// Branching factor.
pub(crate) const WIDTH: usize = 1 << BITS;
/// Mask extracting one level's slot from a hash.
pub(crate) const MASK: u64 = (WIDTH - 1) as u64;

/// Build a [`HashMap`] from `key => value` pairs:
///
/// ```
/// use pcoll_hamt::phashmap;
///
/// let m = phashmap!{1 => "one", 2 => "two"};
/// assert_eq!(m.get(&2), Some(&"two"));
/// ```
#[macro_export]
macro_rules! phashmap {
    () => { $crate::HashMap::new() };
    ($($k:expr => $v:expr),+ $(,)?) => {
        <$crate::HashMap<_, _> as ::core::iter::FromIterator<_>>::from_iter([$(($k, $v)),+])
    };
}

/// Build a [`HashSet`] from the given elements:
///
/// ```
/// use pcoll_hamt::phashset;
///
/// let s = phashset![1, 2, 3];
/// assert!(s.contains(&2));
/// ```
#[macro_export]
macro_rules! phashset {
    () => { $crate::HashSet::new() };
    ($($x:expr),+ $(,)?) => {
        <$crate::HashSet<_> as ::core::iter::FromIterator<_>>::from_iter([$($x),+])
    };
}
