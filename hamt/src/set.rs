// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, Hasher};

use once_cell::sync::OnceCell;
use pcoll_shared::DefaultHashBuilder;

use crate::iter::Keys;
use crate::map::HashMap;
use crate::transient::TransientSet;

/// Persistent hash set: the map trie with the value slots fixed to `()`.
///
/// ```
/// use pcoll_hamt::phashset;
///
/// let a = phashset![1, 2, 3, 4];
/// let b = phashset![3, 4, 5, 6];
/// assert_eq!(a.intersection(&b), phashset![3, 4]);
/// assert_eq!(a.len(), 4);
/// ```
#[derive(Debug)]
pub struct HashSet<T, S = DefaultHashBuilder> {
    map: HashMap<T, (), S>,
    hash: OnceCell<u64>,
}

impl<T> HashSet<T> {
    /// The canonical empty set.
    pub fn new() -> Self {
        Self::from_map(HashMap::new())
    }
}

impl<T, S> HashSet<T, S> {
    pub(crate) fn from_map(map: HashMap<T, (), S>) -> Self {
        HashSet {
            map,
            hash: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Elements in an arbitrary but deterministic order.
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.map.keys()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Empty set using `hasher` to place elements.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_map(HashMap::with_hasher(hasher))
    }

    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(value)
    }

    /// New set with `value` added.
    pub fn insert(&self, value: T) -> Self {
        Self::from_map(self.map.set(value, ()))
    }

    /// New set without `value`; unchanged if absent.
    pub fn remove<Q>(&self, value: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self::from_map(self.map.remove(value))
    }

    /// Mutable builder sharing this set's nodes.
    pub fn to_transient(&self) -> TransientSet<T, S> {
        TransientSet::from_transient_map(self.map.to_transient())
    }

    /// Elements in either set. The larger operand seeds the builder.
    pub fn union(&self, other: &Self) -> Self {
        let (base, extra) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut transient = base.to_transient();
        for item in extra.iter() {
            transient.insert_impl(item.clone());
        }
        transient.finish()
    }

    /// Elements in both sets. The smaller operand drives the scan.
    pub fn intersection(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut transient = TransientSet::with_hasher(self.map.hasher().clone());
        for item in small.iter() {
            if large.contains(item) {
                transient.insert_impl(item.clone());
            }
        }
        transient.finish()
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut transient = TransientSet::with_hasher(self.map.hasher().clone());
        for item in self.iter() {
            if !other.contains(item) {
                transient.insert_impl(item.clone());
            }
        }
        transient.finish()
    }

    /// Elements in exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut transient = self.difference(other).to_transient();
        for item in other.iter() {
            if !self.contains(item) {
                transient.insert_impl(item.clone());
            }
        }
        transient.finish()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|item| other.contains(item))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T> Default for HashSet<T> {
    fn default() -> Self {
        HashSet::new()
    }
}

impl<T, S: Clone> Clone for HashSet<T, S> {
    fn clone(&self) -> Self {
        HashSet {
            map: self.map.clone(),
            hash: self.hash.clone(),
        }
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut transient = TransientSet::with_hasher(S::default());
        for item in iter {
            transient.insert_impl(item);
        }
        transient.finish()
    }
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
}

impl<T, S> Hash for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: XOR of the element hashes.
        let h = *self.hash.get_or_init(|| {
            self.iter()
                .fold(0u64, |acc, item| acc ^ self.map.hasher().hash_one(item))
        });
        state.write_u64(h);
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
