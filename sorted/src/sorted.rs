// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pcoll_shared::{combine_ordered, hash_one};

use crate::iter::Iter;
use crate::node::{self, Ctx, Link};
use crate::transient::TransientSortedVector;
use crate::Error;

/// Extracts the sort key cached in each tree node.
pub trait SortKey<T> {
    type Key: Ord + Clone;

    fn key(&self, value: &T) -> Self::Key;
}

/// Orders elements by their own value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + Clone> SortKey<T> for Natural {
    type Key = T;

    fn key(&self, value: &T) -> T {
        value.clone()
    }
}

/// Orders elements by the key a closure derives from them.
#[derive(Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<T, K, F> SortKey<T> for ByKey<F>
where
    K: Ord + Clone,
    F: Fn(&T) -> K,
{
    type Key = K;

    fn key(&self, value: &T) -> K {
        (self.0)(value)
    }
}

impl<F> std::fmt::Debug for ByKey<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByKey")
    }
}

/// Persistent ordered sequence over a size-annotated left-leaning
/// red-black tree.
///
/// ```
/// use pcoll_sorted::SortedVector;
///
/// let v: SortedVector<u32> = [3, 1, 2].into_iter().collect();
/// assert_eq!(v.nth(1), Some(&2));
/// assert_eq!(v.rank(&3), 2);
/// ```
pub struct SortedVector<T, E: SortKey<T> = Natural> {
    root: Link<T, E::Key>,
    count: usize,
    extract: E,
    reverse: bool,
}

impl<T: std::fmt::Debug, E: SortKey<T>> std::fmt::Debug for SortedVector<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Ord + Clone> SortedVector<T> {
    /// The canonical empty vector under the natural element order.
    pub fn new() -> Self {
        Self::with_options(Natural, false)
    }

    /// Empty vector iterating from greatest to least.
    pub fn reversed() -> Self {
        Self::with_options(Natural, true)
    }
}

impl<T, E: SortKey<T>> SortedVector<T, E> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Elements in sort order.
    pub fn iter(&self) -> Iter<'_, T, E::Key> {
        Iter::new(&self.root, self.count)
    }

    /// Element at in-order position `i`.
    pub fn nth(&self, i: usize) -> Option<&T> {
        node::nth(&self.root, i)
    }

    pub fn first(&self) -> Option<&T> {
        node::leftmost(&self.root)
    }

    pub fn last(&self) -> Option<&T> {
        node::rightmost(&self.root)
    }

    /// Number of elements ordered strictly before `value`'s key.
    pub fn rank(&self, value: &T) -> usize {
        node::rank_below(&self.root, &self.extract.key(value), self.reverse)
    }

    /// Position of the first element equal to `value`, if present.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        node::position_of(&self.root, &self.extract.key(value), value, self.reverse, 0)
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Run `f` over every element in sort order, stopping at the first
    /// error, which is returned unchanged.
    pub fn for_each<F>(&self, mut f: F) -> anyhow::Result<()>
    where
        F: FnMut(&T) -> anyhow::Result<()>,
    {
        for item in self {
            f(item)?;
        }
        Ok(())
    }
}

impl<T, E: SortKey<T> + Clone> SortedVector<T, E> {
    /// Empty vector ordered by the extracted key.
    pub fn with_extractor(extract: E) -> Self {
        Self::with_options(extract, false)
    }

    /// Empty vector ordered by the extracted key, optionally reversed.
    pub fn with_options(extract: E, reverse: bool) -> Self {
        SortedVector {
            root: None,
            count: 0,
            extract,
            reverse,
        }
    }

    /// New vector with `value` inserted at its sorted position, after any
    /// existing elements with an equal key.
    pub fn insert(&self, value: T) -> Self
    where
        T: Clone,
    {
        let key = self.extract.key(&value);
        let ctx = Ctx {
            reverse: self.reverse,
            edit: None,
        };
        let mut root = node::insert(self.root.clone(), value, key, &ctx);
        root.red = false;
        SortedVector {
            root: Some(Arc::new(root)),
            count: self.count + 1,
            extract: self.extract.clone(),
            reverse: self.reverse,
        }
    }

    /// New vector without the first element equal to `value`; unchanged if
    /// absent.
    pub fn remove(&self, value: &T) -> Self
    where
        T: Clone + PartialEq,
    {
        match self.index_of(value) {
            None => self.clone(),
            Some(i) => self.remove_index(i),
        }
    }

    /// New vector without the element at position `i`.
    pub fn remove_at(&self, i: usize) -> Result<Self, Error>
    where
        T: Clone,
    {
        if i >= self.count {
            return Err(Error::OutOfRange(i));
        }
        Ok(self.remove_index(i))
    }

    fn remove_index(&self, i: usize) -> Self
    where
        T: Clone,
    {
        let root = self.root.clone().expect("index within range");
        let ctx = Ctx {
            reverse: self.reverse,
            edit: None,
        };
        let root = node::redden_root(root, None);
        let root = node::blacken(node::delete_at(root, i, &ctx), None);
        SortedVector {
            root,
            count: self.count - 1,
            extract: self.extract.clone(),
            reverse: self.reverse,
        }
    }

    /// Mutable builder sharing this vector's nodes.
    pub fn to_transient(&self) -> TransientSortedVector<T, E>
    where
        T: Clone,
    {
        TransientSortedVector::from_sorted(self)
    }

    pub(crate) fn raw_parts(&self) -> (&Link<T, E::Key>, usize, &E, bool) {
        (&self.root, self.count, &self.extract, self.reverse)
    }

    pub(crate) fn from_raw_parts(
        root: Link<T, E::Key>,
        count: usize,
        extract: E,
        reverse: bool,
    ) -> Self {
        SortedVector {
            root,
            count,
            extract,
            reverse,
        }
    }
}

impl<T: Ord + Clone> Default for SortedVector<T> {
    fn default() -> Self {
        SortedVector::new()
    }
}

impl<T, E: SortKey<T> + Clone> Clone for SortedVector<T, E> {
    fn clone(&self) -> Self {
        SortedVector {
            root: self.root.clone(),
            count: self.count,
            extract: self.extract.clone(),
            reverse: self.reverse,
        }
    }
}

impl<T: Ord + Clone> FromIterator<T> for SortedVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut transient = TransientSortedVector::from_sorted(&SortedVector::new());
        for item in iter {
            transient.insert_impl(item);
        }
        transient.finish()
    }
}

impl<T: PartialEq, E: SortKey<T>> PartialEq for SortedVector<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.iter().eq(other.iter())
    }
}

impl<T: Eq, E: SortKey<T>> Eq for SortedVector<T, E> {}

impl<T: Hash, E: SortKey<T>> Hash for SortedVector<T, E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let h = self
            .iter()
            .fold(0u64, |acc, e| combine_ordered(acc, hash_one(e)));
        state.write_u64(h);
    }
}

impl<'a, T, E: SortKey<T>> IntoIterator for &'a SortedVector<T, E> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, E::Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::check_invariants;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn tree_invariants_hold_under_churn() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let mut items: Vec<u32> = (0..500).collect();
        items.shuffle(&mut rng);

        let mut v: SortedVector<u32> = SortedVector::new();
        for (n, &item) in items.iter().enumerate() {
            v = v.insert(item);
            assert_eq!(v.len(), n + 1);
            check_invariants(v.raw_parts().0);
        }
        items.shuffle(&mut rng);
        for &item in items.iter().take(250) {
            v = v.remove(&item);
            check_invariants(v.raw_parts().0);
        }
        assert_eq!(v.len(), 250);
    }

    #[test]
    fn duplicate_keys_keep_sizes_consistent() {
        let mut v: SortedVector<u32> = SortedVector::new();
        for _ in 0..20 {
            for k in 0..5 {
                v = v.insert(k);
            }
            check_invariants(v.raw_parts().0);
        }
        assert_eq!(v.len(), 100);
        for _ in 0..20 {
            v = v.remove(&2);
            check_invariants(v.raw_parts().0);
        }
        assert_eq!(v.len(), 80);
        assert!(!v.contains(&2));
    }
}
