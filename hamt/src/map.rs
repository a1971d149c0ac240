// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

use itertools::Itertools;
use once_cell::sync::OnceCell;
use pcoll_shared::DefaultHashBuilder;

use crate::iter::{Iter, Keys, Values};
use crate::node::{self, Node, Removal};
use crate::transient::TransientMap;
use crate::Error;

/// Persistent hash map.
///
/// An absent root is the canonical empty map; every operation that drains
/// the map returns to that form. Updates return a new map sharing all
/// untouched nodes with the input.
///
/// ```
/// use pcoll_hamt::HashMap;
///
/// let a: HashMap<u32, &str> = HashMap::new();
/// let b = a.set(1, "one");
/// let c = b.set(2, "two");
/// assert!(a.is_empty());
/// assert_eq!(b.len(), 1);
/// assert_eq!(c.get(&2), Some(&"two"));
/// ```
#[derive(Debug)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    root: Option<Arc<Node<K, V>>>,
    count: usize,
    hasher: S,
    hash: OnceCell<u64>,
}

impl<K, V> HashMap<K, V> {
    /// The canonical empty map.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Empty map using `hasher` to place keys.
    pub fn with_hasher(hasher: S) -> Self {
        HashMap {
            root: None,
            count: 0,
            hasher,
            hash: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Entries in an arbitrary but deterministic order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref())
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn from_raw_parts(root: Option<Arc<Node<K, V>>>, count: usize, hasher: S) -> Self {
        HashMap {
            root,
            count,
            hasher,
            hash: OnceCell::new(),
        }
    }

    pub(crate) fn raw_parts(&self) -> (Option<&Arc<Node<K, V>>>, usize, &S) {
        (self.root.as_ref(), self.count, &self.hasher)
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_deref()?;
        node::find(root, 0, self.hasher.hash_one(key), key)
    }

    /// Like [`get`](Self::get) but an absent key is an error.
    pub fn fetch<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::KeyMissing)
    }

    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// New map with `key` bound to `value`. Binding a key to its current
    /// value returns the map unchanged.
    pub fn set(&self, key: K, value: V) -> Self
    where
        V: PartialEq,
    {
        if let Some(existing) = self.get(&key) {
            if *existing == value {
                return self.clone();
            }
        }
        let hash = self.hasher.hash_one(&key);
        let mut root = match &self.root {
            Some(root) => root.clone(),
            None => Arc::new(Node::empty_bitmap(None)),
        };
        let mut added = false;
        node::assoc(&mut root, 0, hash, key, value, &self.hasher, &mut added, None);
        HashMap {
            root: Some(root),
            count: self.count + usize::from(added),
            hasher: self.hasher.clone(),
            hash: OnceCell::new(),
        }
    }

    /// New map without `key`; unchanged if the key is absent.
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let hash = self.hasher.hash_one(key);
        if node::find(root, 0, hash, key).is_none() {
            return self.clone();
        }
        let mut root = root.clone();
        let root = match node::dissoc(&mut root, 0, hash, key, None) {
            Removal::Gone => None,
            Removal::Inlined(k, v) => Some(node::singleton(0, hash, k, v, None)),
            Removal::Done => Some(root),
            Removal::NotFound => unreachable!("presence checked above"),
        };
        HashMap {
            root,
            count: self.count - 1,
            hasher: self.hasher.clone(),
            hash: OnceCell::new(),
        }
    }

    /// New map containing every entry of `other` on top of `self`; on a
    /// shared key the entry from `other` wins.
    pub fn merge<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut transient = self.to_transient();
        for (key, value) in other {
            transient.insert_impl(key, value);
        }
        transient.finish()
    }

    /// Mutable builder sharing this map's nodes.
    pub fn to_transient(&self) -> TransientMap<K, V, S> {
        TransientMap::from_map(self)
    }

    /// Run `f` over every entry, stopping at the first error, which is
    /// returned unchanged.
    pub fn for_each<F>(&self, mut f: F) -> anyhow::Result<()>
    where
        F: FnMut(&K, &V) -> anyhow::Result<()>,
    {
        for (k, v) in self.iter() {
            f(k, v)?;
        }
        Ok(())
    }
}

impl<K, S> HashMap<K, K, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    /// Build a map from a flattened `k1, v1, k2, v2, …` argument list.
    pub fn from_flat<I>(items: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = K>,
    {
        let items: Vec<K> = items.into_iter().collect();
        if items.len() % 2 != 0 {
            return Err(Error::OddArity(items.len()));
        }
        let mut transient = TransientMap::with_hasher(S::default());
        for (key, value) in items.into_iter().tuples() {
            transient.insert_impl(key, value);
        }
        Ok(transient.finish())
    }
}

impl<K, V> Default for HashMap<K, V> {
    fn default() -> Self {
        HashMap::new()
    }
}

impl<K, V, S: Clone> Clone for HashMap<K, V, S> {
    fn clone(&self) -> Self {
        HashMap {
            root: self.root.clone(),
            count: self.count,
            hasher: self.hasher.clone(),
            hash: self.hash.clone(),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = TransientMap::with_hasher(S::default());
        for (key, value) in iter {
            transient.insert_impl(key, value);
        }
        transient.finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
    S: BuildHasher + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| v == w))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq,
    S: BuildHasher + Clone,
{
}

impl<K, V, S> Hash for HashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone + Hash,
    S: BuildHasher + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: the sum of per-entry hashes.
        let h = *self.hash.get_or_init(|| {
            self.iter().fold(0u64, |acc, (k, v)| {
                acc.wrapping_add(self.hasher.hash_one(k) ^ self.hasher.hash_one(v))
            })
        });
        state.write_u64(h);
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S, Q> std::ops::Index<&Q> for HashMap<K, V, S>
where
    K: Borrow<Q> + Clone + Eq + Hash,
    Q: Hash + Eq + ?Sized,
    V: Clone,
    S: BuildHasher + Clone,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasherDefault;

    /// Hashes a `u64` key to itself, making slot placement transparent.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }

        fn write_u64(&mut self, i: u64) {
            self.0 = i;
        }
    }

    /// Hashes everything to the same value, forcing full collisions.
    #[derive(Default)]
    struct CollidingHasher;

    impl Hasher for CollidingHasher {
        fn finish(&self) -> u64 {
            42
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    type IdentityMap = HashMap<u64, u64, BuildHasherDefault<IdentityHasher>>;
    type CollidingMap = HashMap<&'static str, u64, BuildHasherDefault<CollidingHasher>>;

    #[test]
    fn full_bitmap_promotes_to_array() {
        // 17 keys with pairwise distinct first-level slots.
        let mut map = IdentityMap::with_hasher(Default::default());
        for k in 0..16u64 {
            map = map.set(k, k);
            assert!(matches!(
                map.raw_parts().0.map(|n| &**n),
                Some(Node::Bitmap { .. })
            ));
        }
        map = map.set(16, 16);
        assert!(matches!(
            map.raw_parts().0.map(|n| &**n),
            Some(Node::Array { count: 17, .. })
        ));
        for k in 0..17u64 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }

    #[test]
    fn drained_array_demotes_to_bitmap() {
        let mut map = IdentityMap::with_hasher(Default::default());
        for k in 0..17u64 {
            map = map.set(k, k);
        }
        for k in 0..8u64 {
            map = map.remove(&k);
            assert!(matches!(
                map.raw_parts().0.map(|n| &**n),
                Some(Node::Array { .. })
            ));
        }
        // The ninth removal lands on the low-water mark.
        map = map.remove(&8);
        assert!(matches!(
            map.raw_parts().0.map(|n| &**n),
            Some(Node::Bitmap { .. })
        ));
        assert_eq!(map.len(), 8);
        for k in 9..17u64 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }

    #[test]
    fn colliding_keys_share_a_collision_node() {
        let map = CollidingMap::with_hasher(Default::default())
            .set("a", 1)
            .set("b", 2);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));

        fn has_collision_node<K, V>(node: &Node<K, V>) -> bool {
            match node {
                Node::Collision { .. } => true,
                Node::Bitmap { entries, .. } => entries.iter().any(|e| match e {
                    crate::node::Entry::Node(n) => has_collision_node(n),
                    crate::node::Entry::Pair(..) => false,
                }),
                Node::Array { children, .. } => children
                    .iter()
                    .flatten()
                    .any(|n| has_collision_node(n)),
            }
        }

        let root = map.raw_parts().0.expect("non-empty");
        assert!(has_collision_node(root));

        // Removing one entry collapses the collision node to a plain pair.
        let map = map.remove("a");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("b"), Some(&2));
        let root = map.raw_parts().0.expect("non-empty");
        assert!(!has_collision_node(root));

        let map = map.remove("b");
        assert!(map.is_empty());
        assert!(map.raw_parts().0.is_none());
    }

    #[test]
    fn setting_an_equal_value_returns_the_same_root() {
        let map = HashMap::new().set("k", 7);
        let again = map.set("k", 7);
        let (a, ..) = map.raw_parts();
        let (b, ..) = again.raw_parts();
        assert!(Arc::ptr_eq(a.expect("root"), b.expect("root")));
    }
}
