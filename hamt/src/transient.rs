// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use pcoll_shared::{DefaultHashBuilder, EditToken};

use crate::map::HashMap;
use crate::node::{self, Node, Removal};
use crate::set::HashSet;
use crate::Error;

/// Mutable builder for [`HashMap`].
///
/// Holds one live [`EditToken`]; nodes stamped with it are edited in place,
/// all other nodes are cloned on first write, so the source map and any
/// previously frozen result stay untouched. `persistent()` drops the token,
/// after which every mutation fails with [`Error::UseAfterFreeze`].
#[derive(Debug)]
pub struct TransientMap<K, V, S = DefaultHashBuilder> {
    root: Option<Arc<Node<K, V>>>,
    count: usize,
    hasher: S,
    edit: Option<EditToken>,
}

impl<K, V> TransientMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Empty transient, ready to absorb inserts.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> TransientMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    pub fn with_hasher(hasher: S) -> Self {
        TransientMap {
            root: None,
            count: 0,
            hasher,
            edit: Some(EditToken::new()),
        }
    }

    pub(crate) fn from_map(map: &HashMap<K, V, S>) -> Self {
        let edit = EditToken::new();
        let (root, count, hasher) = map.raw_parts();
        let root = root.map(|r| {
            let mut node = (**r).clone();
            node.set_edit(Some(edit.clone()));
            Arc::new(node)
        });
        TransientMap {
            root,
            count,
            hasher: hasher.clone(),
            edit: Some(edit),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Read access while the transient is live; `None` after freezing.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.edit.as_ref()?;
        let root = self.root.as_deref()?;
        node::find(root, 0, self.hasher.hash_one(key), key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Bind `key` to `value`, replacing any existing binding.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        self.insert_with(key, value, &edit);
        Ok(())
    }

    /// Drop the binding for `key`; returns whether one was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<bool, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        Ok(self.remove_with(key, &edit))
    }

    /// Freeze into a persistent map; the transient is dead afterwards.
    pub fn persistent(&mut self) -> Result<HashMap<K, V, S>, Error> {
        self.edit.take().ok_or(Error::UseAfterFreeze)?;
        let count = self.count;
        self.count = 0;
        Ok(HashMap::from_raw_parts(
            self.root.take(),
            count,
            self.hasher.clone(),
        ))
    }

    /// Infallible insert for in-crate builders that own a live transient.
    pub(crate) fn insert_impl(&mut self, key: K, value: V) {
        let edit = self.edit.clone().expect("transient is live");
        self.insert_with(key, value, &edit);
    }

    pub(crate) fn finish(mut self) -> HashMap<K, V, S> {
        self.edit = None;
        HashMap::from_raw_parts(self.root.take(), self.count, self.hasher.clone())
    }

    fn insert_with(&mut self, key: K, value: V, edit: &EditToken) {
        let hash = self.hasher.hash_one(&key);
        let mut root = match self.root.take() {
            Some(root) => root,
            None => Arc::new(Node::empty_bitmap(Some(edit))),
        };
        let mut added = false;
        node::assoc(
            &mut root,
            0,
            hash,
            key,
            value,
            &self.hasher,
            &mut added,
            Some(edit),
        );
        self.root = Some(root);
        self.count += usize::from(added);
    }

    fn remove_with<Q>(&mut self, key: &Q, edit: &EditToken) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(mut root) = self.root.take() else {
            return false;
        };
        let hash = self.hasher.hash_one(key);
        if node::find(&root, 0, hash, key).is_none() {
            self.root = Some(root);
            return false;
        }
        match node::dissoc(&mut root, 0, hash, key, Some(edit)) {
            Removal::Gone => self.root = None,
            Removal::Inlined(k, v) => {
                self.root = Some(node::singleton(0, hash, k, v, Some(edit)));
            }
            Removal::Done => self.root = Some(root),
            Removal::NotFound => unreachable!("presence checked above"),
        }
        self.count -= 1;
        true
    }
}

impl<K, V> Default for TransientMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        TransientMap::new()
    }
}

/// Mutable builder for [`HashSet`].
#[derive(Debug)]
pub struct TransientSet<T, S = DefaultHashBuilder> {
    map: TransientMap<T, (), S>,
}

impl<T> TransientSet<T>
where
    T: Clone + Eq + Hash,
{
    /// Empty transient, ready to absorb inserts.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<T, S> TransientSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    pub fn with_hasher(hasher: S) -> Self {
        TransientSet {
            map: TransientMap::with_hasher(hasher),
        }
    }

    pub(crate) fn from_transient_map(map: TransientMap<T, (), S>) -> Self {
        TransientSet { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(value)
    }

    pub fn insert(&mut self, value: T) -> Result<(), Error> {
        self.map.insert(value, ())
    }

    /// Drop `value`; returns whether it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<bool, Error>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(value)
    }

    /// Freeze into a persistent set; the transient is dead afterwards.
    pub fn persistent(&mut self) -> Result<HashSet<T, S>, Error> {
        Ok(HashSet::from_map(self.map.persistent()?))
    }

    pub(crate) fn insert_impl(&mut self, value: T) {
        self.map.insert_impl(value, ());
    }

    pub(crate) fn finish(self) -> HashSet<T, S> {
        HashSet::from_map(self.map.finish())
    }
}

impl<T> Default for TransientSet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        TransientSet::new()
    }
}
