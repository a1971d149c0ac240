// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use pcoll_shared::EditToken;

use crate::node::{self, Ctx, Link};
use crate::sorted::{SortKey, SortedVector};
use crate::Error;

/// Mutable builder for [`SortedVector`].
///
/// Holds one live [`EditToken`]; nodes stamped with it are edited in place,
/// all other nodes are cloned on first write, so the source vector and any
/// previously frozen result stay untouched. `persistent()` drops the token,
/// after which every mutation fails with [`Error::UseAfterFreeze`].
pub struct TransientSortedVector<T, E: SortKey<T>> {
    root: Link<T, E::Key>,
    count: usize,
    extract: E,
    reverse: bool,
    edit: Option<EditToken>,
}

impl<T, E: SortKey<T>> std::fmt::Debug for TransientSortedVector<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientSortedVector")
            .field("len", &self.count)
            .field("frozen", &self.edit.is_none())
            .finish()
    }
}

impl<T, E> TransientSortedVector<T, E>
where
    T: Clone,
    E: SortKey<T> + Clone,
{
    pub(crate) fn from_sorted(source: &SortedVector<T, E>) -> Self {
        let edit = EditToken::new();
        let (root, count, extract, reverse) = source.raw_parts();
        let root = root.as_ref().map(|r| {
            let mut node = (**r).clone();
            node.edit = Some(edit.clone());
            Arc::new(node)
        });
        TransientSortedVector {
            root,
            count,
            extract: extract.clone(),
            reverse,
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
    pub fn nth(&self, i: usize) -> Option<&T> {
        self.edit.as_ref()?;
        node::nth(&self.root, i)
    }

    /// Insert `value` at its sorted position.
    pub fn insert(&mut self, value: T) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        self.insert_with(value, &edit);
        Ok(())
    }

    /// Drop the first element equal to `value`; returns whether one was
    /// present.
    pub fn remove(&mut self, value: &T) -> Result<bool, Error>
    where
        T: PartialEq,
    {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        let key = self.extract.key(value);
        let Some(i) = node::position_of(&self.root, &key, value, self.reverse, 0) else {
            return Ok(false);
        };
        self.remove_index(i, &edit);
        Ok(true)
    }

    /// Drop the element at position `i`.
    pub fn remove_at(&mut self, i: usize) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        if i >= self.count {
            return Err(Error::OutOfRange(i));
        }
        self.remove_index(i, &edit);
        Ok(())
    }

    /// Freeze into a persistent vector; the transient is dead afterwards.
    pub fn persistent(&mut self) -> Result<SortedVector<T, E>, Error> {
        self.edit.take().ok_or(Error::UseAfterFreeze)?;
        let count = self.count;
        self.count = 0;
        Ok(SortedVector::from_raw_parts(
            self.root.take(),
            count,
            self.extract.clone(),
            self.reverse,
        ))
    }

    /// Infallible insert for in-crate builders that own a live transient.
    pub(crate) fn insert_impl(&mut self, value: T) {
        let edit = self.edit.clone().expect("transient is live");
        self.insert_with(value, &edit);
    }

    pub(crate) fn finish(mut self) -> SortedVector<T, E> {
        self.edit = None;
        SortedVector::from_raw_parts(
            self.root.take(),
            self.count,
            self.extract.clone(),
            self.reverse,
        )
    }

    fn insert_with(&mut self, value: T, edit: &EditToken) {
        let key = self.extract.key(&value);
        let ctx = Ctx {
            reverse: self.reverse,
            edit: Some(edit),
        };
        let mut root = node::insert(self.root.take(), value, key, &ctx);
        root.red = false;
        self.root = Some(Arc::new(root));
        self.count += 1;
    }

    fn remove_index(&mut self, i: usize, edit: &EditToken) {
        let root = self.root.take().expect("index within range");
        let ctx = Ctx {
            reverse: self.reverse,
            edit: Some(edit),
        };
        let root = node::redden_root(root, Some(edit));
        self.root = node::blacken(node::delete_at(root, i, &ctx), Some(edit));
        self.count -= 1;
    }
}
