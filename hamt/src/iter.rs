// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::node::{Entry, Node};

enum Cursor<'a, K, V> {
    Bitmap(std::slice::Iter<'a, Entry<K, V>>),
    Array(std::slice::Iter<'a, Option<Arc<Node<K, V>>>>),
}

/// Depth-first iterator over map entries.
///
/// The order is arbitrary but deterministic for a given map value; it is
/// not preserved across updates.
pub struct Iter<'a, K, V> {
    stack: Vec<Cursor<'a, K, V>>,
    pairs: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>) -> Self {
        let mut iter = Iter {
            stack: Vec::new(),
            pairs: [].iter(),
        };
        if let Some(node) = root {
            iter.descend(node);
        }
        iter
    }

    fn descend(&mut self, node: &'a Node<K, V>) {
        match node {
            Node::Bitmap { entries, .. } => self.stack.push(Cursor::Bitmap(entries.iter())),
            Node::Array { children, .. } => self.stack.push(Cursor::Array(children.iter())),
            Node::Collision { entries, .. } => self.pairs = entries.iter(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.pairs.next() {
                return Some((k, v));
            }
            let descend: Option<&'a Node<K, V>> = match self.stack.last_mut()? {
                Cursor::Bitmap(entries) => match entries.next() {
                    Some(Entry::Pair(k, v)) => return Some((k, v)),
                    Some(Entry::Node(child)) => Some(child.as_ref()),
                    None => None,
                },
                Cursor::Array(children) => match children.next() {
                    Some(Some(child)) => Some(child.as_ref()),
                    Some(None) => continue,
                    None => None,
                },
            };
            match descend {
                Some(node) => self.descend(node),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

/// Iterator over map keys (and set elements).
pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
}

impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

/// Iterator over map values.
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }
}

impl<'a, K, V> FusedIterator for Values<'a, K, V> {}
