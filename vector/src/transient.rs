// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cmp::Ordering;
use std::sync::Arc;

use pcoll_shared::EditToken;

use crate::node::{self, Node};
use crate::vector::Vector;
use crate::{tail_offset, Error, BITS, MASK, WIDTH};

/// Mutable builder for [`Vector`].
///
/// Holds one live [`EditToken`]; nodes stamped with it are edited in place,
/// all other nodes are cloned on first write, so the source vector and any
/// previously frozen result stay untouched. `persistent()` drops the token,
/// after which every mutation fails with [`Error::UseAfterFreeze`].
#[derive(Debug)]
pub struct TransientVector<T> {
    count: usize,
    shift: usize,
    root: Arc<Node<T>>,
    tail: Vec<T>,
    edit: Option<EditToken>,
}

impl<T: Clone> TransientVector<T> {
    /// Empty transient, ready to absorb pushes.
    pub fn new() -> Self {
        let edit = EditToken::new();
        TransientVector {
            count: 0,
            shift: BITS,
            root: Node::empty_branch(Some(&edit)),
            tail: Vec::with_capacity(WIDTH),
            edit: Some(edit),
        }
    }

    pub(crate) fn from_vector(vector: &Vector<T>) -> Self {
        let edit = EditToken::new();
        let (count, shift, root, tail) = vector.raw_parts();
        let mut root_node = (**root).clone();
        root_node.set_edit(Some(edit.clone()));
        let mut tail = (**tail).clone();
        tail.reserve(WIDTH - tail.len());
        TransientVector {
            count,
            shift,
            root: Arc::new(root_node),
            tail,
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
    pub fn get(&self, i: usize) -> Option<&T> {
        self.edit.as_ref()?;
        if i >= self.count {
            return None;
        }
        let off = tail_offset(self.count);
        Some(if i >= off {
            &self.tail[i - off]
        } else {
            &node::leaf_for(&self.root, self.shift, i)[i & MASK]
        })
    }

    /// Append one element.
    pub fn push(&mut self, value: T) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        self.push_with(value, &edit);
        Ok(())
    }

    /// Replace the element at `i`; `i == len()` appends.
    pub fn set(&mut self, i: usize, value: T) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        match i.cmp(&self.count) {
            Ordering::Greater => Err(Error::OutOfRange(i)),
            Ordering::Equal => {
                self.push_with(value, &edit);
                Ok(())
            }
            Ordering::Less => {
                let off = tail_offset(self.count);
                if i >= off {
                    self.tail[i - off] = value;
                } else {
                    node::set_in_trie(&mut self.root, self.shift, i, value, Some(&edit));
                }
                Ok(())
            }
        }
    }

    /// Remove the last element.
    pub fn pop(&mut self) -> Result<(), Error> {
        let edit = self.edit.clone().ok_or(Error::UseAfterFreeze)?;
        match self.count {
            0 => Err(Error::Empty),
            1 => {
                self.count = 0;
                self.shift = BITS;
                self.root = Node::empty_branch(Some(&edit));
                self.tail.clear();
                Ok(())
            }
            _ => {
                if !self.tail.is_empty() {
                    self.tail.pop();
                } else {
                    let base = self.count - WIDTH;
                    let mut tail = node::leaf_for(&self.root, self.shift, base).to_vec();
                    tail.pop();
                    if !node::pop_leaf(&mut self.root, self.shift, base, Some(&edit)) {
                        self.root = Node::empty_branch(Some(&edit));
                    }
                    node::collapse_root(&mut self.root, &mut self.shift);
                    tail.reserve(WIDTH - tail.len());
                    self.tail = tail;
                }
                self.count -= 1;
                Ok(())
            }
        }
    }

    /// Freeze into a persistent vector; the transient is dead afterwards.
    pub fn persistent(&mut self) -> Result<Vector<T>, Error> {
        self.edit.take().ok_or(Error::UseAfterFreeze)?;
        let count = self.count;
        self.count = 0;
        Ok(Vector::from_raw_parts(
            count,
            self.shift,
            self.root.clone(),
            std::mem::take(&mut self.tail),
        ))
    }

    /// Infallible push for in-crate builders that own a live transient.
    pub(crate) fn push_impl(&mut self, value: T) {
        let edit = self.edit.clone().expect("transient is live");
        self.push_with(value, &edit);
    }

    pub(crate) fn finish(mut self) -> Vector<T> {
        self.edit = None;
        Vector::from_raw_parts(
            self.count,
            self.shift,
            self.root.clone(),
            std::mem::take(&mut self.tail),
        )
    }

    fn push_with(&mut self, value: T, edit: &EditToken) {
        self.tail.push(value);
        self.count += 1;
        if self.tail.len() < WIDTH {
            return;
        }
        debug_assert_eq!(self.tail.len(), WIDTH);
        let elems = std::mem::replace(&mut self.tail, Vec::with_capacity(WIDTH));
        let leaf = Node::leaf(elems, Some(edit));
        let base = self.count - WIDTH;
        node::push_leaf(&mut self.root, self.shift, base, leaf, Some(edit));
        if (self.count >> BITS) == (1usize << self.shift) {
            let mut children = node::empty_slots();
            children[0] = Some(self.root.clone());
            self.root = Arc::new(Node::Branch {
                children,
                edit: Some(edit.clone()),
            });
            self.shift += BITS;
        }
    }
}

impl<T: Clone> Default for TransientVector<T> {
    fn default() -> Self {
        TransientVector::new()
    }
}
