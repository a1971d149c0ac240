// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Left-leaning red-black tree nodes (Sedgewick) with subtree sizes.
//!
//! Rebalancing works on owned nodes: shared `Arc`s are cloned on first
//! write, exclusively owned ones are moved out and edited directly, which
//! makes the same routines serve both persistent path-copying and
//! transient in-place editing.

use std::cmp::Ordering;
use std::sync::Arc;

use pcoll_shared::{token_matches, EditToken};

pub(crate) type Link<T, K> = Option<Arc<Node<T, K>>>;

#[derive(Debug, Clone)]
pub(crate) struct Node<T, K> {
    pub(crate) value: T,
    /// Sort key extracted from `value`, cached at insertion.
    pub(crate) key: K,
    pub(crate) red: bool,
    pub(crate) size: usize,
    pub(crate) left: Link<T, K>,
    pub(crate) right: Link<T, K>,
    pub(crate) edit: Option<EditToken>,
}

impl<T, K> Node<T, K> {
    fn fix_size(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
    }
}

/// Key comparison under the tree's direction.
#[inline]
pub(crate) fn cmp_keys<K: Ord>(a: &K, b: &K, reverse: bool) -> Ordering {
    let ord = a.cmp(b);
    if reverse {
        ord.reverse()
    } else {
        ord
    }
}

/// Shared context for the rebalancing routines.
pub(crate) struct Ctx<'a> {
    pub(crate) reverse: bool,
    pub(crate) edit: Option<&'a EditToken>,
}

#[inline]
pub(crate) fn size<T, K>(link: &Link<T, K>) -> usize {
    link.as_deref().map_or(0, |n| n.size)
}

#[inline]
fn is_red<T, K>(link: &Link<T, K>) -> bool {
    link.as_deref().map_or(false, |n| n.red)
}

#[inline]
fn is_red_left<T, K>(link: &Link<T, K>) -> bool {
    link.as_deref().map_or(false, |n| is_red(&n.left))
}

/// Take an owned, writable copy of `node` stamped with `edit`.
///
/// A node already stamped with the live token `edit` moves out of its
/// `Arc` without copying; any other node is cloned and the copy stamped,
/// leaving the original untouched.
fn unshare<T: Clone, K: Clone>(node: Arc<Node<T, K>>, edit: Option<&EditToken>) -> Node<T, K> {
    if token_matches(node.edit.as_ref(), edit) {
        Arc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone())
    } else {
        let mut owned = (*node).clone();
        owned.edit = edit.cloned();
        owned
    }
}

/// Deletion pre-step: the root turns red when both its children are
/// black, so a red link is always available on the way down.
pub(crate) fn redden_root<T: Clone, K: Clone>(
    root: Arc<Node<T, K>>,
    edit: Option<&EditToken>,
) -> Arc<Node<T, K>> {
    if !is_red(&root.left) && !is_red(&root.right) {
        let mut owned = unshare(root, edit);
        owned.red = true;
        Arc::new(owned)
    } else {
        root
    }
}

/// Recolor a red root black.
pub(crate) fn blacken<T: Clone, K: Clone>(link: Link<T, K>, edit: Option<&EditToken>) -> Link<T, K> {
    match link {
        Some(node) if node.red => {
            let mut owned = unshare(node, edit);
            owned.red = false;
            Some(Arc::new(owned))
        }
        other => other,
    }
}

fn rotate_left<T: Clone, K: Clone>(mut h: Node<T, K>, ctx: &Ctx<'_>) -> Node<T, K> {
    let right = h.right.take().expect("rotate_left requires a right child");
    let mut x = unshare(right, ctx.edit);
    h.right = x.left.take();
    h.fix_size();
    x.red = h.red;
    h.red = true;
    x.left = Some(Arc::new(h));
    x.fix_size();
    x
}

fn rotate_right<T: Clone, K: Clone>(mut h: Node<T, K>, ctx: &Ctx<'_>) -> Node<T, K> {
    let left = h.left.take().expect("rotate_right requires a left child");
    let mut x = unshare(left, ctx.edit);
    h.left = x.right.take();
    h.fix_size();
    x.red = h.red;
    h.red = true;
    x.right = Some(Arc::new(h));
    x.fix_size();
    x
}

fn flip_colors<T: Clone, K: Clone>(h: &mut Node<T, K>, ctx: &Ctx<'_>) {
    h.red = !h.red;
    for link in [&mut h.left, &mut h.right] {
        if let Some(child) = link.take() {
            let mut owned = unshare(child, ctx.edit);
            owned.red = !owned.red;
            *link = Some(Arc::new(owned));
        }
    }
}

fn balance<T: Clone, K: Clone>(mut h: Node<T, K>, ctx: &Ctx<'_>) -> Node<T, K> {
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h, ctx);
    }
    if is_red(&h.left) && is_red_left(&h.left) {
        h = rotate_right(h, ctx);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colors(&mut h, ctx);
    }
    h.fix_size();
    h
}

fn move_red_left<T: Clone, K: Clone>(mut h: Node<T, K>, ctx: &Ctx<'_>) -> Node<T, K> {
    flip_colors(&mut h, ctx);
    if is_red_left(&h.right) {
        let right = h.right.take().expect("checked above");
        h.right = Some(Arc::new(rotate_right(unshare(right, ctx.edit), ctx)));
        h = rotate_left(h, ctx);
        flip_colors(&mut h, ctx);
    }
    h
}

fn move_red_right<T: Clone, K: Clone>(mut h: Node<T, K>, ctx: &Ctx<'_>) -> Node<T, K> {
    flip_colors(&mut h, ctx);
    if is_red_left(&h.left) {
        h = rotate_right(h, ctx);
        flip_colors(&mut h, ctx);
    }
    h
}

/// Insert `value` under its cached `key`; duplicates descend right.
pub(crate) fn insert<T: Clone, K: Ord + Clone>(
    link: Link<T, K>,
    value: T,
    key: K,
    ctx: &Ctx<'_>,
) -> Node<T, K> {
    let Some(node) = link else {
        return Node {
            value,
            key,
            red: true,
            size: 1,
            left: None,
            right: None,
            edit: ctx.edit.cloned(),
        };
    };
    let mut h = unshare(node, ctx.edit);
    if cmp_keys(&key, &h.key, ctx.reverse) == Ordering::Less {
        h.left = Some(Arc::new(insert(h.left.take(), value, key, ctx)));
    } else {
        h.right = Some(Arc::new(insert(h.right.take(), value, key, ctx)));
    }
    balance(h, ctx)
}

/// Detach the in-order minimum of the subtree.
fn delete_min<T: Clone, K: Clone>(
    node: Arc<Node<T, K>>,
    ctx: &Ctx<'_>,
) -> (Link<T, K>, (K, T)) {
    let mut h = unshare(node, ctx.edit);
    if h.left.is_none() {
        debug_assert!(h.right.is_none());
        return (None, (h.key, h.value));
    }
    if !is_red(&h.left) && !is_red_left(&h.left) {
        h = move_red_left(h, ctx);
    }
    let (rest, min) = delete_min(h.left.take().expect("non-minimal node has a left child"), ctx);
    h.left = rest;
    (Some(Arc::new(balance(h, ctx))), min)
}

/// Remove the element at in-order position `i`. The caller guarantees
/// `i < size`.
///
/// Rotations preserve in-order positions, so the position is re-anchored
/// against the current left-subtree size after every transformation.
pub(crate) fn delete_at<T: Clone, K: Clone>(
    node: Arc<Node<T, K>>,
    i: usize,
    ctx: &Ctx<'_>,
) -> Link<T, K> {
    let mut h = unshare(node, ctx.edit);
    if i < size(&h.left) {
        if !is_red(&h.left) && !is_red_left(&h.left) {
            h = move_red_left(h, ctx);
        }
        let left = h.left.take().expect("target is below");
        h.left = delete_at(left, i, ctx);
    } else {
        if is_red(&h.left) {
            h = rotate_right(h, ctx);
        }
        if i == size(&h.left) && h.right.is_none() {
            debug_assert!(h.left.is_none());
            return None;
        }
        if !is_red(&h.right) && !is_red_left(&h.right) {
            h = move_red_right(h, ctx);
        }
        if i == size(&h.left) {
            // Replace this node's payload with its in-order successor.
            let right = h.right.take().expect("successor exists");
            let (rest, (key, value)) = delete_min(right, ctx);
            h.key = key;
            h.value = value;
            h.right = rest;
        } else {
            let left_size = size(&h.left);
            let right = h.right.take().expect("target is above");
            h.right = delete_at(right, i - left_size - 1, ctx);
        }
    }
    Some(Arc::new(balance(h, ctx)))
}

/// Number of elements whose key is strictly less than `key` under the
/// tree's direction.
pub(crate) fn rank_below<T, K: Ord>(link: &Link<T, K>, key: &K, reverse: bool) -> usize {
    let mut acc = 0;
    let mut cur = link;
    while let Some(node) = cur.as_deref() {
        if cmp_keys(&node.key, key, reverse) == Ordering::Less {
            acc += size(&node.left) + 1;
            cur = &node.right;
        } else {
            cur = &node.left;
        }
    }
    acc
}

/// In-order position of the leftmost element equal to `(key, value)`.
///
/// Equal keys can sit in either subtree of an equal-keyed node after
/// rotations, so both sides are searched on a key tie.
pub(crate) fn position_of<T: PartialEq, K: Ord>(
    link: &Link<T, K>,
    key: &K,
    value: &T,
    reverse: bool,
    base: usize,
) -> Option<usize> {
    let node = link.as_deref()?;
    match cmp_keys(key, &node.key, reverse) {
        Ordering::Less => position_of(&node.left, key, value, reverse, base),
        Ordering::Greater => {
            position_of(&node.right, key, value, reverse, base + size(&node.left) + 1)
        }
        Ordering::Equal => {
            if let Some(i) = position_of(&node.left, key, value, reverse, base) {
                return Some(i);
            }
            if node.value == *value {
                return Some(base + size(&node.left));
            }
            position_of(&node.right, key, value, reverse, base + size(&node.left) + 1)
        }
    }
}

/// Element at in-order position `i`, if any.
pub(crate) fn nth<'a, T, K>(link: &'a Link<T, K>, mut i: usize) -> Option<&'a T> {
    let mut cur = link;
    loop {
        let node = cur.as_deref()?;
        let left_size = size(&node.left);
        match i.cmp(&left_size) {
            Ordering::Less => cur = &node.left,
            Ordering::Equal => return Some(&node.value),
            Ordering::Greater => {
                i -= left_size + 1;
                cur = &node.right;
            }
        }
    }
}

pub(crate) fn leftmost<'a, T, K>(link: &'a Link<T, K>) -> Option<&'a T> {
    let mut node = link.as_deref()?;
    while let Some(left) = node.left.as_deref() {
        node = left;
    }
    Some(&node.value)
}

pub(crate) fn rightmost<'a, T, K>(link: &'a Link<T, K>) -> Option<&'a T> {
    let mut node = link.as_deref()?;
    while let Some(right) = node.right.as_deref() {
        node = right;
    }
    Some(&node.value)
}

#[cfg(test)]
pub(crate) fn check_invariants<T, K: Ord>(link: &Link<T, K>) -> (usize, usize) {
    match link.as_deref() {
        None => (1, 0),
        Some(node) => {
            assert!(!is_red(&node.right), "red right child");
            if node.red {
                assert!(!is_red(&node.left), "red node with a red left child");
            }
            if let Some(left) = node.left.as_deref() {
                assert!(left.key <= node.key, "left subtree out of order");
            }
            if let Some(right) = node.right.as_deref() {
                assert!(node.key <= right.key, "right subtree out of order");
            }
            let (left_black, left_size) = check_invariants(&node.left);
            let (right_black, right_size) = check_invariants(&node.right);
            assert_eq!(left_black, right_black, "unequal black depth");
            assert_eq!(node.size, 1 + left_size + right_size, "stale subtree size");
            (left_black + usize::from(!node.red), node.size)
        }
    }
}
