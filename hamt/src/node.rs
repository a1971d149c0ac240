// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use pcoll_shared::{token_matches, EditToken};

use crate::{BITS, MASK, WIDTH};

/// A bitmap node promotes to the array form when a slot beyond this many
/// would be occupied.
pub(crate) const MAX_BITMAP_SLOTS: usize = WIDTH / 2;
/// An array node demotes back to the bitmap form at this many children.
pub(crate) const MIN_ARRAY_CHILDREN: usize = WIDTH / 4;

/// One occupied slot of a bitmap node: either a stored entry or a link to
/// the next level.
#[derive(Debug, Clone)]
pub(crate) enum Entry<K, V> {
    Pair(K, V),
    Node(Arc<Node<K, V>>),
}

/// HAMT node.
///
/// The `edit` field ties a node to the transient that created it; a node
/// may be written in place only while its token matches the live token of
/// the transient performing the write.
#[derive(Debug, Clone)]
pub(crate) enum Node<K, V> {
    /// Compressed interior node: one packed slot per set bit.
    Bitmap {
        bitmap: u32,
        entries: Vec<Entry<K, V>>,
        edit: Option<EditToken>,
    },
    /// Flat interior node for densely occupied levels.
    Array {
        children: Vec<Option<Arc<Node<K, V>>>>,
        count: u8,
        edit: Option<EditToken>,
    },
    /// All entries whose full 64-bit hashes are equal.
    Collision {
        hash: u64,
        entries: Vec<(K, V)>,
        edit: Option<EditToken>,
    },
}

/// Result of a removal, seen by the parent level.
pub(crate) enum Removal<K, V> {
    /// The key was not present; nothing changed.
    NotFound,
    /// Removed; the child slot is still occupied.
    Done,
    /// Removed and the child holds nothing; the parent clears the slot.
    Gone,
    /// Removed and a single entry remains; the parent stores it inline.
    Inlined(K, V),
}

#[inline]
fn slot_of(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & MASK) as u32
}

#[inline]
fn bit_of(hash: u64, shift: u32) -> u32 {
    1u32 << slot_of(hash, shift)
}

/// Packed position of `bit` within the slots present in `bitmap`.
#[inline]
fn bit_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & bit.wrapping_sub(1)).count_ones() as usize
}

impl<K, V> Node<K, V> {
    pub(crate) fn empty_bitmap(edit: Option<&EditToken>) -> Self {
        Node::Bitmap {
            bitmap: 0,
            entries: Vec::new(),
            edit: edit.cloned(),
        }
    }

    pub(crate) fn set_edit(&mut self, edit: Option<EditToken>) {
        match self {
            Node::Bitmap { edit: e, .. }
            | Node::Array { edit: e, .. }
            | Node::Collision { edit: e, .. } => *e = edit,
        }
    }

    fn edit_ref(&self) -> Option<&EditToken> {
        match self {
            Node::Bitmap { edit, .. }
            | Node::Array { edit, .. }
            | Node::Collision { edit, .. } => edit.as_ref(),
        }
    }
}

/// A fresh one-entry bitmap node addressed at `shift`.
pub(crate) fn singleton<K, V>(
    shift: u32,
    hash: u64,
    key: K,
    value: V,
    edit: Option<&EditToken>,
) -> Arc<Node<K, V>> {
    Arc::new(Node::Bitmap {
        bitmap: bit_of(hash, shift),
        entries: vec![Entry::Pair(key, value)],
        edit: edit.cloned(),
    })
}

/// Obtain a writable reference to the node in `slot`.
///
/// A node already stamped with the live token `edit` is edited in place;
/// any other node is cloned first and the copy stamped, so shared structure
/// is never written through.
fn make_editable<'s, K: Clone, V: Clone>(
    slot: &'s mut Arc<Node<K, V>>,
    edit: Option<&EditToken>,
) -> &'s mut Node<K, V> {
    if !token_matches(slot.edit_ref(), edit) {
        let mut copy = (**slot).clone();
        copy.set_edit(edit.cloned());
        *slot = Arc::new(copy);
    }
    Arc::make_mut(slot)
}

/// Node holding both entries once their hashes first diverge; a collision
/// node when they never do.
fn join_entries<K, V>(
    shift: u32,
    h1: u64,
    k1: K,
    v1: V,
    h2: u64,
    k2: K,
    v2: V,
    edit: Option<&EditToken>,
) -> Arc<Node<K, V>> {
    if h1 == h2 {
        return Arc::new(Node::Collision {
            hash: h1,
            entries: vec![(k1, v1), (k2, v2)],
            edit: edit.cloned(),
        });
    }
    let s1 = slot_of(h1, shift);
    let s2 = slot_of(h2, shift);
    if s1 == s2 {
        let child = join_entries(shift + BITS, h1, k1, v1, h2, k2, v2, edit);
        Arc::new(Node::Bitmap {
            bitmap: 1 << s1,
            entries: vec![Entry::Node(child)],
            edit: edit.cloned(),
        })
    } else {
        let entries = if s1 < s2 {
            vec![Entry::Pair(k1, v1), Entry::Pair(k2, v2)]
        } else {
            vec![Entry::Pair(k2, v2), Entry::Pair(k1, v1)]
        };
        Arc::new(Node::Bitmap {
            bitmap: (1 << s1) | (1 << s2),
            entries,
            edit: edit.cloned(),
        })
    }
}

/// Look up `key` below `node`.
pub(crate) fn find<'a, K, V, Q>(
    node: &'a Node<K, V>,
    shift: u32,
    hash: u64,
    key: &Q,
) -> Option<&'a V>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    match node {
        Node::Bitmap {
            bitmap, entries, ..
        } => {
            let b = bit_of(hash, shift);
            if bitmap & b == 0 {
                return None;
            }
            match &entries[bit_index(*bitmap, b)] {
                Entry::Pair(k, v) => (k.borrow() == key).then_some(v),
                Entry::Node(child) => find(child, shift + BITS, hash, key),
            }
        }
        Node::Array { children, .. } => children[slot_of(hash, shift) as usize]
            .as_deref()
            .and_then(|child| find(child, shift + BITS, hash, key)),
        Node::Collision {
            hash: node_hash,
            entries,
            ..
        } => {
            if *node_hash != hash {
                return None;
            }
            entries
                .iter()
                .find(|(k, _)| k.borrow() == key)
                .map(|(_, v)| v)
        }
    }
}

/// Insert or replace `key`, setting `added` when the map grew.
pub(crate) fn assoc<K, V, S>(
    slot: &mut Arc<Node<K, V>>,
    shift: u32,
    hash: u64,
    key: K,
    value: V,
    hasher: &S,
    added: &mut bool,
    edit: Option<&EditToken>,
) where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    loop {
        // A full bitmap node promotes to the array form rather than take a
        // seventeenth slot.
        let promote = matches!(
            &**slot,
            Node::Bitmap { bitmap, .. }
                if bitmap & bit_of(hash, shift) == 0
                    && bitmap.count_ones() as usize >= MAX_BITMAP_SLOTS
        );
        if promote {
            let (old_bitmap, old_entries) = match &**slot {
                Node::Bitmap {
                    bitmap, entries, ..
                } => (*bitmap, entries.clone()),
                _ => unreachable!("checked above"),
            };
            let mut children: Vec<Option<Arc<Node<K, V>>>> = (0..WIDTH).map(|_| None).collect();
            let mut drained = old_entries.into_iter();
            for pos in 0..WIDTH as u32 {
                if old_bitmap & (1 << pos) == 0 {
                    continue;
                }
                let child = match drained.next().expect("one entry per set bit") {
                    Entry::Node(node) => node,
                    Entry::Pair(k, v) => {
                        let kh = hasher.hash_one(&k);
                        singleton(shift + BITS, kh, k, v, edit)
                    }
                };
                children[pos as usize] = Some(child);
            }
            children[slot_of(hash, shift) as usize] =
                Some(singleton(shift + BITS, hash, key, value, edit));
            *slot = Arc::new(Node::Array {
                children,
                count: old_bitmap.count_ones() as u8 + 1,
                edit: edit.cloned(),
            });
            *added = true;
            return;
        }

        // A collision node for some other hash gets pushed one level down
        // behind a bitmap node, then the insert is retried against it.
        let wrapped_hash = match &**slot {
            Node::Collision {
                hash: node_hash, ..
            } if *node_hash != hash => Some(*node_hash),
            _ => None,
        };
        if let Some(node_hash) = wrapped_hash {
            let inner = slot.clone();
            *slot = Arc::new(Node::Bitmap {
                bitmap: bit_of(node_hash, shift),
                entries: vec![Entry::Node(inner)],
                edit: edit.cloned(),
            });
            continue;
        }

        let node = make_editable(slot, edit);
        match node {
            Node::Bitmap {
                bitmap, entries, ..
            } => {
                let b = bit_of(hash, shift);
                let i = bit_index(*bitmap, b);
                if *bitmap & b == 0 {
                    entries.insert(i, Entry::Pair(key, value));
                    *bitmap |= b;
                    *added = true;
                    return;
                }
                if let Entry::Node(child) = &mut entries[i] {
                    assoc(child, shift + BITS, hash, key, value, hasher, added, edit);
                    return;
                }
                let same_key = matches!(&entries[i], Entry::Pair(k, _) if *k == key);
                if same_key {
                    if let Entry::Pair(_, v) = &mut entries[i] {
                        *v = value;
                    }
                } else {
                    let Entry::Pair(k0, v0) = entries.remove(i) else {
                        unreachable!("checked above");
                    };
                    let kh = hasher.hash_one(&k0);
                    let child = join_entries(shift + BITS, kh, k0, v0, hash, key, value, edit);
                    entries.insert(i, Entry::Node(child));
                    *added = true;
                }
                return;
            }
            Node::Array {
                children, count, ..
            } => {
                let pos = slot_of(hash, shift) as usize;
                match &mut children[pos] {
                    Some(child) => {
                        assoc(child, shift + BITS, hash, key, value, hasher, added, edit);
                    }
                    vacant => {
                        *vacant = Some(singleton(shift + BITS, hash, key, value, edit));
                        *count += 1;
                        *added = true;
                    }
                }
                return;
            }
            Node::Collision { entries, .. } => {
                if let Some(pair) = entries.iter_mut().find(|(k, _)| *k == key) {
                    pair.1 = value;
                } else {
                    entries.push((key, value));
                    *added = true;
                }
                return;
            }
        }
    }
}

/// Remove `key` below `slot`.
pub(crate) fn dissoc<K, V, Q>(
    slot: &mut Arc<Node<K, V>>,
    shift: u32,
    hash: u64,
    key: &Q,
    edit: Option<&EditToken>,
) -> Removal<K, V>
where
    K: Borrow<Q> + Clone + Eq + Hash,
    Q: Eq + ?Sized,
    V: Clone,
{
    let result = {
        let node = make_editable(slot, edit);
        match node {
            Node::Bitmap {
                bitmap, entries, ..
            } => {
                let b = bit_of(hash, shift);
                if *bitmap & b == 0 {
                    return Removal::NotFound;
                }
                let i = bit_index(*bitmap, b);
                if let Entry::Node(child) = &mut entries[i] {
                    match dissoc(child, shift + BITS, hash, key, edit) {
                        Removal::NotFound => Removal::NotFound,
                        Removal::Done => Removal::Done,
                        Removal::Inlined(k, v) => {
                            entries[i] = Entry::Pair(k, v);
                            Removal::Done
                        }
                        Removal::Gone => {
                            entries.remove(i);
                            *bitmap &= !b;
                            if entries.is_empty() {
                                Removal::Gone
                            } else {
                                Removal::Done
                            }
                        }
                    }
                } else {
                    let is_match = matches!(&entries[i], Entry::Pair(k, _) if k.borrow() == key);
                    if !is_match {
                        return Removal::NotFound;
                    }
                    entries.remove(i);
                    *bitmap &= !b;
                    if entries.is_empty() {
                        Removal::Gone
                    } else {
                        Removal::Done
                    }
                }
            }
            Node::Array {
                children, count, ..
            } => {
                let pos = slot_of(hash, shift) as usize;
                let Some(child) = &mut children[pos] else {
                    return Removal::NotFound;
                };
                match dissoc(child, shift + BITS, hash, key, edit) {
                    Removal::NotFound => Removal::NotFound,
                    Removal::Done => Removal::Done,
                    Removal::Inlined(k, v) => {
                        children[pos] = Some(singleton(shift + BITS, hash, k, v, edit));
                        Removal::Done
                    }
                    Removal::Gone => {
                        children[pos] = None;
                        *count -= 1;
                        Removal::Done
                    }
                }
            }
            Node::Collision {
                hash: node_hash,
                entries,
                ..
            } => {
                if *node_hash != hash {
                    return Removal::NotFound;
                }
                let Some(i) = entries.iter().position(|(k, _)| k.borrow() == key) else {
                    return Removal::NotFound;
                };
                entries.remove(i);
                match entries.len() {
                    0 => Removal::Gone,
                    1 => {
                        let (k, v) = entries.pop().expect("one entry left");
                        Removal::Inlined(k, v)
                    }
                    _ => Removal::Done,
                }
            }
        }
    };

    // An array node that drained to the low-water mark packs its remaining
    // children back into a bitmap node.
    if matches!(result, Removal::Done) {
        let demote = matches!(
            &**slot,
            Node::Array { count, .. } if (*count as usize) <= MIN_ARRAY_CHILDREN
        );
        if demote {
            let mut bitmap = 0u32;
            let mut entries = Vec::with_capacity(MIN_ARRAY_CHILDREN);
            if let Node::Array { children, .. } = &**slot {
                for (pos, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        bitmap |= 1 << pos;
                        entries.push(Entry::Node(child.clone()));
                    }
                }
            }
            *slot = Arc::new(Node::Bitmap {
                bitmap,
                entries,
                edit: edit.cloned(),
            });
        }
    }

    result
}
