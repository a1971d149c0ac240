// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use pcoll_shared::{token_matches, EditToken};

use crate::{BITS, MASK, WIDTH};

/// Trie node: interior nodes hold 32 child slots, leaves hold 32 elements.
///
/// The `edit` field ties a node to the transient that created it; a node may
/// be written in place only while its token matches the live token of the
/// transient performing the write.
#[derive(Debug, Clone)]
pub(crate) enum Node<T> {
    Branch {
        children: Vec<Option<Arc<Node<T>>>>,
        edit: Option<EditToken>,
    },
    Leaf {
        elems: Vec<T>,
        edit: Option<EditToken>,
    },
}

impl<T> Node<T> {
    pub(crate) fn empty_branch(edit: Option<&EditToken>) -> Arc<Self> {
        Arc::new(Node::Branch {
            children: empty_slots(),
            edit: edit.cloned(),
        })
    }

    pub(crate) fn leaf(elems: Vec<T>, edit: Option<&EditToken>) -> Arc<Self> {
        debug_assert_eq!(elems.len(), WIDTH);
        Arc::new(Node::Leaf {
            elems,
            edit: edit.cloned(),
        })
    }

    pub(crate) fn set_edit(&mut self, edit: Option<EditToken>) {
        match self {
            Node::Branch { edit: e, .. } | Node::Leaf { edit: e, .. } => *e = edit,
        }
    }

    fn edit_ref(&self) -> Option<&EditToken> {
        match self {
            Node::Branch { edit, .. } | Node::Leaf { edit, .. } => edit.as_ref(),
        }
    }
}

pub(crate) fn empty_slots<T>() -> Vec<Option<Arc<Node<T>>>> {
    (0..WIDTH).map(|_| None).collect()
}

/// Obtain a writable reference to the node in `slot`.
///
/// A node already stamped with the live token `edit` is edited in place;
/// any other node is cloned first and the copy stamped, so shared structure
/// is never written through.
fn make_editable<'s, T: Clone>(
    slot: &'s mut Arc<Node<T>>,
    edit: Option<&EditToken>,
) -> &'s mut Node<T> {
    if !token_matches(slot.edit_ref(), edit) {
        let mut copy = (**slot).clone();
        copy.set_edit(edit.cloned());
        *slot = Arc::new(copy);
    }
    Arc::make_mut(slot)
}

/// Walk down to the leaf holding index `i`. The caller guarantees `i` is
/// below the trie's element count.
pub(crate) fn leaf_for<'a, T>(root: &'a Node<T>, shift: usize, i: usize) -> &'a [T] {
    let mut node = root;
    let mut level = shift;
    while level > 0 {
        let Node::Branch { children, .. } = node else {
            unreachable!("leaf above level 0");
        };
        node = children[(i >> level) & MASK]
            .as_deref()
            .expect("trie path exists below count");
        level -= BITS;
    }
    match node {
        Node::Leaf { elems, .. } => elems,
        Node::Branch { .. } => unreachable!("trie path must end in a leaf"),
    }
}

/// Insert a full leaf whose first index is `base`, creating spine nodes on
/// the fresh path as needed.
pub(crate) fn push_leaf<T: Clone>(
    slot: &mut Arc<Node<T>>,
    level: usize,
    base: usize,
    leaf: Arc<Node<T>>,
    edit: Option<&EditToken>,
) {
    let node = make_editable(slot, edit);
    let Node::Branch { children, .. } = node else {
        unreachable!("leaf above level 0");
    };
    let sub = (base >> level) & MASK;
    if level == BITS {
        children[sub] = Some(leaf);
    } else {
        match &mut children[sub] {
            Some(child) => push_leaf(child, level - BITS, base, leaf, edit),
            vacant => *vacant = Some(new_path(level - BITS, leaf, edit)),
        }
    }
}

/// A one-child spine of `level / 5` branch nodes ending in `node`.
pub(crate) fn new_path<T: Clone>(
    level: usize,
    node: Arc<Node<T>>,
    edit: Option<&EditToken>,
) -> Arc<Node<T>> {
    if level == 0 {
        return node;
    }
    let mut children = empty_slots();
    children[0] = Some(new_path(level - BITS, node, edit));
    Arc::new(Node::Branch {
        children,
        edit: edit.cloned(),
    })
}

/// Replace the element at index `i`, path-copying shared nodes.
pub(crate) fn set_in_trie<T: Clone>(
    slot: &mut Arc<Node<T>>,
    level: usize,
    i: usize,
    value: T,
    edit: Option<&EditToken>,
) {
    let node = make_editable(slot, edit);
    if level == 0 {
        let Node::Leaf { elems, .. } = node else {
            unreachable!("branch at level 0");
        };
        elems[i & MASK] = value;
    } else {
        let Node::Branch { children, .. } = node else {
            unreachable!("leaf above level 0");
        };
        let child = children[(i >> level) & MASK]
            .as_mut()
            .expect("trie path exists below count");
        set_in_trie(child, level - BITS, i, value, edit);
    }
}

/// Remove the rightmost leaf, whose first index is `base`. Returns `false`
/// when this whole subtree became empty and the parent must clear its slot.
pub(crate) fn pop_leaf<T: Clone>(
    slot: &mut Arc<Node<T>>,
    level: usize,
    base: usize,
    edit: Option<&EditToken>,
) -> bool {
    let node = make_editable(slot, edit);
    let Node::Branch { children, .. } = node else {
        unreachable!("leaf above level 0");
    };
    let sub = (base >> level) & MASK;
    if level == BITS {
        children[sub] = None;
        return sub != 0;
    }
    let child = children[sub]
        .as_mut()
        .expect("trie path exists below count");
    if pop_leaf(child, level - BITS, base, edit) {
        true
    } else {
        children[sub] = None;
        sub != 0
    }
}

/// Drop single-child root levels left behind by a pop.
pub(crate) fn collapse_root<T>(root: &mut Arc<Node<T>>, shift: &mut usize) {
    while *shift > BITS {
        let child = match &**root {
            Node::Branch { children, .. } if children[1].is_none() => children[0].clone(),
            _ => break,
        };
        match child {
            Some(c) => {
                *root = c;
                *shift -= BITS;
            }
            None => break,
        }
    }
}
