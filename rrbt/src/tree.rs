//! Trie surgery below the head/tail buffers: pushing a full buffer onto a
//! spine, popping the rightmost value back out, and the truncate/retain
//! split used by `slice`.
//!
//! Every function here takes an owned `Rc<Node<V>>` and returns a new one,
//! path-copying via [`Rc::make_mut`] (which is exactly "clone only if
//! someone else can still see this node" — the ownership-gated mutation the
//! sequence API promises, for free from `Rc`'s own refcount).

use std::rc::Rc;

use crate::node::{full_subtree_size, locate, Internal, Node};
use crate::BRANCH_FACTOR;

fn as_internal_mut<V: Clone>(node: &mut Rc<Node<V>>) -> &mut Internal<V> {
    match Rc::make_mut(node) {
        Node::Internal(i) => i,
        Node::Leaf(_) => unreachable!("rrbt: expected an internal node"),
    }
}

fn cumulative_table<V>(children: &[Rc<Node<V>>]) -> Vec<u64> {
    let mut total = 0u64;
    children
        .iter()
        .map(|c| {
            total += c.len();
            total
        })
        .collect()
}

/// Size table for a node whose children were just appended/extended on the
/// right: stays balanced (`None`) iff every child but the last is exactly a
/// full subtree at `child_h`.
fn sizes_for_right<V>(children: &[Rc<Node<V>>], child_h: u32) -> Option<Vec<u64>> {
    let full = full_subtree_size(child_h);
    let regular = children.len() <= 1
        || children[..children.len() - 1]
            .iter()
            .all(|c| c.len() == full);
    if regular {
        None
    } else {
        Some(cumulative_table(children))
    }
}

/// Size table for a node whose children were just extended/trimmed on the
/// left: stays balanced only if the new first child is exactly full *and*
/// the node was not already relaxed (once relaxed, a node stays relaxed).
fn sizes_for_left<V>(children: &[Rc<Node<V>>], child_h: u32, was_relaxed: bool) -> Option<Vec<u64>> {
    let full = full_subtree_size(child_h);
    let regular = !was_relaxed && children.first().map(|c| c.len() == full).unwrap_or(true);
    if regular {
        None
    } else {
        Some(cumulative_table(children))
    }
}

/// Pushes a (typically full, `B`-element) leaf onto the right spine of the
/// trie. Returns the new root and height.
pub(crate) fn push_right<V: Clone>(
    root: Rc<Node<V>>,
    height: u32,
    leaf_values: Vec<V>,
) -> (Rc<Node<V>>, u32) {
    let added = leaf_values.len() as u64;
    let new_leaf = Rc::new(Node::Leaf(leaf_values));
    match try_attach_right(root.clone(), height, new_leaf.clone()) {
        Some(new_root) => (new_root, height),
        None => {
            let mut chain = new_leaf;
            for _ in 0..height {
                chain = Rc::new(Node::Internal(Internal {
                    children: vec![chain],
                    sizes: None,
                    tree_size: added,
                }));
            }
            // the old root is always exactly full here (that's why there was
            // no room for the new chain anywhere along its right spine).
            let children = vec![root, chain];
            let tree_size: u64 = children.iter().map(|c| c.len()).sum();
            let sizes = sizes_for_right(&children, height);
            let new_root = Rc::new(Node::Internal(Internal {
                children,
                sizes,
                tree_size,
            }));
            log::trace!("rrbt: right spine full, growing root to height {}", height + 1);
            (new_root, height + 1)
        }
    }
}

fn try_attach_right<V: Clone>(
    node: Rc<Node<V>>,
    height: u32,
    new_leaf: Rc<Node<V>>,
) -> Option<Rc<Node<V>>> {
    if height == 0 {
        // `node` is itself a bare leaf (a full one, or there'd have been no
        // promotion) with no room to attach a sibling leaf inside it; the
        // caller must grow a new root above both.
        return None;
    }
    if height == 1 {
        if node.as_internal().children.len() == BRANCH_FACTOR {
            return None;
        }
        let mut node = node;
        let internal = as_internal_mut(&mut node);
        internal.children.push(new_leaf);
        internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
        internal.sizes = sizes_for_right(&internal.children, 0);
        return Some(node);
    }

    let last_idx = node.as_internal().children.len() - 1;
    let last_child = node.as_internal().children[last_idx].clone();
    if let Some(new_last) = try_attach_right(last_child, height - 1, new_leaf.clone()) {
        let mut node = node;
        let internal = as_internal_mut(&mut node);
        internal.children[last_idx] = new_last;
        internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
        internal.sizes = sizes_for_right(&internal.children, height - 1);
        return Some(node);
    }

    if node.as_internal().children.len() == BRANCH_FACTOR {
        return None;
    }
    let added = new_leaf.len();
    let mut chain = new_leaf;
    for _ in 0..(height - 1) {
        chain = Rc::new(Node::Internal(Internal {
            children: vec![chain],
            sizes: None,
            tree_size: added,
        }));
    }
    let mut node = node;
    let internal = as_internal_mut(&mut node);
    internal.children.push(chain);
    internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
    internal.sizes = sizes_for_right(&internal.children, height - 1);
    Some(node)
}

/// Pushes a leaf onto the left spine of the trie (see [`push_right`]).
/// Left insertion always relaxes the nodes it touches, per the addressing
/// scheme: a short leftmost child shifts every sibling's position.
pub(crate) fn push_left<V: Clone>(
    root: Rc<Node<V>>,
    height: u32,
    leaf_values: Vec<V>,
) -> (Rc<Node<V>>, u32) {
    let added = leaf_values.len() as u64;
    let new_leaf = Rc::new(Node::Leaf(leaf_values));
    match try_attach_left(root.clone(), height, new_leaf.clone()) {
        Some(new_root) => (new_root, height),
        None => {
            let mut chain = new_leaf;
            for _ in 0..height {
                chain = Rc::new(Node::Internal(Internal {
                    children: vec![chain],
                    sizes: None,
                    tree_size: added,
                }));
            }
            let children = vec![chain, root];
            let tree_size: u64 = children.iter().map(|c| c.len()).sum();
            let sizes = Some(cumulative_table(&children));
            log::trace!("rrbt: left spine full, growing root to height {}", height + 1);
            (
                Rc::new(Node::Internal(Internal {
                    children,
                    sizes,
                    tree_size,
                })),
                height + 1,
            )
        }
    }
}

fn try_attach_left<V: Clone>(
    node: Rc<Node<V>>,
    height: u32,
    new_leaf: Rc<Node<V>>,
) -> Option<Rc<Node<V>>> {
    if height == 0 {
        // `node` is itself a bare leaf with no room to attach a sibling
        // leaf inside it; the caller must grow a new root above both.
        return None;
    }
    if height == 1 {
        if node.as_internal().children.len() == BRANCH_FACTOR {
            return None;
        }
        let mut node = node;
        let internal = as_internal_mut(&mut node);
        internal.children.insert(0, new_leaf);
        internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
        internal.sizes = Some(cumulative_table(&internal.children));
        return Some(node);
    }

    let first_child = node.as_internal().children[0].clone();
    if let Some(new_first) = try_attach_left(first_child, height - 1, new_leaf.clone()) {
        let mut node = node;
        let was_relaxed = node.as_internal().sizes.is_some();
        let internal = as_internal_mut(&mut node);
        internal.children[0] = new_first;
        internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
        internal.sizes = sizes_for_left(&internal.children, height - 1, was_relaxed);
        return Some(node);
    }

    if node.as_internal().children.len() == BRANCH_FACTOR {
        return None;
    }
    let added = new_leaf.len();
    let mut chain = new_leaf;
    for _ in 0..(height - 1) {
        chain = Rc::new(Node::Internal(Internal {
            children: vec![chain],
            sizes: None,
            tree_size: added,
        }));
    }
    let mut node = node;
    let internal = as_internal_mut(&mut node);
    internal.children.insert(0, chain);
    internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
    internal.sizes = Some(cumulative_table(&internal.children));
    Some(node)
}

/// Result of popping the last value out of the trie body.
pub(crate) struct PopResult<V> {
    pub node: Option<Rc<Node<V>>>,
    pub popped: V,
    /// The remaining content of the leaf the value was popped from; this
    /// always becomes the sequence's new `tail` buffer (an interior leaf
    /// always has exactly `B` values, so removing one leaves `B - 1 < B`).
    pub new_tail: Vec<V>,
}

pub(crate) fn pop_right<V: Clone>(node: Rc<Node<V>>, height: u32) -> PopResult<V> {
    if height == 0 {
        let mut vals = node.as_leaf().to_vec();
        let popped = vals
            .pop()
            .expect("rrbt: a trie leaf must hold at least one value");
        return PopResult {
            node: None,
            popped,
            new_tail: vals,
        };
    }

    let last_idx = node.as_internal().children.len() - 1;
    let last_child = node.as_internal().children[last_idx].clone();
    let sub = pop_right(last_child.clone(), height - 1);

    match sub.node {
        Some(new_last) => {
            let mut node = node;
            let internal = as_internal_mut(&mut node);
            internal.children[last_idx] = new_last;
            internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
            internal.sizes = sizes_for_right(&internal.children, height - 1);
            PopResult {
                node: Some(node),
                popped: sub.popped,
                new_tail: sub.new_tail,
            }
        }
        None => {
            if last_idx == 0 {
                PopResult {
                    node: None,
                    popped: sub.popped,
                    new_tail: sub.new_tail,
                }
            } else {
                let mut node = node;
                let internal = as_internal_mut(&mut node);
                internal.children.truncate(last_idx);
                internal.tree_size = internal.children.iter().map(|c| c.len()).sum();
                internal.sizes = sizes_for_right(&internal.children, height - 1);
                PopResult {
                    node: Some(node),
                    popped: sub.popped,
                    new_tail: sub.new_tail,
                }
            }
        }
    }
}

/// Result of truncating a subtree to its first `length` values.
pub(crate) struct TruncateResult<V> {
    pub node: Option<Rc<Node<V>>>,
    /// Set when the rightmost surviving leaf fell below `B` values and was
    /// evicted from the trie to become the sequence's new `tail`.
    pub new_tail: Option<Vec<V>>,
}

pub(crate) fn truncate<V: Clone>(node: Rc<Node<V>>, height: u32, length: u64) -> TruncateResult<V> {
    if length == node.len() {
        return TruncateResult {
            node: Some(node),
            new_tail: None,
        };
    }
    if height == 0 {
        let vals = node.as_leaf();
        let kept = slice_utils::slice(vals, 0, length as usize);
        return TruncateResult {
            node: None,
            new_tail: Some(kept),
        };
    }

    let internal = node.as_internal();
    let (child_idx, local_last) = locate(internal, height, length - 1);
    let child = internal.children[child_idx].clone();
    let sub = truncate(child, height - 1, local_last + 1);

    match sub.node {
        None => {
            if child_idx == 0 {
                TruncateResult {
                    node: None,
                    new_tail: sub.new_tail,
                }
            } else {
                let kept: Vec<_> = internal.children[..child_idx].to_vec();
                let tree_size: u64 = kept.iter().map(|c| c.len()).sum();
                let sizes = sizes_for_right(&kept, height - 1);
                TruncateResult {
                    node: Some(Rc::new(Node::Internal(Internal {
                        children: kept,
                        sizes,
                        tree_size,
                    }))),
                    new_tail: sub.new_tail,
                }
            }
        }
        Some(new_child) => {
            let mut kept: Vec<_> = internal.children[..=child_idx].to_vec();
            kept[child_idx] = new_child;
            let tree_size: u64 = kept.iter().map(|c| c.len()).sum();
            let sizes = sizes_for_right(&kept, height - 1);
            TruncateResult {
                node: Some(Rc::new(Node::Internal(Internal {
                    children: kept,
                    sizes,
                    tree_size,
                }))),
                new_tail: sub.new_tail,
            }
        }
    }
}

/// Result of retaining a subtree from position `from` onward.
pub(crate) struct RetainResult<V> {
    pub node: Option<Rc<Node<V>>>,
    /// Set when the leftmost surviving leaf fell below `B` values and was
    /// evicted from the trie to become the sequence's new `head`.
    pub new_head: Option<Vec<V>>,
}

pub(crate) fn retain<V: Clone>(node: Rc<Node<V>>, height: u32, from: u64) -> RetainResult<V> {
    if from == 0 {
        return RetainResult {
            node: Some(node),
            new_head: None,
        };
    }
    if height == 0 {
        let vals = node.as_leaf();
        let kept = slice_utils::slice(vals, from as usize, vals.len());
        return RetainResult {
            node: None,
            new_head: Some(kept),
        };
    }

    let internal = node.as_internal();
    let was_relaxed = !internal.is_balanced();
    let (child_idx, local_from) = locate(internal, height, from);
    let child = internal.children[child_idx].clone();
    let sub = retain(child, height - 1, local_from);

    match sub.node {
        None => {
            if child_idx + 1 == internal.children.len() {
                RetainResult {
                    node: None,
                    new_head: sub.new_head,
                }
            } else {
                let kept: Vec<_> = internal.children[child_idx + 1..].to_vec();
                let tree_size: u64 = kept.iter().map(|c| c.len()).sum();
                let sizes = sizes_for_left(&kept, height - 1, was_relaxed);
                RetainResult {
                    node: Some(Rc::new(Node::Internal(Internal {
                        children: kept,
                        sizes,
                        tree_size,
                    }))),
                    new_head: sub.new_head,
                }
            }
        }
        Some(new_child) => {
            let mut kept: Vec<_> = internal.children[child_idx..].to_vec();
            kept[0] = new_child;
            let tree_size: u64 = kept.iter().map(|c| c.len()).sum();
            let sizes = sizes_for_left(&kept, height - 1, was_relaxed);
            RetainResult {
                node: Some(Rc::new(Node::Internal(Internal {
                    children: kept,
                    sizes,
                    tree_size,
                }))),
                new_head: sub.new_head,
            }
        }
    }
}

/// While the root has exactly one child, descend into it and drop a level.
pub(crate) fn shrink<V: Clone>(mut root: Option<Rc<Node<V>>>, mut height: u32) -> (Option<Rc<Node<V>>>, u32) {
    if root.is_none() {
        return (None, 0);
    }
    while height > 0 {
        let Some(node) = root.as_ref() else { break };
        if node.as_internal().children.len() != 1 {
            break;
        }
        let only = node.as_internal().children[0].clone();
        root = Some(only);
        height -= 1;
    }
    (root, height)
}
