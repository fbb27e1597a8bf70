//! Bitmap-indexed trie node and the put/get/delete descent.
//!
//! Every populated bucket holds exactly one [`Slot`]: a key/value record, or
//! a child subtree. `Arc::make_mut` gives us copy-on-write-when-shared for
//! free from the refcount `Arc` already keeps — entering a node whose
//! strong count is 1 mutates it in place; entering a shared one clones just
//! that node's own bucket array first.

use std::sync::Arc;

use crate::error::Error;
use crate::hasher::Hasher;
use crate::{ARITY_BITS, EXHAUSTED_LEVEL, FAN_OUT, MAX_DEPTH};

#[derive(Clone, Debug)]
pub(crate) enum Slot<K, V> {
    Record(K, V),
    Child(Arc<Node<K, V>>),
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub bitmap: u64,
    pub content: Vec<Slot<K, V>>,
}

impl<K, V> Node<K, V> {
    pub fn empty() -> Self {
        Node {
            bitmap: 0,
            content: Vec::new(),
        }
    }

    fn slot_index(&self, bit: u64) -> usize {
        (self.bitmap & (bit - 1)).count_ones() as usize
    }
}

fn bucket(hash: u64, shift: u32) -> usize {
    ((hash >> shift) & (FAN_OUT as u64 - 1)) as usize
}

/// Derives the hash to use for `key` at a given descent `depth`, rehashing
/// as many times as `depth` implies. Pure function of `(key, depth)`: two
/// calls with the same arguments always agree, which is what lets a
/// collision handler recompute a stored key's hash without having cached it.
fn compute_hash<K, H: Hasher<K>>(hasher: &H, key: &K, depth: u32) -> u64 {
    let prev_hash_count = depth / (EXHAUSTED_LEVEL + 1);
    if prev_hash_count == 0 {
        hasher.hash(key)
    } else if depth > MAX_DEPTH {
        log::trace!("hamt: descent past max depth {depth}, hasher is too collision-prone");
        panic!("{}", Error::BadHasher { depth });
    } else {
        hasher.rehash(key, prev_hash_count)
    }
}

pub(crate) fn put<K, V, H>(root: &mut Arc<Node<K, V>>, hasher: &H, key: K, value: V) -> bool
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K>,
{
    let hash = compute_hash(hasher, &key, 0);
    put_rec(root, hasher, key, value, hash, 0)
}

fn put_rec<K, V, H>(
    node_slot: &mut Arc<Node<K, V>>,
    hasher: &H,
    key: K,
    value: V,
    hash: u64,
    depth: u32,
) -> bool
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K>,
{
    let level = depth % (EXHAUSTED_LEVEL + 1);
    let shift = level * ARITY_BITS;
    let bit = 1u64 << bucket(hash, shift);

    let node = Arc::make_mut(node_slot);
    let idx = node.slot_index(bit);

    if node.bitmap & bit == 0 {
        node.content.insert(idx, Slot::Record(key, value));
        node.bitmap |= bit;
        return true;
    }

    let mut is_child = false;
    let mut same_key = false;
    match &node.content[idx] {
        Slot::Record(k, _) => same_key = *k == key,
        Slot::Child(_) => is_child = true,
    }

    if !is_child {
        if same_key {
            node.content[idx] = Slot::Record(key, value);
            return false;
        }
        let (old_key, old_value) = match node.content.remove(idx) {
            Slot::Record(k, v) => (k, v),
            Slot::Child(_) => unreachable!(),
        };
        let old_hash = compute_hash(hasher, &old_key, depth);
        let child = insert_double(hasher, hash, key, value, old_hash, old_key, old_value, depth);
        node.content.insert(idx, Slot::Child(child));
        return true;
    }

    let next_depth = depth + 1;
    let next_hash = if level == EXHAUSTED_LEVEL {
        compute_hash(hasher, &key, next_depth)
    } else {
        hash
    };
    match &mut node.content[idx] {
        Slot::Child(child) => put_rec(child, hasher, key, value, next_hash, next_depth),
        Slot::Record(_, _) => unreachable!(),
    }
}

/// Builds a fresh subtree holding two colliding records, recursing one
/// level deeper for as long as their bucket at the current level coincides.
fn insert_double<K, V, H>(
    hasher: &H,
    h1: u64,
    k1: K,
    v1: V,
    h2: u64,
    k2: K,
    v2: V,
    depth: u32,
) -> Arc<Node<K, V>>
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K>,
{
    let level = depth % (EXHAUSTED_LEVEL + 1);
    let shift = level * ARITY_BITS;
    let b1 = bucket(h1, shift);
    let b2 = bucket(h2, shift);

    if b1 != b2 {
        let (first_b, first, second_b, second) = if b1 < b2 {
            (b1, Slot::Record(k1, v1), b2, Slot::Record(k2, v2))
        } else {
            (b2, Slot::Record(k2, v2), b1, Slot::Record(k1, v1))
        };
        return Arc::new(Node {
            bitmap: (1u64 << first_b) | (1u64 << second_b),
            content: vec![first, second],
        });
    }

    let next_depth = depth + 1;
    let (h1, h2) = if level == EXHAUSTED_LEVEL {
        (
            compute_hash(hasher, &k1, next_depth),
            compute_hash(hasher, &k2, next_depth),
        )
    } else {
        (h1, h2)
    };
    let child = insert_double(hasher, h1, k1, v1, h2, k2, v2, next_depth);
    Arc::new(Node {
        bitmap: 1u64 << b1,
        content: vec![Slot::Child(child)],
    })
}

pub(crate) fn get<'a, K, V, H>(root: &'a Node<K, V>, hasher: &H, key: &K) -> Option<&'a V>
where
    K: Eq,
    H: Hasher<K>,
{
    let hash = compute_hash(hasher, key, 0);
    get_rec(root, hasher, key, hash, 0)
}

fn get_rec<'a, K, V, H>(node: &'a Node<K, V>, hasher: &H, key: &K, hash: u64, depth: u32) -> Option<&'a V>
where
    K: Eq,
    H: Hasher<K>,
{
    let level = depth % (EXHAUSTED_LEVEL + 1);
    let shift = level * ARITY_BITS;
    let bit = 1u64 << bucket(hash, shift);
    if node.bitmap & bit == 0 {
        return None;
    }
    let idx = node.slot_index(bit);
    match &node.content[idx] {
        Slot::Record(k, v) => {
            if k == key {
                Some(v)
            } else {
                None
            }
        }
        Slot::Child(child) => {
            let next_depth = depth + 1;
            let next_hash = if level == EXHAUSTED_LEVEL {
                compute_hash(hasher, key, next_depth)
            } else {
                hash
            };
            get_rec(child, hasher, key, next_hash, next_depth)
        }
    }
}

enum DeleteResult {
    NotFound,
    Removed,
    Updated,
}

pub(crate) fn delete<K, V, H>(root: &mut Option<Arc<Node<K, V>>>, hasher: &H, key: &K) -> bool
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K>,
{
    let Some(node) = root else {
        return false;
    };
    let hash = compute_hash(hasher, key, 0);
    match delete_rec(node, hasher, key, hash, 0) {
        DeleteResult::NotFound => false,
        DeleteResult::Removed => {
            *root = None;
            true
        }
        DeleteResult::Updated => true,
    }
}

fn delete_rec<K, V, H>(
    node_slot: &mut Arc<Node<K, V>>,
    hasher: &H,
    key: &K,
    hash: u64,
    depth: u32,
) -> DeleteResult
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K>,
{
    let level = depth % (EXHAUSTED_LEVEL + 1);
    let shift = level * ARITY_BITS;
    let bit = 1u64 << bucket(hash, shift);

    let node = Arc::make_mut(node_slot);
    if node.bitmap & bit == 0 {
        return DeleteResult::NotFound;
    }
    let idx = node.slot_index(bit);

    let mut is_child = false;
    let mut same_key = false;
    match &node.content[idx] {
        Slot::Record(k, _) => same_key = *k == *key,
        Slot::Child(_) => is_child = true,
    }

    if !is_child {
        if !same_key {
            return DeleteResult::NotFound;
        }
        node.content.remove(idx);
        node.bitmap &= !bit;
        return if node.bitmap == 0 {
            DeleteResult::Removed
        } else {
            DeleteResult::Updated
        };
    }

    let next_depth = depth + 1;
    let next_hash = if level == EXHAUSTED_LEVEL {
        compute_hash(hasher, key, next_depth)
    } else {
        hash
    };
    let result = match &mut node.content[idx] {
        Slot::Child(child) => delete_rec(child, hasher, key, next_hash, next_depth),
        Slot::Record(_, _) => unreachable!(),
    };

    match result {
        DeleteResult::NotFound => DeleteResult::NotFound,
        DeleteResult::Removed => {
            node.content.remove(idx);
            node.bitmap &= !bit;
            if node.bitmap == 0 {
                DeleteResult::Removed
            } else {
                DeleteResult::Updated
            }
        }
        DeleteResult::Updated => {
            let collapse = matches!(
                &node.content[idx],
                Slot::Child(c) if c.content.len() == 1 && matches!(c.content[0], Slot::Record(_, _))
            );
            if collapse {
                if let Slot::Child(c) = &node.content[idx] {
                    node.content[idx] = c.content[0].clone();
                }
            }
            DeleteResult::Updated
        }
    }
}

/// Enumerates every binding reachable from `node` in bucket order, calling
/// `f(key, value)` for each; stops early (returning `true`) the first time
/// `f` returns `true`.
pub(crate) fn range<K, V, F: FnMut(&K, &V) -> bool>(node: &Node<K, V>, f: &mut F) -> bool {
    for slot in &node.content {
        let stop = match slot {
            Slot::Record(k, v) => f(k, v),
            Slot::Child(child) => range(child, f),
        };
        if stop {
            return true;
        }
    }
    false
}

/// `2 * popcount(bitmap) == len(content)` in the two-cell layout this crate
/// originated from; our content array holds one tagged [`Slot`] per
/// populated bucket instead of a parallel (record, child) cell pair, so the
/// equivalent check is simply `popcount(bitmap) == len(content)`.
pub(crate) fn is_well_formed<K, V>(node: &Node<K, V>) -> bool {
    node.bitmap.count_ones() as usize == node.content.len()
        && node.content.iter().all(|slot| match slot {
            Slot::Child(child) => is_well_formed(child),
            Slot::Record(_, _) => true,
        })
}
