use std::rc::Rc;

use crate::error::Error;
use crate::node::{locate, Node};
use crate::tree;
use crate::{NodeRef, BRANCH_FACTOR};

/// A persistent, immutable sequence of `V`, backed by a relaxed
/// radix-balanced tree.
///
/// The logical value is `head ++ flatten(root) ++ tail`: small buffers at
/// either end absorb single-element edits so that `append`/`prepend` only
/// touch the trie once every `B` operations.
#[derive(Clone, Debug)]
pub struct Rrbt<V> {
    root: Option<NodeRef<V>>,
    height: u32,
    size: u64,
    head: Vec<V>,
    tail: Vec<V>,
}

impl<V> Default for Rrbt<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Rrbt<V> {
    /// An empty sequence.
    pub fn new() -> Self {
        Rrbt {
            root: None,
            height: 0,
            size: 0,
            head: Vec::new(),
            tail: Vec::new(),
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the value at `i`.
    ///
    /// Panics if `i` is not in `[0, len())` — an out-of-range index is a
    /// caller bug, not a recoverable condition.
    pub fn get(&self, i: u64) -> V {
        if i >= self.size {
            panic!(
                "{}",
                Error::OutOfRange {
                    index: i,
                    len: self.size
                }
            );
        }

        let head_len = self.head.len() as u64;
        if i < head_len {
            return self.head[i as usize].clone();
        }
        let tail_start = self.size - self.tail.len() as u64;
        if i >= tail_start {
            return self.tail[(i - tail_start) as usize].clone();
        }

        let mut offset = i - head_len;
        let mut node = self
            .root
            .clone()
            .expect("rrbt: a body index implies a non-empty trie");
        let mut h = self.height;
        loop {
            match node.as_ref() {
                Node::Leaf(vals) => return vals[offset as usize].clone(),
                Node::Internal(internal) => {
                    let (idx, local) = locate(internal, h, offset);
                    node = internal.children[idx].clone();
                    offset = local;
                    h -= 1;
                }
            }
        }
    }

    /// Returns a sequence of `len() + 1` with `v` as the new last element.
    pub fn append(&self, v: V) -> Rrbt<V> {
        let new_tail = slice_utils::push(&self.tail, std::slice::from_ref(&v));
        if new_tail.len() == BRANCH_FACTOR {
            let (root, height) = match &self.root {
                Some(root) => tree::push_right(root.clone(), self.height, new_tail),
                None => (Rc::new(Node::Leaf(new_tail)), 0),
            };
            Rrbt {
                root: Some(root),
                height,
                size: self.size + 1,
                head: self.head.clone(),
                tail: Vec::new(),
            }
        } else {
            Rrbt {
                root: self.root.clone(),
                height: self.height,
                size: self.size + 1,
                head: self.head.clone(),
                tail: new_tail,
            }
        }
    }

    /// Returns a sequence of `len() + 1` with `v` as the new first element.
    pub fn prepend(&self, v: V) -> Rrbt<V> {
        let new_head = slice_utils::push_front(&self.head, std::slice::from_ref(&v));
        if new_head.len() == BRANCH_FACTOR {
            let (root, height) = match &self.root {
                Some(root) => tree::push_left(root.clone(), self.height, new_head),
                None => (Rc::new(Node::Leaf(new_head)), 0),
            };
            Rrbt {
                root: Some(root),
                height,
                size: self.size + 1,
                head: Vec::new(),
                tail: self.tail.clone(),
            }
        } else {
            Rrbt {
                root: self.root.clone(),
                height: self.height,
                size: self.size + 1,
                head: new_head,
                tail: self.tail.clone(),
            }
        }
    }

    /// Removes and returns the last element. Returns `None` as the second
    /// element of the pair (and an unchanged sequence) if `self` is empty.
    pub fn pop(&self) -> (Rrbt<V>, Option<V>) {
        if !self.tail.is_empty() {
            let (new_tail, popped) = slice_utils::pop(&self.tail);
            let popped = popped.expect("rrbt: tail checked non-empty above");
            return (
                Rrbt {
                    root: self.root.clone(),
                    height: self.height,
                    size: self.size - 1,
                    head: self.head.clone(),
                    tail: new_tail,
                },
                Some(popped),
            );
        }

        if let Some(root) = &self.root {
            let result = tree::pop_right(root.clone(), self.height);
            let (root, height) = tree::shrink(result.node, self.height);
            return (
                Rrbt {
                    root,
                    height,
                    size: self.size - 1,
                    head: self.head.clone(),
                    tail: result.new_tail,
                },
                Some(result.popped),
            );
        }

        if !self.head.is_empty() {
            let (new_head, popped) = slice_utils::pop(&self.head);
            let popped = popped.expect("rrbt: head checked non-empty above");
            return (
                Rrbt {
                    root: None,
                    height: 0,
                    size: self.size - 1,
                    head: new_head,
                    tail: Vec::new(),
                },
                Some(popped),
            );
        }

        (self.clone(), None)
    }

    /// Returns a sequence holding the elements in `[i, j)`.
    ///
    /// Panics if not `0 <= i <= j <= len()`.
    pub fn slice(&self, i: u64, j: u64) -> Rrbt<V> {
        if i > j || j > self.size {
            panic!(
                "{}",
                Error::SliceOutOfRange {
                    start: i,
                    end: j,
                    len: self.size
                }
            );
        }
        if i == j {
            return Rrbt::new();
        }

        let head_len = self.head.len() as u64;
        let tail_start = self.size - self.tail.len() as u64;
        let body_start = head_len;
        let body_end = tail_start;

        let new_head = if i < head_len {
            slice_utils::slice(&self.head, i as usize, j.min(head_len) as usize)
        } else {
            Vec::new()
        };
        let tail_from_buffer = if j > tail_start {
            slice_utils::slice(
                &self.tail,
                (i.max(tail_start) - tail_start) as usize,
                (j - tail_start) as usize,
            )
        } else {
            Vec::new()
        };

        let want_body_start = i.max(body_start);
        let want_body_end = j.min(body_end);

        if want_body_start >= want_body_end || self.root.is_none() {
            // no body content survives; head/tail buffers carry everything.
            let head = new_head;
            let tail = if j > tail_start { tail_from_buffer } else { Vec::new() };
            return Rrbt {
                root: None,
                height: 0,
                size: j - i,
                head,
                tail,
            };
        }

        let body_i = want_body_start - body_start;
        let body_j = want_body_end - body_start;
        let root = self.root.clone().unwrap();

        let (after_truncate, extra_tail) = if body_j == self.root_body_size() {
            (Some(root), None)
        } else {
            let r = tree::truncate(root, self.height, body_j);
            (r.node, r.new_tail)
        };

        let (final_node, extra_head) = match after_truncate {
            None => (None, None),
            Some(node) if body_i == 0 => (Some(node), None),
            Some(node) => {
                let r = tree::retain(node, self.height, body_i);
                (r.node, r.new_head)
            }
        };

        let (final_root, final_height) = tree::shrink(final_node, self.height);

        let head = if i < head_len { new_head } else { extra_head.unwrap_or_default() };
        let tail = if j > tail_start {
            tail_from_buffer
        } else {
            extra_tail.unwrap_or_default()
        };

        Rrbt {
            root: final_root,
            height: final_height,
            size: j - i,
            head,
            tail,
        }
    }

    fn root_body_size(&self) -> u64 {
        self.root.as_ref().map(|r| r.len()).unwrap_or(0)
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter { seq: self, idx: 0 }
    }
}

impl<'a, V: Clone> IntoIterator for &'a Rrbt<V> {
    type Item = V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Clone> FromIterator<V> for Rrbt<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut t = Rrbt::new();
        for v in iter {
            t = t.append(v);
        }
        t
    }
}

/// A simple left-to-right traversal of an [`Rrbt`]. Each step re-descends
/// the trie from the root; this is the "simple recursive traversal" the
/// contract asks for, not an optimized cursor.
pub struct Iter<'a, V> {
    seq: &'a Rrbt<V>,
    idx: u64,
}

impl<'a, V: Clone> Iterator for Iter<'a, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.idx >= self.seq.len() {
            return None;
        }
        let v = self.seq.get(self.idx);
        self.idx += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.seq.len() - self.idx) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
fn is_well_formed<V>(t: &Rrbt<V>) -> bool {
    let root_size = t.root.as_ref().map(|r| r.len()).unwrap_or(0);
    if t.head.len() as u64 + root_size + t.tail.len() as u64 != t.size {
        return false;
    }
    if t.head.len() >= BRANCH_FACTOR || t.tail.len() >= BRANCH_FACTOR {
        return false;
    }
    match &t.root {
        None => t.height == 0,
        Some(root) => crate::node::check_invariants(root, t.height, true),
    }
}
