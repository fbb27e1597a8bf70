//! A persistent, immutable indexed sequence backed by a relaxed
//! radix-balanced tree (an RRB tree).
//!
//! Every operation on an [`Rrbt`] returns a new sequence value; any node the
//! edit didn't have to touch is shared with the predecessor via [`Rc`]. The
//! sequence keeps a small `head`/`tail` buffer so that prepend/append don't
//! have to touch the trie at all until a buffer fills up, at which point it
//! is pushed in as a new leaf.
//!
//! ```
//! use rrbt::Rrbt;
//!
//! let t = Rrbt::new().append(1).append(2).append(3);
//! assert_eq!(t.len(), 3);
//! assert_eq!(t.get(1), 2);
//!
//! let (t, last) = t.pop();
//! assert_eq!(last, Some(3));
//! assert_eq!(t.len(), 2);
//! ```

use std::rc::Rc;

mod error;
mod node;
mod seq;
mod tree;

pub use error::Error;
pub use seq::{Iter, Rrbt};

/// Branch factor: values per leaf, children per internal node.
pub const BRANCH_FACTOR: usize = 32;
/// `B == 2^SHIFT`; the number of index bits consumed per trie level.
pub const SHIFT: u32 = 5;
/// Advisory maximum height before a tree stops being a reasonable fit for
/// this structure (`B^(MAX_HEIGHT+1)` elements, ~10^9 at the default `B`).
/// Not enforced: a well-formed tree may exceed it, just less efficiently.
pub const MAX_HEIGHT: u32 = 6;

pub(crate) type NodeRef<V> = Rc<node::Node<V>>;
