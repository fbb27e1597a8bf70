//! A persistent, immutable associative map backed by a 64-wide hash array
//! mapped trie (a HAMT).
//!
//! Every operation on a [`Hamt`] returns a new map value; any node the edit
//! didn't have to touch is shared with the predecessor via [`Arc`]. Sharing
//! is made explicit through `Arc`'s own atomic strong count, which doubles
//! as the reference count the persistent variant's copy-on-write-when-shared
//! discipline is specified against.
//!
//! ```
//! use hamt::{Hamt, Hasher};
//!
//! struct Fnv;
//! impl Hasher<String> for Fnv {
//!     fn hash(&self, key: &String) -> u64 {
//!         let mut h: u64 = 0xcbf29ce484222325;
//!         for b in key.as_bytes() {
//!             h ^= *b as u64;
//!             h = h.wrapping_mul(0x100000001b3);
//!         }
//!         h
//!     }
//!     fn rehash(&self, key: &String, prev_hash_count: u32) -> u64 {
//!         self.hash(&format!("{key}#{prev_hash_count}"))
//!     }
//! }
//!
//! let m = Hamt::new(Fnv).put("a".to_string(), 1).put("b".to_string(), 2);
//! assert_eq!(m.get(&"a".to_string()), Some(&1));
//! assert_eq!(m.len(), 2);
//! ```

use std::sync::Arc;

mod error;
mod hasher;
mod map;
mod node;

pub use error::Error;
pub use hasher::Hasher;
pub use map::{Hamt, Iter};

/// Children per node: 64, addressed with 6 bits per level.
pub const FAN_OUT: usize = 64;
/// `FAN_OUT == 2^ARITY_BITS`; index bits consumed per trie level.
pub const ARITY_BITS: u32 = 6;
/// The level at which a 64-bit hash's bits are exhausted and a rehash is due.
pub const EXHAUSTED_LEVEL: u32 = 64 / ARITY_BITS;
/// Maximum descent depth (~5 rehash cycles) before a hasher is judged bad.
pub const MAX_DEPTH: u32 = 55;

pub(crate) type NodeRef<K, V> = Arc<node::Node<K, V>>;
