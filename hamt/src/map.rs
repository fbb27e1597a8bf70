use std::sync::Arc;

use crate::hasher::Hasher;
use crate::node::{self, Node};
use crate::NodeRef;

/// A persistent, immutable associative map from `K` to `V`, backed by a
/// 64-wide hash array mapped trie.
///
/// Every operation returns a new [`Hamt`]; any node an edit didn't have to
/// touch is shared with the predecessor via [`Arc`]. [`clone`](Clone::clone)
/// is an O(1) root-refcount bump, matching the contract of the reference-
/// counted persistent variant this type implements.
#[derive(Clone, Debug)]
pub struct Hamt<K, V, H> {
    root: NodeRef<K, V>,
    len: usize,
    hasher: H,
}

impl<K, V, H> Hamt<K, V, H>
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K> + Clone,
{
    /// An empty map using `hasher` to place keys.
    pub fn new(hasher: H) -> Self {
        Hamt {
            root: Arc::new(Node::empty()),
            len: 0,
            hasher,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Looks up `key`. Returns `None` if unbound.
    pub fn get(&self, key: &K) -> Option<&V> {
        node::get(&self.root, &self.hasher, key)
    }

    /// Returns a map binding `key` to `value`, replacing any prior binding.
    pub fn put(&self, key: K, value: V) -> Hamt<K, V, H> {
        let mut root = self.root.clone();
        let inserted = node::put(&mut root, &self.hasher, key, value);
        Hamt {
            root,
            len: if inserted { self.len + 1 } else { self.len },
            hasher: self.hasher.clone(),
        }
    }

    /// Returns a map without a binding for `key`; a no-op (the same logical
    /// map) if `key` was unbound.
    pub fn delete(&self, key: &K) -> Hamt<K, V, H> {
        let mut root_opt = Some(self.root.clone());
        let found = node::delete(&mut root_opt, &self.hasher, key);
        let root = root_opt.unwrap_or_else(|| Arc::new(Node::empty()));
        Hamt {
            root,
            len: if found { self.len - 1 } else { self.len },
            hasher: self.hasher.clone(),
        }
    }

    /// Enumerates every binding in unspecified order. `f` returning `true`
    /// halts the traversal early.
    pub fn range<F: FnMut(&K, &V) -> bool>(&self, mut f: F) {
        node::range(&self.root, &mut f);
    }

    /// Collects every binding into an iterator. Built on [`range`](Self::range);
    /// this is the "simple recursive traversal", not a lazy cursor.
    pub fn iter(&self) -> Iter<K, V> {
        let mut items = Vec::with_capacity(self.len);
        self.range(|k, v| {
            items.push((k.clone(), v.clone()));
            false
        });
        Iter {
            items: items.into_iter(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_well_formed(&self) -> bool {
        node::is_well_formed(&self.root)
    }
}

impl<'a, K, V, H> IntoIterator for &'a Hamt<K, V, H>
where
    K: Clone + Eq,
    V: Clone,
    H: Hasher<K> + Clone,
{
    type Item = (K, V);
    type IntoIter = Iter<K, V>;

    fn into_iter(self) -> Iter<K, V> {
        self.iter()
    }
}

/// An eagerly-collected traversal of a [`Hamt`]'s bindings.
pub struct Iter<K, V> {
    items: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for Iter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[derive(Clone)]
    struct Fnv1a;

    impl Fnv1a {
        fn hash_bytes(bytes: &[u8]) -> u64 {
            let mut h: u64 = 0xcbf29ce484222325;
            for b in bytes {
                h ^= *b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            h
        }
    }

    impl Hasher<String> for Fnv1a {
        fn hash(&self, key: &String) -> u64 {
            Self::hash_bytes(key.as_bytes())
        }

        fn rehash(&self, key: &String, prev_hash_count: u32) -> u64 {
            Self::hash_bytes(format!("{key}#{prev_hash_count}").as_bytes())
        }
    }

    /// Forces a collision at every level and every rehash, so descent always
    /// runs to `MAX_DEPTH` — the degenerate hasher the `BadHasher` contract
    /// exists for.
    #[derive(Clone)]
    struct AlwaysCollide;

    impl Hasher<String> for AlwaysCollide {
        fn hash(&self, _key: &String) -> u64 {
            0
        }

        fn rehash(&self, _key: &String, _prev_hash_count: u32) -> u64 {
            0
        }
    }

    /// Hand-picked hashes for exactly the fixture keys `put`/`get` scenario
    /// tests use: `c`/`d` collide once (resolved by a single rehash),
    /// `rehash2time_1`/`_2` collide through two full rehash cycles before
    /// diverging, and `panic1`/`panic2` collide under every rehash forever.
    #[derive(Clone)]
    struct CollisionHasher;

    impl Hasher<String> for CollisionHasher {
        fn hash(&self, key: &String) -> u64 {
            match key.as_str() {
                "a" => 0,
                "b" => 1,
                "c" => 2,
                "d" => 2,
                "rehash2time_1" => 5,
                "rehash2time_2" => 5,
                "panic1" => 9,
                "panic2" => 9,
                other => panic!("CollisionHasher has no fixture for {other:?}"),
            }
        }

        fn rehash(&self, key: &String, prev_hash_count: u32) -> u64 {
            match key.as_str() {
                "c" => 3,
                "d" => 4,
                "rehash2time_1" => {
                    if prev_hash_count <= 1 {
                        5
                    } else {
                        6
                    }
                }
                "rehash2time_2" => {
                    if prev_hash_count <= 1 {
                        5
                    } else {
                        7
                    }
                }
                "panic1" => 9,
                "panic2" => 9,
                other => panic!("CollisionHasher has no rehash fixture for {other:?}"),
            }
        }
    }

    fn well_formed<K: Clone + Eq, V: Clone, H: Hasher<K> + Clone>(m: &Hamt<K, V, H>) -> bool {
        m.is_well_formed()
    }

    #[test]
    fn put_then_get() {
        let m = Hamt::new(Fnv1a).put("a".to_string(), 1).put("b".to_string(), 2);
        assert_eq!(m.get(&"a".to_string()), Some(&1));
        assert_eq!(m.get(&"b".to_string()), Some(&2));
        assert_eq!(m.get(&"c".to_string()), None);
        assert_eq!(m.len(), 2);
        assert!(well_formed(&m));
    }

    #[test]
    fn put_same_key_replaces_without_growing_len() {
        let m = Hamt::new(Fnv1a).put("a".to_string(), 1);
        let m2 = m.put("a".to_string(), 2);
        assert_eq!(m2.len(), 1);
        assert_eq!(m2.get(&"a".to_string()), Some(&2));
        assert!(well_formed(&m2));
    }

    #[test]
    fn put_distinct_keys_does_not_disturb_others() {
        let mut m = Hamt::new(Fnv1a);
        let keys: Vec<String> = (0..500).map(|i| format!("key-{i}")).collect();
        for (i, k) in keys.iter().enumerate() {
            m = m.put(k.clone(), i);
        }
        assert_eq!(m.len(), keys.len());
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k), Some(&i));
        }
        assert!(well_formed(&m));
    }

    #[test]
    fn delete_removes_binding_and_is_noop_when_absent() {
        let m = Hamt::new(Fnv1a).put("a".to_string(), 1).put("b".to_string(), 2);
        let m2 = m.delete(&"a".to_string());
        assert_eq!(m2.get(&"a".to_string()), None);
        assert_eq!(m2.get(&"b".to_string()), Some(&2));
        assert_eq!(m2.len(), 1);
        assert!(well_formed(&m2));

        let m3 = m2.delete(&"nope".to_string());
        assert_eq!(m3.len(), m2.len());
    }

    #[test]
    fn clone_is_independent() {
        let m = Hamt::new(Fnv1a).put("a".to_string(), 1);
        let cloned = m.clone();
        let edited = cloned.put("a".to_string(), 2);
        assert_eq!(m.get(&"a".to_string()), Some(&1));
        assert_eq!(edited.get(&"a".to_string()), Some(&2));
    }

    #[test]
    fn range_visits_every_binding() {
        let mut m = Hamt::new(Fnv1a);
        for i in 0..50 {
            m = m.put(format!("k{i}"), i);
        }
        let mut seen = std::collections::HashSet::new();
        m.range(|k, v| {
            seen.insert((k.clone(), *v));
            false
        });
        assert_eq!(seen.len(), 50);
        for i in 0..50 {
            assert!(seen.contains(&(format!("k{i}"), i)));
        }
    }

    #[test]
    fn range_stops_early() {
        let mut m = Hamt::new(Fnv1a);
        for i in 0..50 {
            m = m.put(format!("k{i}"), i);
        }
        let mut count = 0;
        m.range(|_, _| {
            count += 1;
            count == 5
        });
        assert_eq!(count, 5);
    }

    #[test]
    fn iter_collects_all_bindings() {
        let mut m = Hamt::new(Fnv1a);
        for i in 0..20 {
            m = m.put(format!("k{i}"), i);
        }
        let collected: std::collections::HashMap<_, _> = m.iter().collect();
        assert_eq!(collected.len(), 20);
        for i in 0..20 {
            assert_eq!(collected.get(&format!("k{i}")), Some(&i));
        }
    }

    #[test]
    fn forced_collisions_with_rehash() {
        let keys = [
            "a",
            "b",
            "c",
            "d",
            "rehash2time_1",
            "rehash2time_2",
            "panic1",
        ];
        let mut m = Hamt::new(CollisionHasher);
        for (i, k) in keys.iter().enumerate() {
            m = m.put(k.to_string(), i + 1);
            assert_eq!(m.len(), i + 1);
            assert_eq!(m.get(&k.to_string()), Some(&(i + 1)));
            assert!(well_formed(&m));
        }
        for k in &keys {
            assert!(m.get(&k.to_string()).is_some());
        }
    }

    #[test]
    #[should_panic]
    fn forced_collisions_exhaust_rehash_and_panic() {
        let keys = [
            "a",
            "b",
            "c",
            "d",
            "rehash2time_1",
            "rehash2time_2",
            "panic1",
            "panic2",
        ];
        let mut m = Hamt::new(CollisionHasher);
        for (i, k) in keys.iter().enumerate() {
            m = m.put(k.to_string(), i + 1);
        }
    }

    #[test]
    #[should_panic]
    fn degenerate_hasher_hits_bad_hasher() {
        let mut m: Hamt<String, i32, AlwaysCollide> = Hamt::new(AlwaysCollide);
        for i in 0..8 {
            m = m.put(format!("key-{i}"), i);
        }
    }

    #[test]
    fn bulk_with_uuid_like_keys_then_drain_the_clone() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        let n = 10_000;
        let keys: Vec<String> = (0..n)
            .map(|_| {
                (0..36)
                    .map(|_| (b'a' + rng.gen_range(0..26)) as char)
                    .collect::<String>()
            })
            .collect();

        let mut m = Hamt::new(Fnv1a);
        for (i, k) in keys.iter().enumerate() {
            m = m.put(k.clone(), i);
        }
        assert_eq!(m.len(), n);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k), Some(&i));
        }

        let mut clone = m.clone();
        for k in &keys {
            clone = clone.delete(k);
        }
        assert_eq!(clone.len(), 0);
        assert_eq!(m.len(), n);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k), Some(&i));
        }
        assert!(well_formed(&m));
        assert!(well_formed(&clone));
    }

    #[quickcheck_macros::quickcheck]
    fn put_get_roundtrip(entries: Vec<(String, i32)>) -> bool {
        let mut m = Hamt::new(Fnv1a);
        for (k, v) in &entries {
            m = m.put(k.clone(), *v);
        }
        entries.iter().all(|(k, _)| {
            let expected = entries.iter().rev().find(|(k2, _)| k2 == k).map(|(_, v)| v);
            m.get(k) == expected
        })
    }
}
