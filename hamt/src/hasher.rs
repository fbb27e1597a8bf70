/// Supplies the 64-bit hashes a [`crate::Hamt`] descends on.
///
/// `hash` is called once per key, at the root. `rehash` is called every time
/// a descent exhausts a previous hash's 64 bits and needs a fresh,
/// uncorrelated one to keep going; `prev_hash_count` is how many times this
/// key has already been rehashed (1 the first time, 2 the next, ...).
/// Implementations should make `rehash` behave like an independent hash
/// function per `prev_hash_count` — reusing the same derived hash across
/// counts defeats the collision resolution it exists for.
pub trait Hasher<K> {
    fn hash(&self, key: &K) -> u64;
    fn rehash(&self, key: &K, prev_hash_count: u32) -> u64;
}
