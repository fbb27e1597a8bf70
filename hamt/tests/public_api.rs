use hamt::{Hamt, Hasher};

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

fn key(i: usize) -> String {
    format!("k{i}")
}

#[test]
fn put_get_delete_roundtrip() {
    let mut m = Hamt::new(Fnv1a);
    for i in 0..200 {
        m = m.put(key(i), i);
    }
    assert_eq!(m.len(), 200);
    for i in 0..200 {
        assert_eq!(m.get(&key(i)), Some(&i));
    }

    for i in (0..200).step_by(2) {
        m = m.delete(&key(i));
    }
    assert_eq!(m.len(), 100);
    for i in 0..200 {
        if i % 2 == 0 {
            assert_eq!(m.get(&key(i)), None);
        } else {
            assert_eq!(m.get(&key(i)), Some(&i));
        }
    }
}

#[test]
fn persistence_across_edits() {
    let base = Hamt::new(Fnv1a).put("a".to_string(), 1);
    let with_b = base.put("b".to_string(), 2);
    let without_a = with_b.delete(&"a".to_string());

    assert_eq!(base.get(&"a".to_string()), Some(&1));
    assert_eq!(base.get(&"b".to_string()), None);

    assert_eq!(with_b.get(&"a".to_string()), Some(&1));
    assert_eq!(with_b.get(&"b".to_string()), Some(&2));

    assert_eq!(without_a.get(&"a".to_string()), None);
    assert_eq!(without_a.get(&"b".to_string()), Some(&2));
}

#[test]
fn into_iter_on_reference_sees_every_binding() {
    let mut m = Hamt::new(Fnv1a);
    for i in 0..64 {
        m = m.put(key(i), i);
    }
    let mut collected: Vec<(String, usize)> = (&m).into_iter().collect();
    collected.sort();
    let mut expected: Vec<(String, usize)> = (0..64).map(|i| (key(i), i)).collect();
    expected.sort();
    assert_eq!(collected, expected);
}

#[test]
fn empty_map_has_no_bindings() {
    let m: Hamt<String, i32, Fnv1a> = Hamt::new(Fnv1a);
    assert!(m.is_empty());
    assert_eq!(m.len(), 0);
    assert_eq!(m.get(&"anything".to_string()), None);
    let mut count = 0;
    m.range(|_, _| {
        count += 1;
        false
    });
    assert_eq!(count, 0);
}

#[test]
fn deleting_absent_key_is_a_noop() {
    let m = Hamt::new(Fnv1a).put("a".to_string(), 1);
    let m2 = m.delete(&"absent".to_string());
    assert_eq!(m2.len(), 1);
    assert_eq!(m2.get(&"a".to_string()), Some(&1));
}
