// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::hash::{BuildHasherDefault, Hasher};

use pcoll_hamt::{phashmap, Error, HashMap, TransientMap};
use pcoll_shared::hash_one;
use quickcheck_macros::quickcheck;

/// Hashes everything to one value, forcing every key into collision nodes.
#[derive(Default)]
struct CollidingHasher;

impl Hasher for CollidingHasher {
    fn finish(&self) -> u64 {
        7
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

type CollidingBuild = BuildHasherDefault<CollidingHasher>;

#[test]
fn set_get_delete() {
    let m: HashMap<u32, String> = HashMap::new();
    let m = m.set(1, "world".to_string());
    assert_eq!(m.get(&1), Some(&"world".to_string()));
    let m = m.set(1, "world2".to_string());
    assert_eq!(m.get(&1), Some(&"world2".to_string()));
    assert_eq!(m.len(), 1);
    let m = m.remove(&1);
    assert!(m.is_empty());
    assert_eq!(m.get(&1), None);
}

#[test]
fn updates_leave_the_source_untouched() {
    let base: HashMap<u32, u32> = (0..500).map(|i| (i, i * 2)).collect();
    let bigger = base.set(500, 1000);
    let smaller = base.remove(&250);
    let replaced = base.set(250, 0);
    assert_eq!(base.len(), 500);
    for i in 0..500 {
        assert_eq!(base.get(&i), Some(&(i * 2)));
    }
    assert_eq!(bigger.len(), 501);
    assert_eq!(smaller.len(), 499);
    assert!(!smaller.contains_key(&250));
    assert_eq!(replaced.get(&250), Some(&0));
}

#[test]
fn remove_of_absent_key_returns_self() {
    let m = phashmap! {1 => 1, 2 => 2};
    let same = m.remove(&3);
    assert_eq!(same, m);
    assert_eq!(same.len(), 2);
}

#[test]
fn fetch_reports_missing_keys() {
    let m = phashmap! {"a" => 1};
    assert_eq!(m.fetch("a"), Ok(&1));
    assert_eq!(m.fetch("b"), Err(Error::KeyMissing));
}

#[test]
fn from_flat_requires_even_arity() {
    let m: HashMap<i64, i64> = HashMap::from_flat([1, 10, 2, 20]).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&2), Some(&20));
    assert!(matches!(
        HashMap::<i64, i64>::from_flat([1, 10, 2]),
        Err(Error::OddArity(3))
    ));
}

#[test]
fn colliding_hashes_still_behave_like_a_map() {
    let m: HashMap<String, u32, CollidingBuild> = HashMap::with_hasher(CollidingBuild::default());
    let m = m.set("a".to_string(), 1).set("b".to_string(), 2);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.get("b"), Some(&2));
    let m = m.remove("a");
    assert_eq!(m.len(), 1);
    assert_eq!(m.get("a"), None);
    assert_eq!(m.get("b"), Some(&2));
}

#[test]
fn many_colliding_keys() {
    let mut m: HashMap<u32, u32, CollidingBuild> = HashMap::with_hasher(CollidingBuild::default());
    for i in 0..50 {
        m = m.set(i, i + 100);
    }
    assert_eq!(m.len(), 50);
    for i in 0..50 {
        assert_eq!(m.get(&i), Some(&(i + 100)));
    }
    for i in 0..50 {
        m = m.remove(&i);
    }
    assert!(m.is_empty());
}

#[test]
fn iteration_covers_every_entry_once() {
    let m: HashMap<u32, u32> = (0..1000).map(|i| (i, i)).collect();
    let mut seen: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..1000).collect::<Vec<_>>());
    assert_eq!(m.keys().count(), 1000);
    assert_eq!(m.values().count(), 1000);
    // Deterministic order for a given value.
    let a: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    let b: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(a, b);
}

#[test]
fn merge_prefers_the_right_operand() {
    let left = phashmap! {1 => "a", 2 => "b"};
    let right = phashmap! {2 => "B", 3 => "C"};
    let merged = left.merge(right.iter().map(|(k, v)| (*k, *v)));
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get(&2), Some(&"B"));
    assert_eq!(merged.get(&1), Some(&"a"));
    // operands untouched
    assert_eq!(left.get(&2), Some(&"b"));
    assert_eq!(right.len(), 2);
}

#[test]
fn insertion_order_does_not_matter() {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let mut rng = rand::rngs::StdRng::seed_from_u64(13);
    let mut entries: Vec<(u32, u32)> = (0..500).map(|i| (i, i * 7)).collect();
    let a: HashMap<u32, u32> = entries.iter().copied().collect();
    entries.shuffle(&mut rng);
    let b: HashMap<u32, u32> = entries.iter().copied().collect();
    assert_eq!(a, b);
    assert_eq!(hash_one(&a), hash_one(&b));
}

#[test]
fn equal_maps_hash_equal() {
    let a: HashMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
    let mut b: HashMap<u32, u32> = HashMap::new();
    for i in (0..100).rev() {
        b = b.set(i, i);
    }
    assert_eq!(a, b);
    assert_eq!(hash_one(&a), hash_one(&b));
    assert_ne!(a, b.set(5, 999));
}

#[test]
fn transient_builds_and_freezes() {
    let mut t: TransientMap<u32, u32> = TransientMap::new();
    for i in 0..1000 {
        t.insert(i, i * 3).unwrap();
    }
    assert!(t.remove(&0).unwrap());
    assert!(!t.remove(&5000).unwrap());
    let m = t.persistent().unwrap();
    assert_eq!(m.len(), 999);
    assert_eq!(m.get(&999), Some(&2997));
    assert!(matches!(t.insert(1, 1), Err(Error::UseAfterFreeze)));
    assert!(matches!(t.remove(&1), Err(Error::UseAfterFreeze)));
    assert!(matches!(t.persistent(), Err(Error::UseAfterFreeze)));
}

#[test]
fn transient_mutation_does_not_leak_into_the_source() {
    let source: HashMap<u32, u32> = (0..300).map(|i| (i, i)).collect();
    let mut t = source.to_transient();
    for i in 0..300 {
        t.insert(i, 0).unwrap();
    }
    for i in 0..100 {
        t.remove(&i).unwrap();
    }
    let edited = t.persistent().unwrap();
    assert_eq!(edited.len(), 200);
    assert_eq!(edited.get(&200), Some(&0));
    assert_eq!(source.len(), 300);
    for i in 0..300 {
        assert_eq!(source.get(&i), Some(&i));
    }
}

#[quickcheck]
fn qc_round_trip(entries: Vec<(u16, u32)>) -> bool {
    let m: HashMap<u16, u32> = entries.iter().copied().collect();
    let expected: std::collections::HashMap<u16, u32> = entries.iter().copied().collect();
    m.len() == expected.len() && expected.iter().all(|(k, v)| m.get(k) == Some(v))
}

#[quickcheck]
fn qc_dissoc_of_fresh_assoc_restores_the_map(entries: Vec<(u16, u32)>, key: u16, value: u32) -> bool {
    let m: HashMap<u16, u32> = entries
        .iter()
        .copied()
        .filter(|(k, _)| *k != key)
        .collect();
    let restored = m.set(key, value).remove(&key);
    restored == m && hash_one(&restored) == hash_one(&m)
}

#[quickcheck]
fn qc_transient_matches_persistent(entries: Vec<(u16, u32)>) -> bool {
    let persistent: HashMap<u16, u32> = entries.iter().copied().collect();
    let mut t: TransientMap<u16, u32> = TransientMap::new();
    for (k, v) in &entries {
        t.insert(*k, *v).unwrap();
    }
    t.persistent().unwrap() == persistent
}
