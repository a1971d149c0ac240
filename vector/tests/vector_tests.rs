// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use pcoll_shared::hash_one;
use pcoll_vector::{pvector, pvector_i64, Error, TransientVector, Vector};
use quickcheck_macros::quickcheck;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[test]
fn push_and_get() {
    let mut v = Vector::new();
    for i in 0..1000u32 {
        v = v.push(i);
    }
    assert_eq!(v.len(), 1000);
    for i in 0..1000usize {
        assert_eq!(v.get(i), Some(&(i as u32)));
    }
    assert_eq!(v.get(1000), None);
    assert_eq!(v.first(), Some(&0));
    assert_eq!(v.last(), Some(&999));
}

#[test]
fn push_leaves_the_source_untouched() {
    let a: Vector<u32> = (0..100).collect();
    let snapshot: Vec<u32> = a.iter().copied().collect();
    let b = a.push(100);
    let c = a.set(5, 999).unwrap();
    let d = a.pop().unwrap();
    assert_eq!(a.len(), 100);
    assert_eq!(a.iter().copied().collect::<Vec<_>>(), snapshot);
    assert_eq!(b.len(), 101);
    assert_eq!(c.get(5), Some(&999));
    assert_eq!(a.get(5), Some(&5));
    assert_eq!(d.len(), 99);
}

#[test]
fn set_at_len_appends() {
    let v = pvector![1, 2, 3];
    let w = v.set(3, 4).unwrap();
    assert_eq!(w.len(), 4);
    assert_eq!(w.get(3), Some(&4));
    assert!(matches!(v.set(5, 9), Err(Error::OutOfRange(5))));
}

#[test]
fn pop_walks_back_through_the_trie() {
    let mut v: Vector<u32> = (0..1100).collect();
    for expect in (0..1100u32).rev() {
        assert_eq!(v.last(), Some(&expect));
        v = v.pop().unwrap();
        assert_eq!(v.len(), expect as usize);
    }
    assert!(v.is_empty());
    assert!(matches!(v.pop(), Err(Error::Empty)));
    assert_eq!(v, Vector::new());
}

#[test]
fn iteration_is_in_index_order() {
    let v: Vector<usize> = (0..500).collect();
    let collected: Vec<usize> = v.iter().copied().collect();
    assert_eq!(collected, (0..500).collect::<Vec<_>>());
    // Chunk boundaries at multiples of 32 and into the tail.
    assert_eq!(v.iter().count(), 500);
}

#[test]
fn equal_vectors_hash_equal() {
    let a: Vector<u16> = (0..200).collect();
    let b: Vector<u16> = (0..200).collect();
    assert_eq!(a, b);
    assert_eq!(hash_one(&a), hash_one(&b));
    let c = b.set(17, 9999).unwrap();
    assert_ne!(a, c);
}

#[test]
fn sorted_is_stable() {
    let v = pvector![(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd'), (1, 'e')];
    let sorted = v.sorted_by_key(|&(n, _)| n);
    let collected: Vec<_> = sorted.iter().copied().collect();
    assert_eq!(
        collected,
        [(1, 'b'), (1, 'e'), (2, 'd'), (3, 'a'), (3, 'c')]
    );
    // input untouched
    assert_eq!(v.get(0), Some(&(3, 'a')));
}

#[test]
fn sort_shuffled_input() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut items: Vec<u32> = (0..300).collect();
    items.shuffle(&mut rng);
    let v: Vector<u32> = items.into_iter().collect();
    let sorted = v.sorted();
    assert_eq!(
        sorted.iter().copied().collect::<Vec<_>>(),
        (0..300).collect::<Vec<_>>()
    );
}

#[test]
fn transient_builds_and_freezes() {
    let mut t = TransientVector::new();
    for i in 0..1000u32 {
        t.push(i).unwrap();
    }
    let v = t.persistent().unwrap();
    assert_eq!(v.len(), 1000);
    for i in 0..1000usize {
        assert_eq!(v.get(i), Some(&(i as u32)));
    }
    // The transient is dead after freezing.
    assert!(matches!(t.push(1), Err(Error::UseAfterFreeze)));
    assert!(matches!(t.set(0, 1), Err(Error::UseAfterFreeze)));
    assert!(matches!(t.pop(), Err(Error::UseAfterFreeze)));
    assert!(matches!(t.persistent(), Err(Error::UseAfterFreeze)));
}

#[test]
fn transient_mutation_does_not_leak_into_the_source() {
    let source: Vector<u32> = (0..600).collect();
    let mut t = source.to_transient();
    for i in 0..600 {
        t.set(i, 0).unwrap();
    }
    for _ in 0..100 {
        t.pop().unwrap();
    }
    let edited = t.persistent().unwrap();
    assert_eq!(edited.len(), 500);
    assert_eq!(edited.get(400), Some(&0));
    // source is unchanged
    assert_eq!(source.len(), 600);
    for i in 0..600usize {
        assert_eq!(source.get(i), Some(&(i as u32)));
    }
}

#[test]
fn transient_pop_to_empty_and_regrow() {
    let v: Vector<u8> = (0..40).collect();
    let mut t = v.to_transient();
    for _ in 0..40 {
        t.pop().unwrap();
    }
    assert!(t.is_empty());
    assert!(matches!(t.pop(), Err(Error::Empty)));
    t.push(7).unwrap();
    let rebuilt = t.persistent().unwrap();
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt.get(0), Some(&7));
}

#[test]
fn prim_vector_macro_and_conversions() {
    let ints = pvector_i64![1, 2, 3];
    assert_eq!(ints.len(), 3);
    assert_eq!(ints.get(2), Some(3));
    let ints = ints.push_f64(4.0).unwrap();
    assert_eq!(ints.get(3), Some(4));
    assert!(matches!(
        ints.push_f64(4.5),
        Err(Error::TypeMismatch { .. })
    ));
    // failed pushes leave the source unchanged
    assert_eq!(ints.len(), 4);
}

#[quickcheck]
fn qc_get_matches_insertion(items: Vec<u32>) -> bool {
    let v: Vector<u32> = items.iter().copied().collect();
    v.len() == items.len() && items.iter().enumerate().all(|(i, x)| v.get(i) == Some(x))
}

#[quickcheck]
fn qc_pop_inverts_push(items: Vec<u32>, extra: u32) -> bool {
    let v: Vector<u32> = items.iter().copied().collect();
    let popped = v.push(extra).pop().unwrap();
    popped == v
}

#[quickcheck]
fn qc_transient_round_trip(items: Vec<i16>) -> bool {
    let direct: Vector<i16> = items.iter().copied().collect();
    let mut t = TransientVector::new();
    for &x in &items {
        t.push(x).unwrap();
    }
    t.persistent().unwrap() == direct
}
