// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pcoll_vector::{TransientVector, Vector};

fn insert(c: &mut Criterion) {
    c.bench_function("push 10k persistent", |b| {
        b.iter(|| {
            let mut v = Vector::new();
            for i in 0..10_000u32 {
                v = v.push(black_box(i));
            }
            v
        })
    });

    c.bench_function("push 10k transient", |b| {
        b.iter(|| {
            let mut t = TransientVector::new();
            for i in 0..10_000u32 {
                t.push(black_box(i)).unwrap();
            }
            t.persistent().unwrap()
        })
    });
}

fn traverse(c: &mut Criterion) {
    let v: Vector<u32> = (0..10_000).collect();
    c.bench_function("iterate 10k", |b| {
        b.iter(|| v.iter().fold(0u64, |acc, &x| acc + x as u64))
    });
    c.bench_function("index 10k", |b| {
        b.iter(|| {
            let mut acc = 0u64;
            for i in 0..v.len() {
                acc += *v.get(black_box(i)).unwrap() as u64;
            }
            acc
        })
    });
}

criterion_group!(benches, insert, traverse);
criterion_main!(benches);
