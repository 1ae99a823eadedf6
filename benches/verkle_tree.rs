//! Verkle tree performance benchmarks.
//!
//! Measures the cost of the operations that dominate real workloads:
//!
//! - **Insertion + commit**: building a tree from random keys and computing
//!   the root commitment, which exercises leaf construction and the lazy
//!   internal-node commitment path.
//! - **Incremental re-commit**: a small batch of updates against an
//!   already-committed tree, which exercises the delta algebra.
//! - **Proof creation**: extracting openings and running the multipoint
//!   argument for a set of keys.
//!
//! ## Running benchmarks
//!
//! ```bash
//! cargo bench --bench verkle_tree
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use verkle::{Key, Node, VerkleProof};

fn gen_kvs(n: usize, rng: &mut StdRng) -> Vec<(Key, Vec<u8>)> {
    (0..n)
        .map(|_| (rng.gen::<Key>(), rng.gen::<[u8; 32]>().to_vec()))
        .collect()
}

fn insert_and_commit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let kvs = gen_kvs(1_000, &mut rng);

    c.bench_function("insert_commit_1k", |b| {
        b.iter(|| {
            let mut root = Node::new();
            for (key, value) in &kvs {
                root.insert(key, value.clone()).unwrap();
            }
            black_box(root.commit())
        })
    });
}

fn incremental_recommit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let kvs = gen_kvs(1_000, &mut rng);
    let updates = gen_kvs(16, &mut rng);

    let mut root = Node::new();
    for (key, value) in &kvs {
        root.insert(key, value.clone()).unwrap();
    }
    root.commit();

    c.bench_function("recommit_16_updates", |b| {
        b.iter(|| {
            let mut tree = root.clone();
            for (key, value) in &updates {
                tree.insert(key, value.clone()).unwrap();
            }
            black_box(tree.commit())
        })
    });
}

fn proof_creation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let kvs = gen_kvs(1_000, &mut rng);

    let mut root = Node::new();
    for (key, value) in &kvs {
        root.insert(key, value.clone()).unwrap();
    }
    root.commit();
    let keys: Vec<Key> = kvs.iter().take(32).map(|(key, _)| *key).collect();

    c.bench_function("prove_32_keys", |b| {
        b.iter(|| black_box(VerkleProof::create(&mut root, &keys).unwrap()))
    });
}

criterion_group!(
    benches,
    insert_and_commit,
    incremental_recommit,
    proof_creation
);
criterion_main!(benches);
