//! Merkle Commitment Performance Benchmarks
//!
//! Measures the cost of the Poseidon-backed commitment engine:
//! - Tree construction over attribute bundles of varying size
//! - Decommitment path extraction
//! - Proof verification
//! - Raw `combine` throughput

use credroot_core::{combine, AttributeValue, FieldElement, HashDomain, MerkleConfig, MerkleTree};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate a text attribute for the given position
fn generate_attribute(index: u64) -> AttributeValue {
    AttributeValue::Text(format!("attr-{:08}", index))
}

fn build_tree(size: u64) -> MerkleTree {
    let values: Vec<AttributeValue> = (0..size).map(generate_attribute).collect();
    MerkleTree::construct(&values, &MerkleConfig::default()).unwrap()
}

/// Benchmark: Tree construction with varying bundle sizes
fn bench_tree_construct(c: &mut Criterion) {
    for size in [8u64, 64, 512] {
        let values: Vec<AttributeValue> = (0..size).map(generate_attribute).collect();
        c.bench_with_input(BenchmarkId::new("tree_construct", size), &size, |b, _| {
            b.iter(|| black_box(MerkleTree::construct(&values, &MerkleConfig::default()).unwrap()));
        });
    }
}

/// Benchmark: Decommitment path for a middle leaf
fn bench_decommitment_path(c: &mut Criterion) {
    for size in [64u64, 512] {
        let tree = build_tree(size);
        c.bench_with_input(BenchmarkId::new("decommitment_path", size), &size, |b, _| {
            b.iter(|| black_box(tree.decommitment_path((size / 2) as usize).unwrap()));
        });
    }
}

/// Benchmark: Proof verification
fn bench_verify_proof(c: &mut Criterion) {
    let tree = build_tree(100);
    let proof = tree.inclusion_proof(50).unwrap();

    c.bench_function("verify_proof", |b| {
        b.iter(|| black_box(proof.verify(&HashDomain::Untagged).unwrap()))
    });
}

/// Benchmark: Two-input Poseidon compression
fn bench_combine(c: &mut Criterion) {
    let left = FieldElement::from(12345u64);
    let right = FieldElement::from(67890u64);

    c.bench_function("poseidon_combine", |b| {
        b.iter(|| black_box(combine(left, right).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_tree_construct,
    bench_decommitment_path,
    bench_verify_proof,
    bench_combine,
);

criterion_main!(benches);
