// Build pipeline benchmarks.
//
// Covers entry id hashing, graph mapping, fee estimation, and full
// signed builds at various input counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use btm_offline::config::{FeeSchedule, FEE_ASSET_ID};
use btm_offline::crypto::hash::Hash;
use btm_offline::crypto::keys::Keypair;
use btm_offline::transaction::fee::estimate_fee;
use btm_offline::transaction::{
    map_transaction, Input, KeyRing, Output, SpendInput, TransactionBuilder,
};

fn spends(owner: &Keypair, count: usize) -> Vec<Input> {
    (0..count)
        .map(|i| {
            Input::Spend(SpendInput {
                source_id: Hash::digest(&(i as u64).to_le_bytes()),
                source_position: i as u64,
                asset_id: FEE_ASSET_ID,
                amount: 10_000_000,
                control_program: owner.p2wpkh_program(),
                vm_version: 1,
            })
        })
        .collect()
}

fn bench_map_transaction(c: &mut Criterion) {
    let owner = Keypair::from_seed(&[1u8; 32]);
    let mut group = c.benchmark_group("graph/map_transaction");

    for count in [1usize, 10, 100] {
        let inputs = spends(&owner, count);
        let outputs = vec![Output::fee_asset(
            10_000_000 * count as u64,
            owner.p2wpkh_program(),
        )];
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &inputs, |b, inputs| {
            b.iter(|| map_transaction(1, 0, inputs, &outputs).unwrap());
        });
    }
    group.finish();
}

fn bench_estimate_fee(c: &mut Criterion) {
    let owner = Keypair::from_seed(&[2u8; 32]);
    let inputs = spends(&owner, 10);
    let schedule = FeeSchedule::default();

    c.bench_function("fee/estimate_10_inputs", |b| {
        b.iter(|| estimate_fee(1, 0, &inputs, &[], &owner.p2wpkh_program(), &schedule).unwrap());
    });
}

fn bench_full_build(c: &mut Criterion) {
    let owner = Keypair::from_seed(&[3u8; 32]);
    let keys: KeyRing = std::iter::once(owner.clone()).collect();
    let schedule = FeeSchedule::default();
    let change = owner.p2wpkh_program();
    let mut group = c.benchmark_group("builder/build_signed");

    for count in [1usize, 10, 50] {
        let inputs = spends(&owner, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &inputs, |b, inputs| {
            b.iter(|| {
                TransactionBuilder::new()
                    .add_inputs(inputs.iter().cloned())
                    .build(&change, &keys, &schedule)
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_map_transaction,
    bench_estimate_fee,
    bench_full_build
);
criterion_main!(benches);
