use chainops_client::payload::{contract_deploy, contract_state_change};
use chainops_client::PayloadSigner;
use chainops_crypto::{blake2b_256, payload_digest, Ed25519PayloadSigner};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn payload_digest_bench(c: &mut Criterion) {
    let payload = contract_state_change("chain1", "FREEZE_CONTRACT", "asset");

    c.bench_function("payload_digest_freeze", |b| {
        b.iter(|| payload_digest(black_box(&payload)))
    });
}

fn payload_digest_bytecode_bench(c: &mut Criterion) {
    let bytecode = vec![0xABu8; 64 * 1024];
    let payload = contract_deploy("chain1", "INIT_CONTRACT", "asset", "1.0", &bytecode, "WASMER", &[]);

    c.bench_function("payload_digest_64KB_bytecode", |b| {
        b.iter(|| payload_digest(black_box(&payload)))
    });
}

fn endorsement_bench(c: &mut Criterion) {
    let key = [7u8; 32];
    let payload = contract_state_change("chain1", "REVOKE_CONTRACT", "asset");

    c.bench_function("ed25519_endorse_payload", |b| {
        b.iter(|| Ed25519PayloadSigner.sign_payload("org1", &key, b"cert", black_box(&payload)))
    });
}

fn blake2b_256_1kb_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("blake2b_256_1KB", |b| {
        b.iter(|| blake2b_256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    payload_digest_bench,
    payload_digest_bytecode_bench,
    endorsement_bench,
    blake2b_256_1kb_bench,
);
criterion_main!(benches);
