//! # ALN Pipeline Benchmarks
//!
//! | Stage | Crate |
//! |-------|-------|
//! | parse + validate chainlexeme text | aln-01 |
//! | conservation + limits | aln-02 |
//! | apply a block of transfers, state root | aln-03 |
//! | seal a block (tx root, header hash) | aln-04 |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::time::Duration;

use aln_01_chainlexeme::{parse, validate, Chainlexeme, DocumentBuilder};
use aln_02_safety::verify_all;
use aln_03_state_ledger::{Account, InMemoryKvStore, Ledger};
use aln_04_block_model::{Block, BlockHeader};
use shared_types::{Timestamp, ZERO_HASH};

const NOW: Timestamp = 1_700_000_000;

fn transfers(count: u64) -> Vec<Chainlexeme> {
    (0..count)
        .map(|nonce| {
            DocumentBuilder::transfer("aln1alice", "aln1bob", 1u64, nonce)
                .timestamp(NOW)
                .build_chainlexeme()
                .expect("builder output is valid")
        })
        .collect()
}

fn funded_ledger() -> Ledger<InMemoryKvStore> {
    let mut ledger = Ledger::new(InMemoryKvStore::new());
    ledger
        .set_account("aln1alice", &Account::new("aln1alice").with_balance(u64::MAX))
        .expect("in-memory write");
    ledger
}

fn bench_parse_and_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aln-01-chainlexeme");
    let text = DocumentBuilder::transfer("aln1alice", "aln1bob", 100u64, 0)
        .chat("chat-1", "transcript-1")
        .jurisdiction(&["EU", "GDPR"])
        .timestamp(NOW)
        .to_text();

    group.bench_function("parse_validate_convert", |b| {
        b.iter(|| {
            let doc = parse(black_box(&text));
            let report = validate(&doc);
            black_box(report.is_valid() && Chainlexeme::from_document(&doc).is_ok())
        })
    });
    group.finish();
}

fn bench_safety(c: &mut Criterion) {
    let mut group = c.benchmark_group("aln-02-safety");
    let tx = transfers(1).remove(0);

    group.bench_function("verify_all", |b| {
        b.iter(|| black_box(verify_all(black_box(&tx), NOW).is_valid()))
    });
    group.finish();
}

fn bench_apply_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("aln-03-state-ledger");
    group.measurement_time(Duration::from_secs(10));

    for size in [10u64, 100, 1000] {
        let txs = transfers(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("apply_block", size), &txs, |b, txs| {
            b.iter_batched(
                funded_ledger,
                |mut ledger| black_box(ledger.apply_block(txs).expect("in-memory commit")),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_seal_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("aln-04-block-model");
    let txs = transfers(1000);

    group.bench_function("finalize_1000_tx", |b| {
        b.iter_batched(
            || {
                let header = BlockHeader::new(1, NOW, ZERO_HASH, "bench".to_string());
                Block::new(header, txs.clone())
            },
            |mut block| black_box(block.finalize(ZERO_HASH).expect("fresh block")),
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_and_validate,
    bench_safety,
    bench_apply_block,
    bench_seal_block
);
criterion_main!(benches);
