//! Benchmarks for forward chaining and cascading retraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use akh_chain::entity::Rule;
use akh_chain::kb::KnowledgeBase;
use akh_chain::term::Statement;

const CHAIN: usize = 50;

fn st(pred: &str, tokens: &[&str]) -> Statement {
    Statement::from_tokens(pred, tokens)
}

/// Rules `(p0 ?x) -> (p1 ?x)`, `(p1 ?x) -> (p2 ?x)`, ...
fn chain_kb() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new();
    for i in 0..CHAIN {
        kb.assert(Rule::new(
            vec![st(&format!("p{i}"), &["?x"])],
            st(&format!("p{}", i + 1), &["?x"]),
        ));
    }
    kb
}

fn bench_chain_derivation(c: &mut Criterion) {
    c.bench_function("derive_chain_50", |bench| {
        bench.iter_batched(
            chain_kb,
            |mut kb| {
                kb.assert(st("p0", &["a"]));
                black_box(kb.fact_count())
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_transitive_closure(c: &mut Criterion) {
    c.bench_function("transitive_closure_20", |bench| {
        bench.iter(|| {
            let mut kb = KnowledgeBase::new();
            kb.assert(Rule::new(
                vec![st("edge", &["?x", "?y"]), st("path", &["?y", "?z"])],
                st("path", &["?x", "?z"]),
            ));
            kb.assert(Rule::new(vec![st("edge", &["?x", "?y"])], st("path", &["?x", "?y"])));
            for i in 0..20 {
                kb.assert(st("edge", &[&format!("n{i}"), &format!("n{}", i + 1)]));
            }
            black_box(kb.fact_count())
        })
    });
}

fn bench_cascade_retraction(c: &mut Criterion) {
    c.bench_function("retract_chain_50", |bench| {
        bench.iter_batched(
            || {
                let mut kb = chain_kb();
                kb.assert(st("p0", &["a"]));
                kb
            },
            |mut kb| black_box(kb.retract(&st("p0", &["a"]))),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_chain_derivation,
    bench_transitive_closure,
    bench_cascade_retraction
);
criterion_main!(benches);
