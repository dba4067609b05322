use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use rust_ggp::core::{Atom, JointMove, Literal, Move, Role, Rule, Term};
use rust_ggp::games::{ballot, counter};
use rust_ggp::rules::{Interpreter, RulesEngine, Ruleset};

/// A chain of `n` edges: the closure has n(n+1)/2 facts.
fn chain_rules(n: u32) -> Vec<Rule> {
    let node = |i: u32| Term::constant(format!("n{i}"));
    let var = Term::var;
    let mut rules: Vec<Rule> = (0..n)
        .map(|i| Rule::fact(Atom::new("edge", vec![node(i), node(i + 1)])))
        .collect();
    rules.push(Rule::new(
        Atom::new("path", vec![var("X"), var("Y")]),
        vec![Literal::pos("edge", vec![var("X"), var("Y")])],
    ));
    rules.push(Rule::new(
        Atom::new("path", vec![var("X"), var("Y")]),
        vec![
            Literal::pos("path", vec![var("X"), var("Z")]),
            Literal::pos("edge", vec![var("Z"), var("Y")]),
        ],
    ));
    rules
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate/closure");
    for n in [16u32, 64, 128] {
        let ruleset = Ruleset::load(chain_rules(n)).expect("chain rules load");
        group.bench_with_input(BenchmarkId::from_parameter(n), &ruleset, |b, ruleset| {
            b.iter(|| black_box(ruleset.evaluate(Vec::new(), &["path"])));
        });
    }
    group.finish();
}

fn bench_ply(c: &mut Criterion) {
    let counter = Interpreter::from_rules(counter::rules(50)).expect("counter loads");
    let state = counter.init_state();
    let joint = JointMove::new().with(
        Role::new("first"),
        Move::new(Term::compound("take", vec![Term::int(1)])),
    );
    c.bench_function("evaluate/counter_analyze", |b| {
        b.iter(|| black_box(counter.analyze(black_box(&state))));
    });
    c.bench_function("evaluate/counter_next", |b| {
        b.iter(|| black_box(counter.next_state(black_box(&state), &joint)));
    });

    let ballot = Interpreter::from_rules(ballot::rules(32)).expect("ballot loads");
    let state = ballot.init_state();
    c.bench_function("evaluate/ballot32_analyze", |b| {
        b.iter(|| black_box(ballot.analyze(black_box(&state))));
    });
}

criterion_group!(benches, bench_closure, bench_ply);
criterion_main!(benches);
