//! Grammar compilation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polisin_grammar::{GrammarCompiler, GrammarDefinition, GrammarLoader};

/// A grammar with `width` nonterminals, each with `width` productions
/// sharing a two-terminal prefix.
fn wide_grammar_text(width: usize) -> String {
    let mut text = String::new();
    for i in 0..width {
        for j in 0..width {
            let next = (i + 1) % width;
            text.push_str(&format!("N{} -> a + b + t{} + N{}\n", i, j, next));
        }
        text.push_str(&format!("N{} -> epsilon\n", i));
    }
    text
}

fn bench_parse_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar_load");

    for width in [4, 16, 64] {
        let text = wide_grammar_text(width);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("text", width), &text, |b, text| {
            b.iter(|| black_box(GrammarLoader::parse_text(text).unwrap()))
        });
    }

    let definition = serde_json::json!({
        "start": "S",
        "rules": [
            {"lhs": "S", "rhs": ["NP", "VP"]},
            {"lhs": "NP", "rhs": ["det", "noun"]},
            {"lhs": "NP", "rhs": ["det", "adj", "noun"]},
            {"lhs": "NP", "rhs": "pron"},
            {"lhs": "VP", "rhs": ["verb", "NP"]},
            {"lhs": "VP", "rhs": "verb"},
        ]
    });
    group.bench_function("json_definition", |b| {
        b.iter(|| {
            black_box(
                GrammarDefinition::from_json(definition.clone())
                    .unwrap()
                    .into_grammar()
                    .unwrap(),
            )
        })
    });

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar_compile");

    for width in [4, 16, 64] {
        let grammar = GrammarLoader::parse_text(&wide_grammar_text(width)).unwrap();
        group.throughput(Throughput::Elements(grammar.rules().len() as u64));
        group.bench_with_input(BenchmarkId::new("rules", width), &grammar, |b, grammar| {
            b.iter(|| black_box(GrammarCompiler::compile(grammar).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_text, bench_compile);

criterion_main!(benches);
