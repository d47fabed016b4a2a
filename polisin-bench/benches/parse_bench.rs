//! Sentence analysis benchmarks: single hypothesis vs backtracking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polisin_automata::StackMachine;
use polisin_grammar::{CompiledGrammar, GrammarCompiler, GrammarLoader};
use polisin_syntax::{SyntacticAnalyser, Token};
use std::sync::Arc;

const GRAMMAR: &str = "\
S -> NP + VP
NP -> det + noun
NP -> det + adj + noun
NP -> pron
VP -> verb + NP
VP -> verb
";

fn compiled() -> CompiledGrammar {
    GrammarCompiler::compile(&GrammarLoader::parse_text(GRAMMAR).unwrap()).unwrap()
}

/// `det noun verb det adj noun`, with every word also offered as a wrong
/// category first when `ambiguous` is set.
fn sentence(ambiguous: bool) -> Vec<Vec<Token>> {
    let words = [
        ("the", "det"),
        ("dog", "noun"),
        ("saw", "verb"),
        ("a", "det"),
        ("small", "adj"),
        ("cat", "noun"),
    ];
    words
        .iter()
        .map(|(lexeme, category)| {
            let mut candidates = Vec::new();
            if ambiguous {
                candidates.push(Token::new("pron", *lexeme));
            }
            candidates.push(Token::new(*category, *lexeme));
            candidates
        })
        .collect()
}

fn bench_stack_machine(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack_machine");
    let grammar = compiled();
    let inputs = ["det", "noun", "verb", "det", "adj", "noun"];

    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.bench_function("execute", |b| {
        let mut machine = StackMachine::new(Arc::clone(grammar.machines()));
        b.iter(|| {
            machine.restart();
            black_box(machine.execute(inputs, &mut ()))
        });
    });

    group.finish();
}

fn bench_analyse(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyse");
    let grammar = compiled();

    let plain: Vec<Token> = sentence(false).into_iter().flatten().collect();
    group.bench_function("single", |b| {
        let mut analyser = SyntacticAnalyser::new(&grammar);
        b.iter(|| black_box(analyser.analyse_tokens(&plain).unwrap()));
    });

    for ambiguous in [false, true] {
        let positions = sentence(ambiguous);
        group.bench_with_input(
            BenchmarkId::new("backtracking", if ambiguous { "ambiguous" } else { "plain" }),
            &positions,
            |b, positions| {
                let mut analyser = SyntacticAnalyser::new(&grammar);
                b.iter(|| black_box(analyser.analyse_candidates(positions).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_stack_machine, bench_analyse);

criterion_main!(benches);
