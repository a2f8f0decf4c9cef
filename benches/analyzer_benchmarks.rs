//! Performance benchmarks for analyzing synthetic projects.
//!
//! - Chain depth: scripts extending each other by path, analyzed from the leaf
//! - Class width: one script with many functions doing arithmetic on locals
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use orchestrator::parser::BinaryOp;
use orchestrator::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn script_path(index: usize) -> String {
    format!("res://chain/level_{index}.os")
}

/// `level_{index}.os`, extending the previous level and adding `functions`
/// arithmetic functions.
fn synthetic_script(index: usize, functions: usize) -> ScriptParser {
    let mut b = TreeBuilder::new(script_path(index));
    if index == 0 {
        b.extends(&["Node"]);
    } else {
        b.extends_path(&script_path(index - 1));
    }

    for f in 0..functions {
        let int = b.ty("int");
        let param = b.ty("int");
        let seed = b.lit(f as i64);
        let read_value = b.ident("value");
        let read_seed = b.ident("seed");
        let sum = b.binary(BinaryOp::Add, read_value, read_seed);
        let two = b.lit(2);
        let doubled = b.binary(BinaryOp::Mul, sum, two);
        let name = format!("step_{index}_{f}");
        let body = b.suite_of(|b| {
            vec![
                b.local_var(VarDecl::new("seed").typed(int).init(seed)),
                b.ret(Some(doubled)),
            ]
        });
        let returns = b.ty("int");
        b.function(
            FuncDecl::new(name)
                .param(ParamDecl::new("value").typed(param))
                .returns(returns)
                .body(body),
        );
    }
    b.build()
}

fn chain_project(depth: usize) -> (Project, ParserId) {
    let mut scripts = MemoryScriptCache::new();
    for index in 0..depth.saturating_sub(1) {
        scripts.insert_source(synthetic_script(index, 4));
    }
    let host = Host::standard().with_scripts(scripts);
    let mut project = Project::new(host, AnalyzerConfig::default());
    let leaf = project.add_script(synthetic_script(depth.saturating_sub(1), 4));
    (project, leaf)
}

fn chain_depth_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("analyzer/chain_depth");
    for depth in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || chain_project(depth),
                |(mut project, leaf)| {
                    let result = project.analyze(leaf);
                    end_profiling_frame();
                    black_box(result)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn class_width_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("analyzer/class_width");
    for functions in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(functions), &functions, |b, &functions| {
            b.iter_batched(
                || synthetic_script(0, functions),
                |script| {
                    let mut project = Project::default();
                    let id = project.add_script(script);
                    let result = project.analyze(id);
                    end_profiling_frame();
                    black_box(result)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, chain_depth_benchmarks, class_width_benchmarks);
criterion_main!(benches);
