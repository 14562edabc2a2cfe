use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evalexpr::{build_operator_tree, DefaultNumericTypes};
use formulix_rs::Expression;

const NO_LOCALS: &[f64] = &[];

/// Benchmark simple arithmetic expressions
fn benchmark_simple_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simple arithmetic Expression Evaluation");

    let expr = "2 + 3 * 4";
    let compiled = Expression::lax(expr);
    compiled.parse().unwrap();
    let precompiled_evalexpr = build_operator_tree::<DefaultNumericTypes>(expr).unwrap();

    group.bench_function("compiled_arithmetic", |b| {
        b.iter(|| Expression::lax(black_box(expr)).execute_with(NO_LOCALS).unwrap())
    });

    group.bench_function("precompiled_arithmetic", |b| {
        b.iter(|| compiled.execute_with(black_box(NO_LOCALS)).unwrap())
    });

    group.bench_function("native_rust_arithmetic", |b| {
        b.iter(|| black_box(2.0 + 3.0 * 4.0))
    });

    group.bench_function("meval_arithmetic", |b| {
        b.iter(|| meval::eval_str(black_box(expr)).unwrap())
    });

    group.bench_function("evalexpr_arithmetic", |b| {
        b.iter(|| evalexpr::eval(black_box(expr)).unwrap())
    });

    group.bench_function("precompiled_evalexpr_arithmetic", |b| {
        b.iter(|| precompiled_evalexpr.eval().unwrap())
    });
}

/// Benchmark complex arithmetic expressions
fn benchmark_complex_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Complex arithmetic Expression Evaluation");

    let expr = "(10 + 20) * 3 / (4 - 1) + 5";
    let compiled = Expression::lax(expr);
    compiled.parse().unwrap();
    let precompiled_evalexpr = build_operator_tree::<DefaultNumericTypes>(expr).unwrap();

    group.bench_function("compiled_complex_arithmetic", |b| {
        b.iter(|| Expression::lax(black_box(expr)).execute_with(NO_LOCALS).unwrap())
    });

    group.bench_function("precompiled_complex_arithmetic", |b| {
        b.iter(|| compiled.execute_with(black_box(NO_LOCALS)).unwrap())
    });

    group.bench_function("native_rust_complex_arithmetic", |b| {
        b.iter(|| black_box((10.0 + 20.0) * 3.0 / (4.0 - 1.0) + 5.0))
    });

    group.bench_function("meval_arithmetic", |b| {
        b.iter(|| meval::eval_str(black_box(expr)).unwrap())
    });

    group.bench_function("evalexpr_arithmetic", |b| {
        b.iter(|| evalexpr::eval(black_box(expr)).unwrap())
    });

    group.bench_function("precompiled_evalexpr_arithmetic", |b| {
        b.iter(|| precompiled_evalexpr.eval().unwrap())
    });
}

/// Benchmark logical expressions
fn benchmark_logic_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logic Expression Evaluation");

    let expr = "1 < 2 and 3 > 4 or 5 >= 5";
    let compiled = Expression::lax(expr);
    compiled.parse().unwrap();

    group.bench_function("compiled_logic_expression", |b| {
        b.iter(|| Expression::lax(black_box(expr)).execute_with(NO_LOCALS).unwrap())
    });

    group.bench_function("precompiled_logic_expression", |b| {
        b.iter(|| compiled.execute_with(black_box(NO_LOCALS)).unwrap())
    });

    group.bench_function("native_rust_logic_expression", |b| {
        b.iter(|| black_box(1.0 < 2.0 && 3.0 > 4.0 || 5.0 >= 5.0))
    });
}

/// Benchmark variable binding against a single-argument formula
fn benchmark_variables(c: &mut Criterion) {
    let mut group = c.benchmark_group("Variable Evaluation");

    let expr = "x^2 + 3*x - sin(x)";
    let compiled = Expression::lax(expr);
    compiled.parse().unwrap();
    let meval_fn = expr.parse::<meval::Expr>().unwrap().bind("x").unwrap();

    group.bench_function("precompiled_variables", |b| {
        b.iter(|| compiled.evaluate(black_box(1.7), 0.0).unwrap())
    });

    group.bench_function("meval_bound_variables", |b| {
        b.iter(|| meval_fn(black_box(1.7)))
    });

    group.bench_function("native_rust_variables", |b| {
        b.iter(|| {
            let x: f64 = black_box(1.7);
            x.powf(2.0) + 3.0 * x - x.sin()
        })
    });
}

/// Benchmark function calls and the lookup table fast path
fn benchmark_function_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("Function Call Evaluation");

    let expr = "polygon(x, 0,0, 10,5, 20,30, 40,35) * sigmoid(x/40, 0, 2, 8) + exp(-x/10)";
    let exact = Expression::lax(expr);
    exact.parse().unwrap();
    let mut linearized = Expression::lax(expr);
    linearized.linearize_1d(0.0, 40.0, 1000).unwrap();

    group.bench_function("precompiled_function_call", |b| {
        b.iter(|| exact.evaluate(black_box(17.3), 0.0).unwrap())
    });

    group.bench_function("linearized_function_call", |b| {
        b.iter(|| linearized.evaluate(black_box(17.3), 0.0).unwrap())
    });

    let frames: Vec<Vec<f64>> = (0..10_000).map(|i| vec![i as f64 / 250.0]).collect();
    group.bench_function("batch_function_call", |b| {
        b.iter(|| exact.execute_batch(black_box(&frames)).unwrap())
    });
}

/// Grouping benchmarks
criterion_group!(
    benches,
    benchmark_simple_arithmetic,
    benchmark_complex_arithmetic,
    benchmark_logic_expressions,
    benchmark_variables,
    benchmark_function_calls,
);
criterion_main!(benches);
