use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tigermdp::discrete_dp::random::{RandomDp, RandomDpSpec};
use tigermdp::{NoiseModel, Payoffs, SolveMethod, SolverOptions, TigerProblem};

fn random_draw() -> RandomDp {
    let spec = RandomDpSpec {
        num_states: 200,
        num_actions: 10,
        support: 5,
        ..RandomDpSpec::default()
    };
    RandomDp::generate(spec).unwrap()
}

fn representation_benchmark(c: &mut Criterion) {
    let draw = random_draw();
    let product = draw.dense_product().unwrap();
    let dense = draw.dense_state_action().unwrap();
    let sparse = draw.sparse_state_action().unwrap();
    let options = SolverOptions::default();

    let mut group = c.benchmark_group("policy iteration");
    group.bench_function("dense product", |b| {
        b.iter(|| product.solve(black_box(SolveMethod::PolicyIteration), &options).unwrap())
    });
    group.bench_function("dense state-action", |b| {
        b.iter(|| dense.solve(black_box(SolveMethod::PolicyIteration), &options).unwrap())
    });
    group.bench_function("sparse state-action", |b| {
        b.iter(|| sparse.solve(black_box(SolveMethod::PolicyIteration), &options).unwrap())
    });
    group.finish();
}

fn tiger_benchmark(c: &mut Criterion) {
    let problem = TigerProblem::uniform(5001, NoiseModel::default(), Payoffs::default(), 0.95).unwrap();
    c.bench_function("tiger assembly", |b| b.iter(|| black_box(&problem).descriptor().unwrap()));

    let dp = problem.descriptor().unwrap();
    let mut group = c.benchmark_group("tiger solve");
    group.sample_size(10);
    for method in SolveMethod::all(20) {
        group.bench_function(method.name(), |b| b.iter(|| dp.solve(method, &SolverOptions::default()).unwrap()));
    }
    group.finish();
}

criterion_group!(benches, representation_benchmark, tiger_benchmark);
criterion_main!(benches);
