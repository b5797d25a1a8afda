//! Benchmarks for random forest training and inference.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vitalis::prelude::*;

fn health_table(size: usize) -> (Matrix<f64>, Vec<usize>) {
    let mut data = Vec::with_capacity(size * 2);
    let mut labels = Vec::with_capacity(size);
    for i in 0..size {
        let hr = i as f64 / size as f64;
        let activity = ((i * 37) % size) as f64 / size as f64;
        data.push(hr);
        data.push(activity);
        labels.push(usize::from(hr + 0.3 * activity > 0.6));
    }
    let x = Matrix::from_vec(size, 2, data).expect("valid shape");
    (x, labels)
}

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest_fit");

    for size in [100, 500, 1000].iter() {
        let (x, y) = health_table(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut forest = RandomForestClassifier::new(50).with_seed(42);
                forest.fit(black_box(&x), black_box(&y)).expect("fit succeeds");
                forest
            });
        });
    }

    group.finish();
}

fn bench_forest_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest_predict");

    for size in [100, 500, 1000].iter() {
        let (x, y) = health_table(*size);
        let mut forest = RandomForestClassifier::new(50).with_seed(42);
        forest.fit(&x, &y).expect("fit succeeds");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| forest.predict(black_box(&x)).expect("predict succeeds"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forest_fit, bench_forest_predict);
criterion_main!(benches);
