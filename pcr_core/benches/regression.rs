use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pcr_core::regression::{efficiency, fit};
use pcr_core::{StandardCurvePoint, StandardCurveSet};

// Dilution series with a little deterministic jitter on Ct
fn series(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut state = 0x9E37_79B9u32;
    let mut jitter = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (f64::from(state) / f64::from(u32::MAX)) - 0.5
    };
    let x: Vec<f64> = (0..n).map(|i| -(i as f64) * 0.25).collect();
    let y: Vec<f64> = x.iter().map(|xi| -3.32 * xi + 15.0 + jitter()).collect();
    (x, y)
}

pub fn bench_fit(c: &mut Criterion) {
    let mut g = c.benchmark_group("regression");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(10));
        }
    }
    for n in [5usize, 31, 1000] {
        let (x, y) = series(n);
        g.bench_function(format!("fit_{n}"), |b| {
            b.iter(|| fit(black_box(&x), black_box(&y)));
        });
    }
    g.bench_function("efficiency", |b| b.iter(|| efficiency(black_box(-3.3219))));

    let (x, y) = series(12);
    let set = StandardCurveSet::from_points(
        x.iter()
            .zip(&y)
            .rev()
            .map(|(x, y)| StandardCurvePoint::new(*x, y.round() as i64))
            .collect(),
    );
    g.bench_function("analyze_12_points", |b| b.iter(|| black_box(&set).analyze()));
    g.finish();
}

criterion_group!(benches, bench_fit);
criterion_main!(benches);
