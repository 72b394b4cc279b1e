use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nics_geometry::{circle, nearest, spherical, Coordinate};

fn ring(segments: usize) -> Vec<Coordinate> {
    circle::circle_to_polygon(Coordinate::new(34.05, -118.25), 2_500.0, segments)
}

fn benchmark_spherical_measurement(c: &mut Criterion) {
    let mut group = c.benchmark_group("spherical_measurement");

    for segments in [10, 40, 200] {
        let points = ring(segments);
        group.bench_with_input(BenchmarkId::new("distance", segments), &points, |b, points| {
            b.iter(|| spherical::distance(black_box(points)))
        });
        group.bench_with_input(BenchmarkId::new("area", segments), &points, |b, points| {
            b.iter(|| spherical::area(black_box(points)))
        });
    }

    group.finish();
}

fn benchmark_nearest_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_point");
    let query = Coordinate::new(34.06, -118.26);

    for segments in [10, 40, 200] {
        let points = ring(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &points, |b, points| {
            b.iter(|| nearest::find_nearest_point(black_box(query), black_box(points), true))
        });
    }

    group.finish();
}

fn benchmark_circle_sampling(c: &mut Criterion) {
    c.bench_function("circle_to_polygon_40", |b| {
        b.iter(|| {
            circle::circle_to_polygon(
                black_box(Coordinate::new(34.05, -118.25)),
                black_box(2_500.0),
                circle::DEFAULT_CIRCLE_SEGMENTS,
            )
        })
    });
}

criterion_group!(
    benches,
    benchmark_spherical_measurement,
    benchmark_nearest_point,
    benchmark_circle_sampling
);
criterion_main!(benches);
