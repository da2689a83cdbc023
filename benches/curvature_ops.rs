//! Benchmarks for curvature analysis.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use curvmap::algo::subdivide::{loop_subdivide, SubdivideOptions};
use curvmap::algo::tensor::{CurvatureTensorField, TensorSmoothing};
use curvmap::prelude::*;

fn bench_mesh_construction(c: &mut Criterion) {
    let (positions, triangles) = primitives::icosphere(4).unwrap().to_triangle_soup();

    c.bench_function("build_icosphere_4", |b| {
        b.iter(|| Mesh::build(&positions, &triangles).unwrap());
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mesh = primitives::icosphere(4).unwrap();
    // Fill the angle cache outside the timed loop.
    mesh.angles();

    let mut group = c.benchmark_group("vertex_curvatures");
    for kind in [
        CurvatureKind::Gaussian,
        CurvatureKind::Mean,
        CurvatureKind::Horizon,
        CurvatureKind::Cone,
        CurvatureKind::PrincipalDeviation,
    ] {
        let label = format!("{:?}", kind);
        group.bench_with_input(BenchmarkId::new("parallel", &label), &kind, |b, &kind| {
            let options = AnalysisOptions::default();
            b.iter(|| vertex_curvatures(&mesh, kind, &options).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("sequential", &label), &kind, |b, &kind| {
            let options = AnalysisOptions::default().sequential();
            b.iter(|| vertex_curvatures(&mesh, kind, &options).unwrap());
        });
    }
    group.finish();
}

fn bench_tensor(c: &mut Criterion) {
    let mesh = primitives::torus(2.0, 0.5, 96, 48).unwrap();

    c.bench_function("tensor_field_torus", |b| {
        b.iter(|| CurvatureTensorField::compute(&mesh, &TensorSmoothing::default(), true).unwrap());
    });

    let smoothing = TensorSmoothing::default().with_iterations(5);
    c.bench_function("tensor_field_torus_smoothed", |b| {
        b.iter(|| CurvatureTensorField::compute(&mesh, &smoothing, true).unwrap());
    });
}

fn bench_subdivision(c: &mut Criterion) {
    let mesh = primitives::icosahedron().unwrap();

    c.bench_function("loop_subdivide_icosahedron_3", |b| {
        b.iter(|| loop_subdivide(&mesh, &SubdivideOptions::new(3)).unwrap());
    });
}

criterion_group!(benches, bench_mesh_construction, bench_dispatch, bench_tensor, bench_subdivision);
criterion_main!(benches);
