use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tendroid_deform::{
    compute_batch, compute_batch_parallel, AnimationParameters, ComputationEngine, MemoryDocument,
    ShapeBatchDescriptor,
};
use tendroid_test_fixtures::scenes;

fn bench_kernel(c: &mut Criterion) {
    let scene = scenes::load("stress").expect("stress scene");
    let base = scene.base_vertices();
    let descriptor = ShapeBatchDescriptor::new(scene.shapes, scene.vertices_per_shape());
    let params = AnimationParameters::default().at(1.0);
    let mut out = vec![0.0; base.len()];

    let mut group = c.benchmark_group("batch_deform");
    group.bench_function("serial", |b| {
        b.iter(|| {
            compute_batch(black_box(&base), &mut out, &descriptor, black_box(&params)).unwrap()
        })
    });
    for workers in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parallel", workers), &workers, |b, &w| {
            b.iter(|| {
                compute_batch_parallel(black_box(&base), &mut out, &descriptor, &params, w)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let scene = scenes::load("stress").expect("stress scene");
    let base = scene.base_vertices();
    let vps = scene.vertices_per_shape();
    let descriptor = ShapeBatchDescriptor::new(scene.shapes, vps);

    let doc = MemoryDocument::new();
    for id in scene.identifiers() {
        doc.add_mesh(id, vec![[0.0; 3]; vps]);
    }
    let eng: ComputationEngine<MemoryDocument> = ComputationEngine::default();
    eng.attach(doc);
    eng.register_all(scene.identifiers());

    let mut out = vec![0.0; base.len()];
    let mut t = 0.0f32;
    c.bench_function("update_frame_64_tubes", |b| {
        b.iter(|| {
            t += 1.0 / 60.0;
            eng.update_frame(&base, &mut out, &descriptor, &AnimationParameters::default().at(t))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_kernel, bench_frame);
criterion_main!(benches);
