//! Criterion benchmarks for the CPU-side batching hot path.
//!
//! Measures the full per-frame pass (sort + accumulate + flush) against a
//! submitter that discards uploads, isolating the batcher from GPU cost.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use glam::Vec2;
use vesper_render::{
    Batcher2D, BatcherConfig, Color, CommandQueue, DrawSpace, FrameUniforms, TextureHandle,
};
use vesper_test_utils::NullSubmitter;

const TRI: [Vec2; 3] = [Vec2::ZERO, Vec2::X, Vec2::Y];
const UVS: [Vec2; 3] = [Vec2::ZERO, Vec2::X, Vec2::ONE];

fn fill_queue(queue: &mut CommandQueue, n: usize) {
    for i in 0..n {
        let depth = ((i * 37) % 101) as f32 - 50.0;
        let layer = (i % 3) as i32;
        if i % 4 == 0 {
            queue.push_textured(
                layer,
                depth,
                DrawSpace::World,
                TRI,
                UVS,
                TextureHandle::from_raw((i % 6) as u64 + 1),
            );
        } else {
            queue.push_colored(layer, depth, DrawSpace::World, TRI, Color::WHITE);
        }
    }
}

fn bench_run_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_frame");
    for &n in &[1_000usize, 10_000] {
        group.bench_function(format!("{}_commands", n), |b| {
            let mut batcher = Batcher2D::new(BatcherConfig::default()).unwrap();
            let mut gpu = NullSubmitter;
            let uniforms = FrameUniforms::default();
            b.iter_batched(
                || {
                    let mut queue = CommandQueue::new();
                    fill_queue(&mut queue, n);
                    queue
                },
                |mut queue| {
                    batcher.run_frame(&mut queue, &uniforms, &mut gpu).unwrap();
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_run_frame);
criterion_main!(benches);
