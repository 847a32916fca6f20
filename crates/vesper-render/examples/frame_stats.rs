//! Headless batching demo: queue a small mixed scene, run one frame against
//! a recording submitter, and log what the GPU would have received.
//!
//! Run with: `cargo run -p vesper-render --example frame_stats`

use glam::Vec2;
use vesper_core::logging;
use vesper_render::{
    Batcher2D, BatcherConfig, Color, CommandQueue, DrawSpace, FrameUniforms, TextureHandle,
};
use vesper_test_utils::RecordingSubmitter;

fn main() {
    logging::init();

    let mut batcher = Batcher2D::new(BatcherConfig {
        capacity: 12,
        max_texture_units: 2,
    })
    .expect("valid config");

    let mut queue = CommandQueue::new();
    let sprite_a = TextureHandle::from_raw(1);
    let sprite_b = TextureHandle::from_raw(2);
    let sprite_c = TextureHandle::from_raw(3);

    // World-space scene content, back to front via depth.
    queue.push_rect(
        0,
        0.0,
        DrawSpace::World,
        Vec2::new(-100.0, -100.0),
        Vec2::new(100.0, 100.0),
        Color::from_hex(0x203040),
    );
    queue.push_textured_rect(
        0,
        1.0,
        DrawSpace::World,
        Vec2::new(-16.0, -16.0),
        Vec2::new(16.0, 16.0),
        Vec2::ZERO,
        Vec2::ONE,
        sprite_a,
    );
    queue.push_textured_rect(
        0,
        2.0,
        DrawSpace::World,
        Vec2::new(8.0, 8.0),
        Vec2::new(40.0, 40.0),
        Vec2::ZERO,
        Vec2::ONE,
        sprite_b,
    );
    // A third texture forces a flush with only two units per batch.
    queue.push_textured_rect(
        0,
        3.0,
        DrawSpace::World,
        Vec2::new(-40.0, 20.0),
        Vec2::new(-8.0, 52.0),
        Vec2::ZERO,
        Vec2::ONE,
        sprite_c,
    );
    // Screen-space UI on a higher layer.
    queue.push_rect(
        1,
        0.0,
        DrawSpace::Screen,
        Vec2::new(8.0, 8.0),
        Vec2::new(120.0, 32.0),
        Color::rgba(0.0, 0.0, 0.0, 0.5),
    );

    let uniforms = FrameUniforms {
        viewport: Vec2::new(1280.0, 720.0),
        ..Default::default()
    };

    let mut gpu = RecordingSubmitter::new();
    let stats = batcher
        .run_frame(&mut queue, &uniforms, &mut gpu)
        .expect("recording submitter never fails");

    tracing::info!(
        draw_calls = stats.draw_calls,
        commands = stats.command_count,
        vertices = stats.vertex_count,
        "frame complete"
    );
    for (i, batch) in gpu.batches().iter().enumerate() {
        tracing::info!(
            batch = i,
            vertices = batch.vertex_count(),
            textures = batch.textures.len(),
            "draw call"
        );
    }
}
