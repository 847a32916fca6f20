//! Draw commands and the per-frame command queue.
//!
//! Upstream renderers (scene traversal, UI, debug overlays) push triangles
//! into a [`CommandQueue`] in any order. Once all of a frame's commands are
//! in, [`CommandQueue::drain_sorted`] hands them back ordered by
//! `(layer, depth)` so a single linear pass over the result draws the frame
//! with correct layering.

use glam::Vec2;

use crate::color::Color;
use crate::texture::TextureHandle;

/// Coordinate space a command's vertices are expressed in.
///
/// The flag travels per-vertex into the attribute stream; the vertex shader
/// applies the camera transform to world-space vertices and a plain
/// pixels-to-clip mapping to screen-space ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawSpace {
    /// Camera-relative coordinates.
    World,
    /// Device-relative coordinates (UI, overlays).
    Screen,
}

impl DrawSpace {
    pub(crate) fn flag(self) -> f32 {
        match self {
            DrawSpace::World => 0.0,
            DrawSpace::Screen => 1.0,
        }
    }
}

/// Payload of a draw command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandPayload {
    /// One color applied to all three vertices.
    Colored { color: Color },
    /// A texture sampled with per-vertex UVs.
    Textured {
        texture: TextureHandle,
        uvs: [Vec2; 3],
    },
}

/// One immutable triangle queued for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Coarse ordering group (e.g. world pass vs. screen-space UI).
    pub layer: i32,
    /// Fine ordering value within a layer.
    pub depth: f32,
    pub space: DrawSpace,
    /// Untransformed corner positions.
    pub vertices: [Vec2; 3],
    pub payload: CommandPayload,
}

/// Unordered collection of the frame's draw commands.
///
/// Producers must finish pushing before the frame's batching pass drains the
/// queue; the `&mut self` receivers make a concurrent push/drain
/// unrepresentable.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<DrawCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append a command.
    ///
    /// Returns `false` (and drops the command) when a colored command is
    /// fully transparent: it would cost a draw without touching a pixel.
    pub fn push(&mut self, cmd: DrawCommand) -> bool {
        if let CommandPayload::Colored { color } = &cmd.payload {
            if color.a <= 0.0 {
                return false;
            }
        }
        self.commands.push(cmd);
        true
    }

    /// Queue one flat-colored triangle.
    pub fn push_colored(
        &mut self,
        layer: i32,
        depth: f32,
        space: DrawSpace,
        vertices: [Vec2; 3],
        color: Color,
    ) -> bool {
        self.push(DrawCommand {
            layer,
            depth,
            space,
            vertices,
            payload: CommandPayload::Colored { color },
        })
    }

    /// Queue one textured triangle.
    pub fn push_textured(
        &mut self,
        layer: i32,
        depth: f32,
        space: DrawSpace,
        vertices: [Vec2; 3],
        uvs: [Vec2; 3],
        texture: TextureHandle,
    ) -> bool {
        self.push(DrawCommand {
            layer,
            depth,
            space,
            vertices,
            payload: CommandPayload::Textured { texture, uvs },
        })
    }

    /// Queue an axis-aligned rectangle as two triangles sharing one key.
    pub fn push_rect(
        &mut self,
        layer: i32,
        depth: f32,
        space: DrawSpace,
        min: Vec2,
        max: Vec2,
        color: Color,
    ) -> bool {
        let (a, b) = rect_triangles(min, max);
        // Both triangles share the color: either both enqueue or neither.
        self.push_colored(layer, depth, space, a, color)
            && self.push_colored(layer, depth, space, b, color)
    }

    /// Queue a textured axis-aligned rectangle as two triangles.
    pub fn push_textured_rect(
        &mut self,
        layer: i32,
        depth: f32,
        space: DrawSpace,
        min: Vec2,
        max: Vec2,
        uv_min: Vec2,
        uv_max: Vec2,
        texture: TextureHandle,
    ) -> bool {
        let (a, b) = rect_triangles(min, max);
        let (uv_a, uv_b) = rect_triangles(uv_min, uv_max);
        self.push_textured(layer, depth, space, a, uv_a, texture)
            && self.push_textured(layer, depth, space, b, uv_b, texture)
    }

    /// Sort the queued commands ascending by `(layer, depth)` key, clear the
    /// queue, and return them for one-time consumption.
    ///
    /// The key is `layer + normalize(depth)` where `normalize` maps depth
    /// into the unit interval using the frame's observed depth range, so
    /// depth never reorders commands across layer boundaries. Commands with
    /// equal keys keep no particular relative order.
    pub fn drain_sorted(&mut self) -> Vec<DrawCommand> {
        let mut commands = std::mem::take(&mut self.commands);
        if commands.len() < 2 {
            return commands;
        }

        let mut min_depth = f32::INFINITY;
        let mut max_depth = f32::NEG_INFINITY;
        for cmd in &commands {
            min_depth = min_depth.min(cmd.depth);
            max_depth = max_depth.max(cmd.depth);
        }
        let depth_offset = (-min_depth).max(0.0);
        let depth_range = max_depth + depth_offset;

        commands.sort_unstable_by(|a, b| {
            sort_key(a, depth_offset, depth_range).total_cmp(&sort_key(b, depth_offset, depth_range))
        });
        commands
    }
}

/// Frame-local sort key. `depth_range == 0` means every queued depth is
/// identical after offsetting; all of those keys tie.
fn sort_key(cmd: &DrawCommand, depth_offset: f32, depth_range: f32) -> f32 {
    let normalized = if depth_range > 0.0 {
        (cmd.depth + depth_offset) / depth_range
    } else {
        0.0
    };
    cmd.layer as f32 + normalized
}

fn rect_triangles(min: Vec2, max: Vec2) -> ([Vec2; 3], [Vec2; 3]) {
    let tl = Vec2::new(min.x, min.y);
    let tr = Vec2::new(max.x, min.y);
    let bl = Vec2::new(min.x, max.y);
    let br = Vec2::new(max.x, max.y);
    ([tl, tr, bl], [tr, br, bl])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> [Vec2; 3] {
        [Vec2::ZERO, Vec2::X, Vec2::Y]
    }

    fn depth_of(cmd: &DrawCommand) -> f32 {
        cmd.depth
    }

    #[test]
    fn transparent_colored_commands_are_dropped() {
        let mut queue = CommandQueue::new();
        assert!(!queue.push_colored(0, 0.0, DrawSpace::World, tri(), Color::TRANSPARENT));
        assert!(queue.is_empty());

        assert!(queue.push_colored(0, 0.0, DrawSpace::World, tri(), Color::RED));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn transparent_textured_commands_are_kept() {
        // The drop rule is about colors; textures carry their own alpha.
        let mut queue = CommandQueue::new();
        assert!(queue.push_textured(
            0,
            0.0,
            DrawSpace::World,
            tri(),
            tri(),
            TextureHandle::from_raw(7),
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_sorts_by_depth_within_a_layer() {
        let mut queue = CommandQueue::new();
        for depth in [1.0, -1.0, 0.0] {
            queue.push_colored(0, depth, DrawSpace::World, tri(), Color::WHITE);
        }

        let drained = queue.drain_sorted();
        let depths: Vec<f32> = drained.iter().map(depth_of).collect();
        assert_eq!(depths, vec![-1.0, 0.0, 1.0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_orders_layers_before_depth() {
        let mut queue = CommandQueue::new();
        queue.push_colored(0, 3.0, DrawSpace::World, tri(), Color::WHITE);
        queue.push_colored(0, 1.0, DrawSpace::World, tri(), Color::WHITE);
        queue.push_colored(1, 2.0, DrawSpace::Screen, tri(), Color::WHITE);
        queue.push_colored(1, 4.0, DrawSpace::Screen, tri(), Color::WHITE);

        let drained = queue.drain_sorted();
        let keys: Vec<(i32, f32)> = drained.iter().map(|c| (c.layer, c.depth)).collect();
        assert_eq!(keys, vec![(0, 1.0), (0, 3.0), (1, 2.0), (1, 4.0)]);
    }

    #[test]
    fn negative_depths_stay_inside_their_layer() {
        let mut queue = CommandQueue::new();
        queue.push_colored(1, 0.5, DrawSpace::World, tri(), Color::WHITE);
        queue.push_colored(0, -8.0, DrawSpace::World, tri(), Color::WHITE);
        queue.push_colored(0, -2.0, DrawSpace::World, tri(), Color::WHITE);

        let drained = queue.drain_sorted();
        let keys: Vec<(i32, f32)> = drained.iter().map(|c| (c.layer, c.depth)).collect();
        assert_eq!(keys, vec![(0, -8.0), (0, -2.0), (1, 0.5)]);
    }

    #[test]
    fn equal_depths_do_not_panic() {
        let mut queue = CommandQueue::new();
        for _ in 0..4 {
            queue.push_colored(2, 7.0, DrawSpace::World, tri(), Color::WHITE);
        }
        let drained = queue.drain_sorted();
        assert_eq!(drained.len(), 4);
        assert!(drained.iter().all(|c| c.layer == 2));
    }

    #[test]
    fn drain_on_empty_queue_is_empty() {
        let mut queue = CommandQueue::new();
        assert!(queue.drain_sorted().is_empty());
    }

    #[test]
    fn rect_expands_to_two_triangles() {
        let mut queue = CommandQueue::new();
        assert!(queue.push_rect(
            0,
            0.0,
            DrawSpace::Screen,
            Vec2::ZERO,
            Vec2::new(10.0, 20.0),
            Color::BLUE,
        ));
        assert_eq!(queue.len(), 2);

        assert!(!queue.push_rect(
            0,
            0.0,
            DrawSpace::Screen,
            Vec2::ZERO,
            Vec2::ONE,
            Color::TRANSPARENT,
        ));
        assert_eq!(queue.len(), 2);
    }
}
