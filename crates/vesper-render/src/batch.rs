//! Fixed-capacity vertex accumulation and per-batch texture units.
//!
//! A batch is the set of vertices awaiting a single draw call. The
//! [`BatchAccumulator`] consumes sorted commands, packing them into two
//! parallel attribute arrays until either the vertex capacity or the texture
//! unit table runs out; the caller then flushes and re-offers the command
//! that did not fit.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use static_assertions::const_assert_eq;

use crate::command::{CommandPayload, DrawCommand};
use crate::texture::TextureHandle;

/// Per-vertex position record: `(x, y, space)`.
///
/// `space` is `0.0` for world-space vertices and `1.0` for screen-space
/// ones; the vertex shader branches on it per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionAttr {
    pub x: f32,
    pub y: f32,
    pub space: f32,
}

/// Per-vertex shade record, one of two encodings:
///
/// - color: `(r, g, b, a)` with `a > 0`;
/// - texture sample: `(u, v, unit, 0)`.
///
/// The fourth component doubles as the discriminator the fragment shader
/// tests, which is why fully transparent colors never reach the buffer: a
/// color with `a == 0` would decode as a texture sample.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadeAttr(pub [f32; 4]);

const_assert_eq!(std::mem::size_of::<PositionAttr>(), 12);
const_assert_eq!(std::mem::size_of::<ShadeAttr>(), 16);

impl PositionAttr {
    fn new(position: Vec2, space: f32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            space,
        }
    }

    /// Vertex buffer layout for the position attribute stream.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            0 => Float32x3, // (x, y, space)
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionAttr>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

impl ShadeAttr {
    /// Vertex buffer layout for the shade attribute stream.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            1 => Float32x4, // color or (u, v, unit, 0)
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShadeAttr>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

/// Two parallel attribute arrays with a fixed vertex capacity.
///
/// Allocated once at construction; [`AttributeBuffer::clear`] resets the
/// length without releasing storage, so the per-frame flush loop never
/// allocates.
#[derive(Debug)]
pub struct AttributeBuffer {
    positions: Vec<PositionAttr>,
    shades: Vec<ShadeAttr>,
    capacity: usize,
}

impl AttributeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            shades: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Committed vertex count.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Maximum vertex count per batch.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn positions(&self) -> &[PositionAttr] {
        &self.positions
    }

    pub fn shades(&self) -> &[ShadeAttr] {
        &self.shades
    }

    pub(crate) fn push(&mut self, position: PositionAttr, shade: ShadeAttr) {
        debug_assert!(self.positions.len() < self.capacity);
        self.positions.push(position);
        self.shades.push(shade);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.shades.clear();
    }
}

/// Per-batch mapping from texture handles to unit indices.
///
/// The position of a handle in the list is the unit the shader samples, so
/// the list order must match the bind order at submission time. Lookup scope
/// is strictly the current batch: the table is cleared on every flush.
#[derive(Debug)]
pub struct TextureUnits {
    handles: Vec<TextureHandle>,
    max_units: usize,
}

impl TextureUnits {
    pub fn new(max_units: usize) -> Self {
        Self {
            handles: Vec::with_capacity(max_units),
            max_units,
        }
    }

    /// The unit this handle is bound to in the current batch, if any.
    pub fn unit_of(&self, handle: TextureHandle) -> Option<u32> {
        self.handles.iter().position(|&h| h == handle).map(|i| i as u32)
    }

    /// Resolve a handle to a unit, assigning the next free unit for a handle
    /// not yet in the batch. Fails only when the handle is new and every
    /// unit is taken.
    pub fn try_assign(&mut self, handle: TextureHandle) -> Option<u32> {
        if let Some(unit) = self.unit_of(handle) {
            return Some(unit);
        }
        if self.handles.len() >= self.max_units {
            return None;
        }
        self.handles.push(handle);
        Some((self.handles.len() - 1) as u32)
    }

    /// Handles in unit order.
    pub fn handles(&self) -> &[TextureHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

/// Packs sorted commands into the current batch.
#[derive(Debug)]
pub struct BatchAccumulator {
    attributes: AttributeBuffer,
    texture_units: TextureUnits,
}

impl BatchAccumulator {
    pub fn new(capacity: usize, max_texture_units: usize) -> Self {
        Self {
            attributes: AttributeBuffer::new(capacity),
            texture_units: TextureUnits::new(max_texture_units),
        }
    }

    /// Try to pack one command into the current batch.
    ///
    /// Fails when the vertex buffer cannot take another triangle, or when a
    /// textured command would need a unit and the table is full. Failure
    /// leaves the batch untouched; the caller flushes and re-offers the same
    /// command.
    pub fn try_append(&mut self, cmd: &DrawCommand) -> bool {
        if self.attributes.len() + 3 > self.attributes.capacity() {
            return false;
        }

        let space = cmd.space.flag();
        match &cmd.payload {
            CommandPayload::Colored { color } => {
                let shade = ShadeAttr(color.to_array());
                for vertex in &cmd.vertices {
                    self.attributes.push(PositionAttr::new(*vertex, space), shade);
                }
            }
            CommandPayload::Textured { texture, uvs } => {
                let Some(unit) = self.texture_units.try_assign(*texture) else {
                    return false;
                };
                for (vertex, uv) in cmd.vertices.iter().zip(uvs) {
                    self.attributes.push(
                        PositionAttr::new(*vertex, space),
                        ShadeAttr([uv.x, uv.y, unit as f32, 0.0]),
                    );
                }
            }
        }
        true
    }

    /// Committed vertex count.
    pub fn vertex_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn positions(&self) -> &[PositionAttr] {
        self.attributes.positions()
    }

    pub fn shades(&self) -> &[ShadeAttr] {
        self.attributes.shades()
    }

    /// Textures of the current batch, in unit order.
    pub fn texture_handles(&self) -> &[TextureHandle] {
        self.texture_units.handles()
    }

    /// Reset for the next batch: length to zero, unit table emptied.
    /// Storage is kept.
    pub fn reset(&mut self) {
        self.attributes.clear();
        self.texture_units.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::command::DrawSpace;

    fn colored(depth: f32, color: Color) -> DrawCommand {
        DrawCommand {
            layer: 0,
            depth,
            space: DrawSpace::World,
            vertices: [Vec2::ZERO, Vec2::X, Vec2::Y],
            payload: CommandPayload::Colored { color },
        }
    }

    fn textured(texture: TextureHandle) -> DrawCommand {
        DrawCommand {
            layer: 0,
            depth: 0.0,
            space: DrawSpace::Screen,
            vertices: [Vec2::ZERO, Vec2::X, Vec2::Y],
            payload: CommandPayload::Textured {
                texture,
                uvs: [Vec2::ZERO, Vec2::X, Vec2::ONE],
            },
        }
    }

    #[test]
    fn attribute_records_have_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<PositionAttr>(), 12);
        assert_eq!(std::mem::size_of::<ShadeAttr>(), 16);
    }

    #[test]
    fn colored_command_packs_three_vertices() {
        let mut batch = BatchAccumulator::new(6, 4);
        assert!(batch.try_append(&colored(0.0, Color::rgba(0.2, 0.4, 0.6, 0.8))));
        assert_eq!(batch.vertex_count(), 3);

        for shade in batch.shades() {
            assert_eq!(shade.0, [0.2, 0.4, 0.6, 0.8]);
        }
        assert_eq!(batch.positions()[1].x, 1.0);
        assert_eq!(batch.positions()[1].space, 0.0);
    }

    #[test]
    fn textured_command_packs_uv_unit_zero() {
        let mut batch = BatchAccumulator::new(6, 4);
        assert!(batch.try_append(&textured(TextureHandle::from_raw(9))));
        assert_eq!(batch.vertex_count(), 3);
        assert_eq!(batch.texture_handles(), &[TextureHandle::from_raw(9)]);

        let last = batch.shades()[2];
        assert_eq!(last.0, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(batch.positions()[0].space, 1.0);
    }

    #[test]
    fn vertex_capacity_failure_is_non_destructive() {
        let mut batch = BatchAccumulator::new(3, 4);
        assert!(batch.try_append(&colored(0.0, Color::WHITE)));
        let before = batch.vertex_count();

        assert!(!batch.try_append(&colored(1.0, Color::RED)));
        assert_eq!(batch.vertex_count(), before);
    }

    #[test]
    fn unit_exhaustion_failure_is_non_destructive() {
        let mut batch = BatchAccumulator::new(30, 1);
        assert!(batch.try_append(&textured(TextureHandle::from_raw(1))));

        // Second texture cannot get a unit; nothing may be partially written.
        assert!(!batch.try_append(&textured(TextureHandle::from_raw(2))));
        assert_eq!(batch.vertex_count(), 3);
        assert_eq!(batch.texture_handles(), &[TextureHandle::from_raw(1)]);
    }

    #[test]
    fn known_texture_is_accepted_when_table_is_full() {
        let mut batch = BatchAccumulator::new(30, 1);
        assert!(batch.try_append(&textured(TextureHandle::from_raw(1))));
        assert!(batch.try_append(&textured(TextureHandle::from_raw(1))));
        assert_eq!(batch.vertex_count(), 6);
        assert_eq!(batch.texture_handles().len(), 1);
    }

    #[test]
    fn units_are_assigned_in_order() {
        let mut units = TextureUnits::new(3);
        assert_eq!(units.try_assign(TextureHandle::from_raw(5)), Some(0));
        assert_eq!(units.try_assign(TextureHandle::from_raw(8)), Some(1));
        assert_eq!(units.try_assign(TextureHandle::from_raw(5)), Some(0));
        assert_eq!(units.unit_of(TextureHandle::from_raw(8)), Some(1));
        assert_eq!(units.unit_of(TextureHandle::from_raw(3)), None);
    }

    #[test]
    fn reset_clears_length_and_units_but_keeps_capacity() {
        let mut batch = BatchAccumulator::new(6, 2);
        batch.try_append(&textured(TextureHandle::from_raw(1)));
        batch.reset();

        assert!(batch.is_empty());
        assert!(batch.texture_handles().is_empty());

        // A fresh batch must accept the texture again at unit 0.
        assert!(batch.try_append(&textured(TextureHandle::from_raw(2))));
        let unit = batch.shades()[0].0[2];
        assert_eq!(unit, 0.0);
    }
}
