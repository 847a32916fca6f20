//! The seam between batch building and GPU backends.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::batch::{PositionAttr, ShadeAttr};
use crate::texture::TextureHandle;

/// Per-frame uniform data handed to the submission backend before the first
/// flush of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Camera transform applied to world-space vertices.
    pub view_proj: Mat4,
    /// Viewport size in pixels, used to map screen-space vertices to clip
    /// space.
    pub viewport: Vec2,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            viewport: Vec2::ONE,
        }
    }
}

/// GPU-side layout of [`FrameUniforms`]; padded to 16-byte alignment.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniformsRaw {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub _pad: [f32; 2],
}

impl From<&FrameUniforms> for FrameUniformsRaw {
    fn from(uniforms: &FrameUniforms) -> Self {
        Self {
            view_proj: uniforms.view_proj.to_cols_array_2d(),
            viewport: uniforms.viewport.to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Submission failure. Fatal to the current frame; the batcher resets its
/// accumulator state before propagating one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No render target is bound for the frame.
    MissingTarget,
    /// The backend rejected the submission.
    Backend(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "no render target bound for this frame"),
            Self::Backend(msg) => write!(f, "GPU submission failed: {}", msg),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Uploads batch contents and issues draw calls; owns the rendering context.
///
/// Calls are synchronous from the batcher's point of view. At
/// `upload_and_draw` time the backend must bind `textures[i]` to unit `i`,
/// matching the unit indices packed into the shade attributes.
pub trait GpuSubmitter {
    /// Install the frame's uniforms. Called once, before any flush.
    fn set_per_frame_uniforms(&mut self, uniforms: &FrameUniforms) -> Result<(), SubmitError>;

    /// Upload the committed attribute ranges and draw them in one call.
    ///
    /// `positions` and `shades` have equal length: the batch's vertex count.
    fn upload_and_draw(
        &mut self,
        positions: &[PositionAttr],
        shades: &[ShadeAttr],
        textures: &[TextureHandle],
    ) -> Result<(), SubmitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_raw_is_gpu_sized() {
        assert_eq!(std::mem::size_of::<FrameUniformsRaw>(), 80);
    }

    #[test]
    fn error_display() {
        assert!(format!("{}", SubmitError::MissingTarget).contains("target"));
        let err = SubmitError::Backend("device lost".into());
        assert!(format!("{}", err).contains("device lost"));
    }
}
