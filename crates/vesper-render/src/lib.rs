//! Vesper draw-command batching and GPU submission.
//!
//! The pipeline takes an unordered set of per-frame draw requests (colored
//! and textured triangles) and turns them into a minimal, correctly
//! depth/layer-ordered sequence of GPU draw calls under two hard capacity
//! limits: the vertex attribute buffer size and the number of
//! simultaneously bound textures.
//!
//! Flow per frame:
//!
//! 1. Upstream renderers push [`DrawCommand`]s into a [`CommandQueue`].
//! 2. [`Batcher2D::run_frame`] drains the queue sorted by `(layer, depth)`
//!    and packs commands into fixed-capacity batches.
//! 3. Each full batch — and the tail — is flushed through a
//!    [`GpuSubmitter`]; the shipped backend is [`WgpuSubmitter`].
//!
//! Capacity pressure degrades performance (more draw calls, visible in
//! [`FrameStats`]), never correctness.

pub mod batch;
pub mod color;
pub mod command;
pub mod context;
pub mod flush;
pub mod pipeline;
pub mod submit;
pub mod texture;
pub mod wgpu_submit;

pub use batch::{AttributeBuffer, BatchAccumulator, PositionAttr, ShadeAttr, TextureUnits};
pub use color::Color;
pub use command::{CommandPayload, CommandQueue, DrawCommand, DrawSpace};
pub use context::{ContextError, GraphicsContext};
pub use flush::{Batcher2D, BatcherConfig, ConfigError, FrameStats};
pub use submit::{FrameUniforms, FrameUniformsRaw, GpuSubmitter, SubmitError};
pub use texture::{TextureHandle, TextureRegistry, TextureSlot};
pub use wgpu_submit::WgpuSubmitter;
