//! Frame orchestration: drain sorted commands, accumulate, flush on
//! capacity pressure.

use vesper_core::profiling::{profile_function, profile_scope};

use crate::batch::BatchAccumulator;
use crate::command::CommandQueue;
use crate::submit::{FrameUniforms, GpuSubmitter, SubmitError};

/// Capacity configuration for a [`Batcher2D`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Attribute buffer capacity in vertices.
    pub capacity: usize,
    /// Number of texture units a single batch may bind.
    pub max_texture_units: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_texture_units: 8,
        }
    }
}

impl BatcherConfig {
    /// A configuration is usable only if a freshly cleared batch can take
    /// one triangle and one texture; anything smaller would turn the
    /// flush-retry loop into an infinite loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 3 {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
            });
        }
        if self.max_texture_units < 1 {
            return Err(ConfigError::NoTextureUnits);
        }
        Ok(())
    }
}

/// Rejected batcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The vertex capacity cannot hold a single triangle.
    CapacityTooSmall { capacity: usize },
    /// No texture units available to a batch.
    NoTextureUnits,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityTooSmall { capacity } => write!(
                f,
                "attribute buffer capacity {} cannot hold a triangle (minimum 3)",
                capacity
            ),
            Self::NoTextureUnits => write!(f, "at least one texture unit is required"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Statistics from one [`Batcher2D::run_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// GPU draw calls issued.
    pub draw_calls: u32,
    /// Commands consumed from the queue.
    pub command_count: u32,
    /// Vertices submitted across all draw calls.
    pub vertex_count: u32,
    /// Texture slots bound, summed over draw calls.
    pub texture_binds: u32,
}

/// The flush controller: owns the accumulator state for one renderer
/// instance and turns a frame's command queue into draw calls.
///
/// Construct one per render target; instances are independent.
#[derive(Debug)]
pub struct Batcher2D {
    batch: BatchAccumulator,
}

impl Batcher2D {
    pub fn new(config: BatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(
            capacity = config.capacity,
            max_texture_units = config.max_texture_units,
            "creating batcher"
        );
        Ok(Self {
            batch: BatchAccumulator::new(config.capacity, config.max_texture_units),
        })
    }

    /// Run one frame: drain the queue in sort-key order, pack commands into
    /// batches, and flush each full batch plus the tail through `gpu`.
    ///
    /// A command that does not fit the current batch triggers a flush and is
    /// re-offered to the fresh batch; a flush never splits a triangle, so
    /// draw-call issue order reproduces the frame's key order exactly.
    ///
    /// On a submission error the accumulator is already reset, so the next
    /// frame starts clean.
    pub fn run_frame<S: GpuSubmitter>(
        &mut self,
        queue: &mut CommandQueue,
        uniforms: &FrameUniforms,
        gpu: &mut S,
    ) -> Result<FrameStats, SubmitError> {
        profile_function!();

        gpu.set_per_frame_uniforms(uniforms)?;

        let commands = {
            profile_scope!("drain_sorted");
            queue.drain_sorted()
        };

        let mut stats = FrameStats {
            command_count: commands.len() as u32,
            ..Default::default()
        };

        for cmd in &commands {
            if !self.batch.try_append(cmd) {
                self.flush(gpu, &mut stats)?;
                // One triangle plus one texture always fits a fresh batch;
                // BatcherConfig::validate rejected anything smaller.
                let appended = self.batch.try_append(cmd);
                debug_assert!(appended, "a cleared batch must accept a single triangle");
            }
        }

        if !self.batch.is_empty() {
            self.flush(gpu, &mut stats)?;
        }

        Ok(stats)
    }

    fn flush<S: GpuSubmitter>(
        &mut self,
        gpu: &mut S,
        stats: &mut FrameStats,
    ) -> Result<(), SubmitError> {
        profile_scope!("flush");

        let vertex_count = self.batch.vertex_count();
        let texture_count = self.batch.texture_handles().len();

        let result = gpu.upload_and_draw(
            self.batch.positions(),
            self.batch.shades(),
            self.batch.texture_handles(),
        );

        stats.draw_calls += 1;
        stats.vertex_count += vertex_count as u32;
        stats.texture_binds += texture_count as u32;
        tracing::trace!(vertex_count, texture_count, "flushed batch");

        // Reset before the error can propagate: a failed frame must not
        // leave committed vertices behind for the next one.
        self.batch.reset();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BatcherConfig::default().validate().is_ok());
        assert!(Batcher2D::new(BatcherConfig::default()).is_ok());
    }

    #[test]
    fn capacity_below_one_triangle_is_rejected() {
        let config = BatcherConfig {
            capacity: 2,
            max_texture_units: 8,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CapacityTooSmall { capacity: 2 })
        );
    }

    #[test]
    fn zero_texture_units_is_rejected() {
        let config = BatcherConfig {
            capacity: 64,
            max_texture_units: 0,
        };
        assert_eq!(config.validate(), Err(ConfigError::NoTextureUnits));
    }

    #[test]
    fn minimum_viable_config_is_accepted() {
        let config = BatcherConfig {
            capacity: 3,
            max_texture_units: 1,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::CapacityTooSmall { capacity: 2 };
        assert!(format!("{}", err).contains("minimum 3"));
        assert!(format!("{}", ConfigError::NoTextureUnits).contains("texture unit"));
    }
}
